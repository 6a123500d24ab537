//! Headless in-memory outline implementing [`Host`].
//!
//! Used by the test-suite and by the command-line harness. Outlines are
//! written as indented text, two spaces per level, with a trailing `[+]`
//! marking a collapsed entry:
//!
//! ```
//! use vimflowy::host::{EntryId, Host, MemoryOutline};
//!
//! let outline = MemoryOutline::from_indented("groceries\n  milk\nwork [+]\n  report\n");
//! let root = outline.root_entry();
//! assert_eq!(outline.visible_children(&root).len(), 2);
//! assert!(outline.visible_children(&EntryId::new("work")).is_empty());
//! ```
//!
//! Entry ids are the entry names; a repeated name gets a `#n` suffix.

use super::{Caret, EntryId, Host, Rect, TextField};
use crate::input::keys::KeyEvent;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const ROOT_ID: &str = "root";
const LINE_HEIGHT: f64 = 20.0;
const FIRST_LINE_TOP: f64 = 40.0;

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://[^\s)]+").expect("valid link pattern"))
}

#[derive(Debug, Clone, Default)]
struct Entry {
    name: String,
    note: String,
    parent: Option<EntryId>,
    children: Vec<EntryId>,
    expanded: bool,
    completed: bool,
}

/// An outline kept entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryOutline {
    entries: IndexMap<EntryId, Entry>,
    root: EntryId,
    current: EntryId,
    focus: Option<(EntryId, TextField)>,
    caret: Option<Caret>,
    selection: Vec<EntryId>,
    clipboard: Vec<String>,
    opened_urls: Vec<String>,
    emitted_keys: Vec<KeyEvent>,
    search_box_focused: bool,
    search_results: Option<Vec<EntryId>>,
    rects: IndexMap<EntryId, Rect>,
    viewport_height: f64,
    scroll_log: Vec<String>,
}

impl Default for MemoryOutline {
    fn default() -> Self {
        let root = EntryId::new(ROOT_ID);
        let mut entries = IndexMap::new();
        entries.insert(
            root.clone(),
            Entry {
                expanded: true,
                ..Entry::default()
            },
        );

        Self {
            entries,
            current: root.clone(),
            root,
            focus: None,
            caret: None,
            selection: Vec::new(),
            clipboard: Vec::new(),
            opened_urls: Vec::new(),
            emitted_keys: Vec::new(),
            search_box_focused: false,
            search_results: None,
            rects: IndexMap::new(),
            viewport_height: 600.0,
            scroll_log: Vec::new(),
        }
    }
}

impl MemoryOutline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an outline from indented text. Blank lines are skipped and an
    /// over-indented line attaches to the deepest open entry.
    pub fn from_indented(text: &str) -> Self {
        let mut outline = Self::new();
        let mut stack: Vec<EntryId> = vec![outline.root.clone()];

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let indent = line.len() - line.trim_start_matches(' ').len();
            let depth = indent / 2 + 1;
            let mut name = line.trim();
            let collapsed = name.ends_with("[+]");
            if collapsed {
                name = name.trim_end_matches("[+]").trim_end();
            }

            stack.truncate(depth.min(stack.len()));
            let parent = stack.last().cloned().unwrap_or_else(|| outline.root.clone());
            let id = outline.add_entry(&parent, name);
            if let Some(entry) = outline.entries.get_mut(&id) {
                entry.expanded = !collapsed;
            }
            stack.push(id);
        }

        outline
    }

    /// Reads an indented outline file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read outline file: {}", path.display()))?;
        Ok(Self::from_indented(&text))
    }

    /// Appends a new entry under `parent` and returns its id.
    pub fn add_entry(&mut self, parent: &EntryId, name: &str) -> EntryId {
        let mut id = EntryId::new(name);
        let mut n = 2;
        while self.entries.contains_key(&id) {
            id = EntryId::new(format!("{}#{}", name, n));
            n += 1;
        }

        self.entries.insert(
            id.clone(),
            Entry {
                name: name.to_string(),
                parent: Some(parent.clone()),
                expanded: true,
                ..Entry::default()
            },
        );
        if let Some(p) = self.entries.get_mut(parent) {
            p.children.push(id.clone());
        }
        id
    }

    pub fn set_note(&mut self, id: &EntryId, note: &str) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.note = note.to_string();
        }
    }

    pub fn is_completed(&self, id: &EntryId) -> bool {
        self.entries.get(id).is_some_and(|e| e.completed)
    }

    /// Field holding keyboard focus, if any.
    pub fn focused_field(&self) -> Option<TextField> {
        self.focus.as_ref().map(|(_, field)| *field)
    }

    /// Drops keyboard focus, as when a menu or the search box takes it.
    pub fn blur(&mut self) {
        self.focus = None;
        self.caret = None;
    }

    /// Names copied by the last yank.
    pub fn clipboard(&self) -> &[String] {
        &self.clipboard
    }

    pub fn opened_urls(&self) -> &[String] {
        &self.opened_urls
    }

    pub fn emitted_keys(&self) -> &[KeyEvent] {
        &self.emitted_keys
    }

    pub fn search_box_focused(&self) -> bool {
        self.search_box_focused
    }

    /// Renders search hits for `query`: entries whose name contains it.
    pub fn render_search_results(&mut self, query: &str) {
        let hits = self
            .entries
            .iter()
            .filter(|(id, e)| **id != self.root && e.name.contains(query))
            .map(|(id, _)| id.clone())
            .collect();
        self.search_results = Some(hits);
    }

    pub fn set_rect(&mut self, id: &EntryId, rect: Rect) {
        self.rects.insert(id.clone(), rect);
    }

    /// Height of the visible area; entries below it count as past the fold.
    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height;
    }

    /// Scroll requests in order, as `into-view <id>` or `by <dy>`.
    pub fn scroll_log(&self) -> &[String] {
        &self.scroll_log
    }

    /// What the page would do with a key nobody suppressed: type printable
    /// characters into the focused name and handle a few editing keys.
    pub fn apply_default(&mut self, event: &KeyEvent) {
        let Some(caret) = self.caret.clone() else {
            return;
        };
        let m = event.modifiers;
        if m.ctrl || m.alt || m.meta {
            return;
        }

        let mut name: Vec<char> = self.name_text(&caret.entry).chars().collect();
        let offset = caret.offset.min(name.len());
        match event.key.as_str() {
            "Backspace" if offset > 0 => {
                name.remove(offset - 1);
                self.set_text(&caret.entry, TextField::Name, name.into_iter().collect());
                self.place_caret(&caret.entry, offset - 1);
            }
            "ArrowLeft" if offset > 0 => self.place_caret(&caret.entry, offset - 1),
            "ArrowRight" => self.place_caret(&caret.entry, offset + 1),
            key if key.chars().count() == 1 => {
                name.extend(key.chars());
                name[offset..].rotate_right(1);
                self.set_text(&caret.entry, TextField::Name, name.into_iter().collect());
                self.place_caret(&caret.entry, offset + 1);
            }
            _ => {}
        }
    }

    /// Visible entries under the current zoom, in layout order.
    fn layout(&self) -> Vec<EntryId> {
        let mut order = Vec::new();
        let mut stack: Vec<EntryId> = self.visible_children(&self.current);
        stack.reverse();
        while let Some(id) = stack.pop() {
            let mut children = self.visible_children(&id);
            children.reverse();
            stack.extend(children);
            order.push(id);
        }
        order
    }

    fn is_within_view(&self, id: &EntryId) -> bool {
        let mut cursor = Some(id.clone());
        while let Some(c) = cursor {
            if c == self.current {
                return true;
            }
            cursor = self.parent(&c);
        }
        false
    }

    fn remove_subtree(&mut self, id: &EntryId) {
        let children = self
            .entries
            .get(id)
            .map(|e| e.children.clone())
            .unwrap_or_default();
        for child in &children {
            self.remove_subtree(child);
        }
        self.entries.shift_remove(id);
    }

    fn detach(&mut self, id: &EntryId) -> Option<(EntryId, usize)> {
        let parent = self.parent(id)?;
        let p = self.entries.get_mut(&parent)?;
        let index = p.children.iter().position(|c| c == id)?;
        p.children.remove(index);
        Some((parent, index))
    }

    fn attach(&mut self, id: &EntryId, parent: &EntryId, index: usize) {
        if let Some(p) = self.entries.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, id.clone());
        }
        if let Some(entry) = self.entries.get_mut(id) {
            entry.parent = Some(parent.clone());
        }
    }
}

impl Host for MemoryOutline {
    fn focused_entry(&self) -> Option<EntryId> {
        self.focus.as_ref().map(|(id, _)| id.clone())
    }

    fn current_entry(&self) -> EntryId {
        self.current.clone()
    }

    fn root_entry(&self) -> EntryId {
        self.root.clone()
    }

    fn contains(&self, id: &EntryId) -> bool {
        self.entries.contains_key(id)
    }

    fn parent(&self, id: &EntryId) -> Option<EntryId> {
        self.entries.get(id).and_then(|e| e.parent.clone())
    }

    fn visible_children(&self, id: &EntryId) -> Vec<EntryId> {
        match self.entries.get(id) {
            Some(e) if e.expanded || *id == self.current => e.children.clone(),
            _ => Vec::new(),
        }
    }

    fn children(&self, id: &EntryId) -> Vec<EntryId> {
        self.entries
            .get(id)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    fn is_expanded(&self, id: &EntryId) -> bool {
        self.entries.get(id).is_some_and(|e| e.expanded)
    }

    fn name_text(&self, id: &EntryId) -> String {
        self.entries
            .get(id)
            .map(|e| e.name.clone())
            .unwrap_or_default()
    }

    fn note_text(&self, id: &EntryId) -> String {
        self.entries
            .get(id)
            .map(|e| e.note.clone())
            .unwrap_or_default()
    }

    fn first_link(&self, id: &EntryId) -> Option<String> {
        let entry = self.entries.get(id)?;
        link_pattern()
            .find(&entry.name)
            .or_else(|| link_pattern().find(&entry.note))
            .map(|m| m.as_str().to_string())
    }

    fn selection(&self) -> Vec<EntryId> {
        self.selection.clone()
    }

    fn edit_name(&mut self, id: &EntryId) {
        if !self.contains(id) {
            return;
        }
        let len = self.name_text(id).chars().count();
        self.search_box_focused = false;
        self.focus = Some((id.clone(), TextField::Name));
        self.caret = Some(Caret {
            entry: id.clone(),
            offset: len,
        });
    }

    fn edit_note(&mut self, id: &EntryId) {
        if !self.contains(id) {
            return;
        }
        self.search_box_focused = false;
        self.focus = Some((id.clone(), TextField::Note));
        self.caret = None;
    }

    fn zoom_to(&mut self, id: &EntryId) {
        if !self.contains(id) {
            return;
        }
        self.current = id.clone();
        self.search_results = None;
        if let Some(focused) = self.focused_entry() {
            if !self.is_within_view(&focused) {
                self.blur();
            }
        }
    }

    fn indent(&mut self, ids: &[EntryId]) {
        for id in ids {
            let Some(parent) = self.parent(id) else {
                continue;
            };
            let siblings = self.children(&parent);
            let Some(index) = siblings.iter().position(|s| s == id) else {
                continue;
            };
            if index == 0 {
                continue;
            }
            let new_parent = siblings[index - 1].clone();
            self.detach(id);
            let end = self.children(&new_parent).len();
            self.attach(id, &new_parent, end);
            self.set_expanded(&new_parent, true);
        }
    }

    fn outdent(&mut self, ids: &[EntryId]) {
        for id in ids.iter().rev() {
            let Some(parent) = self.parent(id) else {
                continue;
            };
            if parent == self.current {
                continue;
            }
            let Some(grandparent) = self.parent(&parent) else {
                continue;
            };
            let Some(parent_index) = self.children(&grandparent).iter().position(|s| *s == parent)
            else {
                continue;
            };
            self.detach(id);
            self.attach(id, &grandparent, parent_index + 1);
        }
    }

    fn toggle_completed(&mut self, ids: &[EntryId]) {
        for id in ids {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.completed = !entry.completed;
            }
        }
    }

    fn delete(&mut self, ids: &[EntryId]) {
        for id in ids {
            if *id == self.root || *id == self.current || !self.contains(id) {
                continue;
            }
            self.detach(id);
            self.remove_subtree(id);
        }
        let focus_gone = self.focused_entry().is_some_and(|f| !self.contains(&f));
        if focus_gone {
            self.blur();
        }
        let entries = &self.entries;
        self.selection.retain(|s| entries.contains_key(s));
    }

    fn yank(&mut self, ids: &[EntryId]) {
        self.clipboard = ids.iter().map(|id| self.name_text(id)).collect();
    }

    fn set_expanded(&mut self, id: &EntryId, expanded: bool) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.expanded = expanded;
        }
    }

    fn set_selection(&mut self, ids: Vec<EntryId>) {
        self.selection = ids.into_iter().filter(|id| self.contains(id)).collect();
    }

    fn set_text(&mut self, id: &EntryId, field: TextField, text: String) {
        let Some(entry) = self.entries.get_mut(id) else {
            return;
        };
        match field {
            TextField::Name => entry.name = text,
            TextField::Note => entry.note = text,
        }
        let len = self.name_text(id).chars().count();
        if let Some(caret) = self.caret.as_mut() {
            if caret.entry == *id {
                caret.offset = caret.offset.min(len);
            }
        }
    }

    fn open_url(&mut self, url: &str) {
        self.opened_urls.push(url.to_string());
    }

    fn emit_key(&mut self, event: &KeyEvent) {
        self.emitted_keys.push(event.clone());
        if !event.modifiers.alt {
            return;
        }
        // alt+arrows zoom in and out, as on the real page
        match event.key.as_str() {
            "ArrowRight" => {
                if let Some(focused) = self.focused_entry() {
                    self.zoom_to(&focused);
                }
            }
            "ArrowLeft" => {
                if let Some(parent) = self.parent(&self.current) {
                    self.zoom_to(&parent);
                }
            }
            _ => {}
        }
    }

    fn focus_search_box(&mut self) {
        self.blur();
        self.search_box_focused = true;
    }

    fn first_search_result(&self) -> Option<EntryId> {
        self.search_results.as_ref()?.first().cloned()
    }

    fn caret(&self) -> Option<Caret> {
        match &self.focus {
            Some((_, TextField::Name)) => self.caret.clone(),
            _ => None,
        }
    }

    fn place_caret(&mut self, id: &EntryId, offset: usize) {
        if !self.contains(id) {
            return;
        }
        let len = self.name_text(id).chars().count();
        self.search_box_focused = false;
        self.focus = Some((id.clone(), TextField::Name));
        self.caret = Some(Caret {
            entry: id.clone(),
            offset: offset.min(len),
        });
    }

    fn rect(&self, id: &EntryId) -> Rect {
        if let Some(rect) = self.rects.get(id) {
            return *rect;
        }
        match self.layout().iter().position(|e| e == id) {
            Some(line) => {
                let top = FIRST_LINE_TOP + line as f64 * LINE_HEIGHT;
                Rect {
                    top,
                    bottom: top + LINE_HEIGHT,
                }
            }
            None => Rect::default(),
        }
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn scroll_into_view(&mut self, id: &EntryId) {
        self.scroll_log.push(format!("into-view {}", id));
    }

    fn scroll_by(&mut self, dy: f64) {
        self.scroll_log.push(format!("by {}", dy));
    }
}
