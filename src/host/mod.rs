//! The outliner surface the modal layer drives but does not own.
//!
//! Everything the key actions need from the host application goes through
//! the [`Host`] trait: focus and selection queries, entry commands, and the
//! few DOM-adjacent primitives (caret placement, geometry, scrolling).
//!
//! Entries are addressed by [`EntryId`] only. The host may rebuild its
//! structure between events, so the core never keeps anything richer than an
//! id and re-resolves it with [`Host::contains`] before use.

pub mod memory;

pub use memory::MemoryOutline;

use crate::input::keys::KeyEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of an outline entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A collapsed text caret inside the name of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caret {
    pub entry: EntryId,
    /// Character offset into the entry name.
    pub offset: usize,
}

/// Vertical extent of a rendered entry, relative to the viewport top.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Distance from the viewport top to the entry's upper edge.
    pub top: f64,
    /// Distance from the viewport top to the entry's lower edge.
    pub bottom: f64,
}

/// Which field of an entry a caret or edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Note,
}

/// Operations the modal layer calls on the outliner.
///
/// Queries take `&self`, commands take `&mut self`. None of them fail: a host
/// that cannot honour a command simply ignores it, matching the silent
/// inaction the keyboard layer itself falls back to.
pub trait Host {
    // Focus and structure queries.

    /// Entry whose text currently has keyboard focus.
    fn focused_entry(&self) -> Option<EntryId>;
    /// Entry the view is zoomed into.
    fn current_entry(&self) -> EntryId;
    /// Home root of the whole outline.
    fn root_entry(&self) -> EntryId;
    /// Whether `id` still resolves to a live entry.
    fn contains(&self, id: &EntryId) -> bool;
    fn parent(&self, id: &EntryId) -> Option<EntryId>;
    /// Children that are rendered, i.e. empty when `id` is collapsed.
    fn visible_children(&self, id: &EntryId) -> Vec<EntryId>;
    /// All children regardless of expansion.
    fn children(&self, id: &EntryId) -> Vec<EntryId>;
    fn is_expanded(&self, id: &EntryId) -> bool;
    fn name_text(&self, id: &EntryId) -> String;
    fn note_text(&self, id: &EntryId) -> String;
    /// Href of the first link rendered inside the entry, if any.
    fn first_link(&self, id: &EntryId) -> Option<String>;
    /// Entries in the host's multi-selection, in document order.
    fn selection(&self) -> Vec<EntryId>;

    // Entry commands.

    /// Focus the entry's name for text editing.
    fn edit_name(&mut self, id: &EntryId);
    fn edit_note(&mut self, id: &EntryId);
    fn zoom_to(&mut self, id: &EntryId);
    fn indent(&mut self, ids: &[EntryId]);
    fn outdent(&mut self, ids: &[EntryId]);
    fn toggle_completed(&mut self, ids: &[EntryId]);
    fn delete(&mut self, ids: &[EntryId]);
    fn yank(&mut self, ids: &[EntryId]);
    fn set_expanded(&mut self, id: &EntryId, expanded: bool);
    fn set_selection(&mut self, ids: Vec<EntryId>);
    fn set_text(&mut self, id: &EntryId, field: TextField, text: String);
    fn open_url(&mut self, url: &str);
    /// Replay a synthesized key press through the host's own key handling.
    fn emit_key(&mut self, event: &KeyEvent);
    fn focus_search_box(&mut self);
    /// First rendered search hit, `None` while results are not yet present.
    fn first_search_result(&self) -> Option<EntryId>;

    // Caret and geometry.

    fn caret(&self) -> Option<Caret>;
    /// Collapse the caret at `offset` in the entry's name and focus it.
    fn place_caret(&mut self, id: &EntryId, offset: usize);
    fn rect(&self, id: &EntryId) -> Rect;
    fn viewport_height(&self) -> f64;
    fn scroll_into_view(&mut self, id: &EntryId);
    fn scroll_by(&mut self, dy: f64);
}
