//! The default key tables and the actions they bind.
//!
//! Two tables ship by default:
//!
//! - the *transparent* table: host-style tokens, multi-key sequences, and
//!   actions that decide for themselves whether the page's default handling
//!   of the key still runs;
//! - the *strict* table: lower-cased tokens for the core motions, every hit
//!   suppressed.
//!
//! Every action tolerates a missing focused entry by doing nothing (or by
//! falling back to the zoomed-in entry where that makes sense). Every Visual
//! action returns the machine to Normal.

use super::keys::{Canonicalizer, Convention, KeyEvent, KeySequence, ESCAPE};
use super::table::{ActionContext, ActionTable, Suppression};
use crate::config::Config;
use crate::editor::mode::Mode;
use crate::editor::state::Patch;
use crate::editor::timers::Deferred;
use crate::host::{EntryId, TextField};
use regex::Regex;
use std::sync::OnceLock;

/// Both default tables, in lookup order.
pub fn default_tables(config: &Config) -> Vec<ActionTable> {
    vec![transparent_table(config), strict_table(config)]
}

/// Core motions and mode switches; the dispatcher suppresses every hit.
pub fn strict_table(config: &Config) -> ActionTable {
    let canonicalizer =
        Canonicalizer::with_escape_aliases(Convention::Strict, config.escape_aliases.clone());

    ActionTable::new("strict", canonicalizer, Suppression::Always)
        .bind(Mode::Normal, "j", "move-down", move_down)
        .bind(Mode::Normal, "k", "move-up", move_up)
        .bind(Mode::Normal, "h", "cursor-left", cursor_left)
        .bind(Mode::Normal, "l", "cursor-right", cursor_right)
        .bind(Mode::Normal, "/", "search", search)
        .bind(Mode::Normal, "?", "search", search)
        .bind(Mode::Normal, "alt-l", "zoom-in", zoom_in)
        .bind(Mode::Normal, "alt-h", "zoom-out", zoom_out)
        .bind(Mode::Normal, "i", "insert", go_to_insert_mode)
        .bind(Mode::Normal, ESCAPE, "escape", escape)
        .bind(Mode::Insert, ESCAPE, "escape", escape)
        // shadowed by the transparent Visual escape; reached only when this
        // table is consulted first
        .bind(Mode::Visual, ESCAPE, "escape", escape)
}

/// Outliner commands; each action decides about suppression.
pub fn transparent_table(config: &Config) -> ActionTable {
    let canonicalizer =
        Canonicalizer::with_escape_aliases(Convention::Transparent, config.escape_aliases.clone());
    let seq = KeySequence::chars;

    let mut table = ActionTable::new("transparent", canonicalizer, Suppression::ByAction);
    for jump in ["ctrl-k", "ctrl-:", "ctrl-;", "ctrl-Dead"] {
        table = table
            .bind(Mode::Normal, jump, "jump-menu", open_jump_menu)
            .bind(Mode::Visual, jump, "jump-menu", visual_open_jump_menu)
            .bind(Mode::Insert, jump, "jump-menu", insert_open_jump_menu);
    }
    for format in ["ctrl-i", "ctrl-u", "ctrl-b"] {
        table = table
            .bind(Mode::Normal, format, "format", rotate_selection_buffer)
            .bind(Mode::Visual, format, "format", visual_format);
    }

    table
        // Normal
        .bind(Mode::Normal, "alt-Enter", "open-link", open_link)
        .bind(Mode::Normal, "Enter", "zoom-and-edit", enter)
        .bind(Mode::Normal, "Backspace", "zoom-back", zoom_back)
        .bind(Mode::Normal, "g", "go-parent", go_to_parent)
        .bind(Mode::Normal, seq("gg"), "go-top", go_to_top)
        .bind(Mode::Normal, "G", "go-list-bottom", go_to_list_bottom)
        .bind(Mode::Normal, seq("GG"), "go-bottom", go_to_view_bottom)
        .bind(Mode::Normal, seq("dw"), "delete-word", delete_word)
        .bind(Mode::Normal, seq("de"), "delete-word-end", delete_word_end)
        .bind(Mode::Normal, seq("dn"), "delete-note", delete_note)
        .bind(Mode::Normal, seq("cw"), "change-word", change_word)
        .bind(Mode::Normal, seq("ce"), "change-word-end", change_word_end)
        .bind(Mode::Normal, seq("cn"), "change-note", change_note)
        .bind(Mode::Normal, seq("d$"), "delete-to-end", delete_to_line_end)
        .bind(Mode::Normal, "alt-H", "outdent", outdent)
        .bind(Mode::Normal, "alt-L", "indent", indent)
        .bind(Mode::Normal, "<", "outdent", outdent)
        .bind(Mode::Normal, ">", "indent", indent)
        .bind(Mode::Normal, "Tab", "indent-tab", tab)
        .bind(Mode::Normal, "ctrl- ", "toggle-expand-all", toggle_expand_all)
        .bind(Mode::Normal, "ctrl-Enter", "toggle-completed", toggle_completed)
        .bind(Mode::Normal, "ctrl-c", "yank", yank)
        .bind(Mode::Normal, seq("dd"), "cut", cut)
        .bind(Mode::Normal, "v", "visual", enter_visual_mode)
        // Visual
        .bind(Mode::Visual, seq("gg"), "select-to-top", select_to_top)
        .bind(Mode::Visual, seq("GG"), "select-to-bottom", select_to_bottom)
        .bind(Mode::Visual, "ctrl-Enter", "toggle-completed", visual_toggle_completed)
        .bind(Mode::Visual, "ctrl- ", "toggle-expand-all", visual_toggle_expand_all)
        .bind(Mode::Visual, "alt-H", "outdent", visual_outdent)
        .bind(Mode::Visual, "alt-L", "indent", visual_indent)
        .bind(Mode::Visual, "<", "outdent", visual_outdent)
        .bind(Mode::Visual, ">", "indent", visual_indent)
        .bind(Mode::Visual, "Tab", "indent-tab", visual_tab)
        .bind(Mode::Visual, "ctrl-c", "yank", visual_yank)
        .bind(Mode::Visual, ESCAPE, "escape", escape_suppressed)
        // Insert
        .bind(Mode::Insert, "Enter", "leave-jump-menu", insert_enter)
        .bind(Mode::Insert, seq("jk"), "leave-insert", insert_jk)
}

// Mode transitions

pub fn go_to_insert_mode(cx: &mut ActionContext<'_>) {
    cx.state.set(|_| Patch::default().mode(Mode::Insert));
}

pub fn go_to_normal_mode(cx: &mut ActionContext<'_>) {
    cx.state.set(|_| Patch::default().mode(Mode::Normal));
}

/// Back to Normal from anywhere, leaving the caret at a defined offset.
pub fn escape(cx: &mut ActionContext<'_>) {
    if cx.state.mode() == Mode::Visual {
        exit_visual_mode(cx, false);
    } else {
        go_to_normal_mode(cx);
    }
    cx.navigator.move_horizontally(cx.host, cx.state, 0);
}

fn escape_suppressed(cx: &mut ActionContext<'_>) {
    cx.suppress();
    escape(cx);
}

/// Enters Visual over the host selection, or the focused entry when nothing
/// is selected.
pub fn enter_visual_mode(cx: &mut ActionContext<'_>) {
    if cx.host.selection().is_empty() {
        let Some(focused) = cx.host.focused_entry() else {
            return;
        };
        cx.host.set_selection(vec![focused]);
    }
    cx.suppress();
    cx.state.set(|_| Patch::default().mode(Mode::Visual));
}

/// Leaves Visual. The host selection is cleared unless `keep_selection`.
pub fn exit_visual_mode(cx: &mut ActionContext<'_>, keep_selection: bool) {
    let selection = cx.host.selection();
    if !keep_selection {
        cx.host.set_selection(Vec::new());
    }
    if cx.host.focused_entry().is_none() {
        if let Some(first) = selection.first().filter(|e| cx.host.contains(e)) {
            cx.host.edit_name(first);
        }
    }
    go_to_normal_mode(cx);
}

/// Selected entries, or the focused one when nothing is selected.
fn targets(cx: &ActionContext<'_>) -> Vec<EntryId> {
    let selection = cx.host.selection();
    if !selection.is_empty() {
        return selection;
    }
    cx.host.focused_entry().into_iter().collect()
}

// Motions

fn move_down(cx: &mut ActionContext<'_>) {
    let Some(from) = cx.host.focused_entry() else {
        return;
    };
    cx.navigator.move_down(cx.host, cx.state, &from);
}

fn move_up(cx: &mut ActionContext<'_>) {
    let Some(from) = cx.host.focused_entry() else {
        return;
    };
    cx.navigator.move_up(cx.host, cx.state, &from);
}

fn cursor_left(cx: &mut ActionContext<'_>) {
    cx.navigator.move_horizontally(cx.host, cx.state, -1);
}

fn cursor_right(cx: &mut ActionContext<'_>) {
    cx.navigator.move_horizontally(cx.host, cx.state, 1);
}

fn search(cx: &mut ActionContext<'_>) {
    cx.state.set(|_| Patch::default().search_requested(true));
    cx.host.focus_search_box();
}

fn zoom_in(cx: &mut ActionContext<'_>) {
    cx.state.set(|_| Patch::default().anchor_offset(0));
    cx.host.emit_key(&KeyEvent::new("ArrowRight").alt());
}

fn zoom_out(cx: &mut ActionContext<'_>) {
    cx.state.set(|_| Patch::default().anchor_offset(0));
    cx.host.emit_key(&KeyEvent::new("ArrowLeft").alt());
}

/// Focuses `entry` keeping the tracked caret column.
fn edit_keeping_column(cx: &mut ActionContext<'_>, entry: &EntryId) {
    let column = cx.state.anchor_offset();
    cx.host.edit_name(entry);
    cx.navigator.set_cursor_at(cx.host, column);
}

fn go_to_parent(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let Some(focused) = cx.host.focused_entry() else {
        return;
    };
    let Some(parent) = cx.host.parent(&focused) else {
        return;
    };

    let target = if parent == cx.host.root_entry() {
        let current = cx.host.current_entry();
        cx.host
            .visible_children(&current)
            .into_iter()
            .next()
            .unwrap_or(parent)
    } else {
        parent
    };
    edit_keeping_column(cx, &target);
}

fn go_to_top(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let current = cx.host.current_entry();
    let target = if current == cx.host.root_entry() {
        cx.host
            .visible_children(&current)
            .into_iter()
            .next()
            .unwrap_or(current)
    } else {
        current
    };
    edit_keeping_column(cx, &target);
}

fn go_to_bottom_of(cx: &mut ActionContext<'_>, list: &EntryId) {
    if let Some(last) = cx.host.visible_children(list).pop() {
        edit_keeping_column(cx, &last);
    }
}

fn go_to_list_bottom(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let Some(focused) = cx.host.focused_entry() else {
        return;
    };
    let current = cx.host.current_entry();
    let list = if focused == current {
        current
    } else {
        cx.host.parent(&focused).unwrap_or(current)
    };
    go_to_bottom_of(cx, &list);
}

fn go_to_view_bottom(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let current = cx.host.current_entry();
    go_to_bottom_of(cx, &current);
}

// Text edits

/// Where a word deletion starting at `start` stops.
fn word_boundary(text: &[char], start: usize, to_next_word: bool) -> usize {
    let mut i = start.min(text.len());
    if to_next_word {
        while i < text.len() && !text[i].is_whitespace() {
            i += 1;
        }
        while i < text.len() && text[i].is_whitespace() {
            i += 1;
        }
    } else {
        while i < text.len() && text[i].is_whitespace() {
            i += 1;
        }
        while i < text.len() && !text[i].is_whitespace() {
            i += 1;
        }
    }
    i
}

/// Deletes name text from the caret to the next word start (`dw`) or to the
/// end of the word (`de`).
fn delete_word_at_caret(cx: &mut ActionContext<'_>, to_next_word: bool) {
    let Some(caret) = cx.host.caret() else {
        return;
    };
    cx.suppress();

    let mut text: Vec<char> = cx.host.name_text(&caret.entry).chars().collect();
    let start = caret.offset.min(text.len());
    let end = word_boundary(&text, start, to_next_word);
    if end == start {
        return;
    }
    text.drain(start..end);

    cx.host
        .set_text(&caret.entry, TextField::Name, text.into_iter().collect());
    cx.host.place_caret(&caret.entry, start);
    cx.state.set(|_| Patch::default().anchor_offset(start));
}

fn delete_word(cx: &mut ActionContext<'_>) {
    delete_word_at_caret(cx, true);
}

fn delete_word_end(cx: &mut ActionContext<'_>) {
    delete_word_at_caret(cx, false);
}

fn change_word(cx: &mut ActionContext<'_>) {
    delete_word_at_caret(cx, true);
    go_to_insert_mode(cx);
}

fn change_word_end(cx: &mut ActionContext<'_>) {
    delete_word_at_caret(cx, false);
    go_to_insert_mode(cx);
}

fn delete_note(cx: &mut ActionContext<'_>) {
    cx.suppress();
    if let Some(focused) = cx.host.focused_entry() {
        cx.host.set_text(&focused, TextField::Note, String::new());
    }
}

fn change_note(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let Some(focused) = cx.host.focused_entry() else {
        return;
    };
    cx.host.set_text(&focused, TextField::Note, String::new());
    cx.host.edit_note(&focused);
    go_to_insert_mode(cx);
}

fn delete_to_line_end(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let Some(caret) = cx.host.caret() else {
        return;
    };
    let kept: String = cx
        .host
        .name_text(&caret.entry)
        .chars()
        .take(caret.offset)
        .collect();
    cx.host.set_text(&caret.entry, TextField::Name, kept);
    cx.host.place_caret(&caret.entry, caret.offset);
}

// Structure

fn shift_entries(cx: &mut ActionContext<'_>, entries: &[EntryId], indent: bool) {
    if indent {
        cx.host.indent(entries);
    } else {
        cx.host.outdent(entries);
    }
}

/// Shifts the selection inside a visual bracket, or the focused entry when
/// nothing is selected.
fn shift(cx: &mut ActionContext<'_>, indent: bool) {
    cx.suppress();
    if cx.host.selection().is_empty() {
        if let Some(focused) = cx.host.focused_entry() {
            shift_entries(cx, &[focused], indent);
        }
        return;
    }

    enter_visual_mode(cx);
    let entries = cx.host.selection();
    shift_entries(cx, &entries, indent);
    exit_visual_mode(cx, false);
}

fn outdent(cx: &mut ActionContext<'_>) {
    shift(cx, false);
}

fn indent(cx: &mut ActionContext<'_>) {
    shift(cx, true);
}

fn tab(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let entries = targets(cx);
    let indent = !cx.event().modifiers.shift;
    shift_entries(cx, &entries, indent);
}

fn toggle_expand_all(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let root = cx
        .host
        .focused_entry()
        .unwrap_or_else(|| cx.host.current_entry());
    let expand = !cx.host.is_expanded(&root);

    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
        let children = cx.host.children(&id);
        if !children.is_empty() {
            cx.host.set_expanded(&id, expand);
        }
        pending.extend(children);
    }
}

/// Snapshots the selection before the host applies a formatting key.
fn rotate_selection_buffer(cx: &mut ActionContext<'_>) {
    let selection = cx.host.selection();
    cx.state.set(|_| Patch::default().selection_buffer(selection));
}

fn toggle_completed(cx: &mut ActionContext<'_>) {
    cx.suppress();
    rotate_selection_buffer(cx);
    let entries = targets(cx);
    cx.host.toggle_completed(&entries);
}

fn yank(cx: &mut ActionContext<'_>) {
    let entries = targets(cx);
    cx.host.yank(&entries);
    cx.timers.next_frame(Deferred::FixFocus);
}

fn cut(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let entries = targets(cx);
    cx.host.yank(&entries);
    cx.host.delete(&entries);
}

// Navigation and links

fn remember_pre_jump_focus(cx: &mut ActionContext<'_>) {
    let focused = cx.host.focused_entry();
    cx.state.set(|_| Patch::default().focus_pre_jump(focused));
}

fn open_jump_menu(cx: &mut ActionContext<'_>) {
    remember_pre_jump_focus(cx);
    go_to_insert_mode(cx);
}

fn visual_open_jump_menu(cx: &mut ActionContext<'_>) {
    exit_visual_mode(cx, false);
    open_jump_menu(cx);
}

fn insert_open_jump_menu(cx: &mut ActionContext<'_>) {
    if cx.host.focused_entry().is_some() {
        remember_pre_jump_focus(cx);
    }
    go_to_insert_mode(cx);
}

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\w+:)?//").expect("valid scheme pattern"))
}

/// Opens the entry's first link when the link text also appears in its name
/// or note.
fn open_link(cx: &mut ActionContext<'_>) {
    let Some(focused) = cx.host.focused_entry() else {
        return;
    };
    if !cx.host.contains(&focused) {
        return;
    }
    let Some(href) = cx.host.first_link(&focused) else {
        return;
    };

    let stripped = scheme_pattern().replace(&href, "");
    let name = cx.host.name_text(&focused);
    let note = cx.host.note_text(&focused);
    if name.contains(&*stripped) || note.contains(&*stripped) {
        cx.host.open_url(&href);
    }
}

fn enter(cx: &mut ActionContext<'_>) {
    let focused = cx.host.focused_entry();
    if cx.event().modifiers.shift && focused.is_some() {
        go_to_insert_mode(cx);
        return;
    }

    let current = cx.host.current_entry();
    cx.state
        .set(|_| Patch::default().prev_enter_item(Some(current.clone())));

    let target = match focused {
        Some(focused) => {
            cx.suppress();
            focused
        }
        None => current,
    };
    cx.host.zoom_to(&target);
    cx.host.edit_name(&target);
}

fn zoom_back(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let Some(previous) = cx.state.get().prev_enter_item else {
        return;
    };
    if cx.host.contains(&previous) {
        cx.host.zoom_to(&previous);
    }
}

// Visual

/// Extends the selection over its siblings up to the top or bottom of the
/// list, then returns to Normal with the selection kept.
fn select_to_edge(cx: &mut ActionContext<'_>, to_top: bool) {
    cx.suppress();
    let selection = cx.host.selection();
    let parent = selection.first().and_then(|first| cx.host.parent(first));

    if let Some(parent) = parent {
        let siblings = cx.host.visible_children(&parent);
        let positions: Vec<usize> = selection
            .iter()
            .filter_map(|s| siblings.iter().position(|x| x == s))
            .collect();

        if let (Some(&lo), Some(&hi)) = (positions.iter().min(), positions.iter().max()) {
            let range = if to_top { 0..hi + 1 } else { lo..siblings.len() };
            cx.host.set_selection(siblings[range].to_vec());
        }
    }
    exit_visual_mode(cx, true);
}

fn select_to_top(cx: &mut ActionContext<'_>) {
    select_to_edge(cx, true);
}

fn select_to_bottom(cx: &mut ActionContext<'_>) {
    select_to_edge(cx, false);
}

fn visual_format(cx: &mut ActionContext<'_>) {
    rotate_selection_buffer(cx);
    go_to_normal_mode(cx);
}

fn visual_toggle_completed(cx: &mut ActionContext<'_>) {
    cx.suppress();
    let selection = cx.host.selection();
    cx.host.toggle_completed(&selection);
    rotate_selection_buffer(cx);
    exit_visual_mode(cx, false);
}

fn visual_toggle_expand_all(cx: &mut ActionContext<'_>) {
    toggle_expand_all(cx);
    exit_visual_mode(cx, false);
}

fn visual_shift(cx: &mut ActionContext<'_>, indent: bool) {
    cx.suppress();
    let selection = cx.host.selection();
    shift_entries(cx, &selection, indent);
    exit_visual_mode(cx, false);
}

fn visual_outdent(cx: &mut ActionContext<'_>) {
    visual_shift(cx, false);
}

fn visual_indent(cx: &mut ActionContext<'_>) {
    visual_shift(cx, true);
}

fn visual_tab(cx: &mut ActionContext<'_>) {
    let indent = !cx.event().modifiers.shift;
    visual_shift(cx, indent);
}

fn visual_yank(cx: &mut ActionContext<'_>) {
    let selection = cx.host.selection();
    cx.host.yank(&selection);
    go_to_normal_mode(cx);
    cx.timers.next_frame(Deferred::FixFocus);
}

// Insert

/// Enter inside the host's jump menu: when it landed where we already were,
/// nothing is focused, so put focus back ourselves.
fn insert_enter(cx: &mut ActionContext<'_>) {
    if cx.host.focused_entry().is_some() {
        return;
    }

    if let Some(previous) = cx.state.get().focus_pre_jump {
        if cx.host.contains(&previous) {
            cx.host.edit_name(&previous);
        }
        cx.state.set(|_| Patch::default().focus_pre_jump(None));
    }
    if cx.host.focused_entry().is_none() {
        let current = cx.host.current_entry();
        cx.host.edit_name(&current);
    }

    go_to_normal_mode(cx);
    cx.suppress();
    cx.timers.next_frame(Deferred::FixFocus);
}

/// `jk` typed in Insert: back to Normal, removing the `j` that was typed.
fn insert_jk(cx: &mut ActionContext<'_>) {
    if cx.host.focused_entry().is_none() {
        return;
    }
    go_to_normal_mode(cx);
    cx.suppress();

    let Some(caret) = cx.host.caret() else {
        return;
    };
    let mut text: Vec<char> = cx.host.name_text(&caret.entry).chars().collect();
    let Some(j_at) = caret.offset.checked_sub(1) else {
        return;
    };
    if text.get(j_at) != Some(&'j') {
        return;
    }

    text.remove(j_at);
    cx.host
        .set_text(&caret.entry, TextField::Name, text.into_iter().collect());
    cx.host.place_caret(&caret.entry, j_at);
    cx.state.set(|_| Patch::default().anchor_offset(j_at));
}

// Deferred work

/// Refocuses after the host dropped focus, preferring the pre-jump entry.
pub fn fix_focus(cx: &mut ActionContext<'_>) {
    if cx.host.focused_entry().is_some() {
        return;
    }
    let target = cx
        .state
        .get()
        .focus_pre_jump
        .filter(|e| cx.host.contains(e))
        .unwrap_or_else(|| cx.host.current_entry());
    cx.host.edit_name(&target);
}

/// One attempt at moving the caret to the first search hit.
pub fn focus_first_search_result(cx: &mut ActionContext<'_>) -> bool {
    let Some(first) = cx.host.first_search_result() else {
        return false;
    };
    cx.navigator.set_cursor_after_vertical_move(cx.host, cx.state, &first);
    true
}
