//! Caret movement across the rendered outline.
//!
//! Vertical moves walk the visible tree the way it is laid out on screen:
//! an expanded entry is followed by its first child, the last child of a list
//! is followed by an "end of children" marker which is skipped by climbing to
//! the owner's next sibling. The zoomed-in entry bounds the walk in both
//! directions.
//!
//! The caret column survives vertical moves: the tracked anchor only ever
//! grows from the live caret, so passing through a short line does not lose a
//! wider column.

use super::state::{Patch, StateStore};
use crate::host::{EntryId, Host};

/// Position in the visible layout between two entries.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Entry(EntryId),
    /// Marker closing the child list of the owning entry.
    ChildrenEnd(EntryId),
}

/// Computes caret targets and places the caret through the host.
#[derive(Debug, Clone)]
pub struct CursorNavigator {
    floating_header_height: f64,
}

impl Default for CursorNavigator {
    fn default() -> Self {
        Self::new(30.0)
    }
}

impl CursorNavigator {
    /// `floating_header_height` is the band at the top of the viewport hidden
    /// behind the host's fixed header.
    pub fn new(floating_header_height: f64) -> Self {
        Self {
            floating_header_height,
        }
    }

    /// Node laid out directly after `id` and its subtree.
    fn following_node(host: &dyn Host, id: &EntryId) -> Node {
        let Some(parent) = host.parent(id) else {
            return Node::ChildrenEnd(id.clone());
        };
        let siblings = host.visible_children(&parent);
        let next = siblings
            .iter()
            .position(|s| s == id)
            .and_then(|i| siblings.get(i + 1));

        match next {
            Some(sibling) => Node::Entry(sibling.clone()),
            None => Node::ChildrenEnd(parent),
        }
    }

    /// Entry below `from`, or `None` at the bottom of the view.
    pub fn next_entry(&self, host: &dyn Host, from: &EntryId) -> Option<EntryId> {
        let view = host.current_entry();

        let mut node = match host.visible_children(from).into_iter().next() {
            Some(child) => Node::Entry(child),
            None if *from == view => return None,
            None => Self::following_node(host, from),
        };

        loop {
            match node {
                Node::Entry(id) => return Some(id),
                Node::ChildrenEnd(owner) => {
                    if owner == view || host.parent(&owner).is_none() {
                        return None;
                    }
                    node = Self::following_node(host, &owner);
                }
            }
        }
    }

    /// Entry above `from`, or `None` at the top of the view.
    pub fn previous_entry(&self, host: &dyn Host, from: &EntryId) -> Option<EntryId> {
        let view = host.current_entry();
        if *from == view {
            return None;
        }

        let parent = host.parent(from)?;
        let siblings = host.visible_children(&parent);
        let index = siblings.iter().position(|s| s == from)?;

        if index > 0 {
            return Some(Self::last_visible_descendant(host, &siblings[index - 1]));
        }

        if parent == view {
            return None;
        }
        Some(parent)
    }

    fn last_visible_descendant(host: &dyn Host, id: &EntryId) -> EntryId {
        let mut current = id.clone();
        while let Some(last) = host.visible_children(&current).pop() {
            current = last;
        }
        current
    }

    /// Moves the caret to the entry below `from`. Returns false at the bottom.
    pub fn move_down(&self, host: &mut dyn Host, state: &mut StateStore, from: &EntryId) -> bool {
        match self.next_entry(host, from) {
            Some(target) => {
                self.set_cursor_after_vertical_move(host, state, &target);
                true
            }
            None => false,
        }
    }

    /// Moves the caret to the entry above `from`. Returns false at the top.
    pub fn move_up(&self, host: &mut dyn Host, state: &mut StateStore, from: &EntryId) -> bool {
        match self.previous_entry(host, from) {
            Some(target) => {
                self.set_cursor_after_vertical_move(host, state, &target);
                true
            }
            None => false,
        }
    }

    /// Shifts the caret by `offset` characters within the focused name.
    ///
    /// A target outside `0..=len` is ignored and leaves both the caret and the
    /// tracked anchor untouched. Returns whether the caret moved.
    pub fn move_horizontally(
        &self,
        host: &mut dyn Host,
        state: &mut StateStore,
        offset: isize,
    ) -> bool {
        let Some(caret) = host.caret() else {
            return false;
        };

        let len = host.name_text(&caret.entry).chars().count() as isize;
        let target = caret.offset as isize + offset;
        if target < 0 || target > len {
            return false;
        }

        let target = target as usize;
        state.set(|_| Patch::default().anchor_offset(target));
        host.place_caret(&caret.entry, target);
        true
    }

    /// Puts the caret on `target`, at the wider of the live caret column and
    /// the tracked anchor, clamped to the target's text.
    pub fn set_cursor_after_vertical_move(
        &self,
        host: &mut dyn Host,
        state: &mut StateStore,
        target: &EntryId,
    ) {
        let live = host.caret().map(|c| c.offset).unwrap_or(0);
        state.set(|s| Patch::default().anchor_offset(live.max(s.anchor_offset)));

        let len = host.name_text(target).chars().count();
        host.place_caret(target, state.anchor_offset().min(len));

        self.move_above_fold(host, target);
    }

    /// Places the caret in the focused entry at `offset`, clamped.
    pub fn set_cursor_at(&self, host: &mut dyn Host, offset: usize) {
        let Some(focused) = host.focused_entry() else {
            return;
        };
        let len = host.name_text(&focused).chars().count();
        host.place_caret(&focused, offset.min(len));
    }

    /// Scrolls `target` into view when it sits under the fixed header or
    /// crosses the bottom of the viewport.
    fn move_above_fold(&self, host: &mut dyn Host, target: &EntryId) {
        let rect = host.rect(target);
        let fold = host.viewport_height();

        let beyond_fold = rect.top >= fold || rect.bottom > fold;
        let above_viewport = rect.top < self.floating_header_height;
        if !beyond_fold && !above_viewport {
            return;
        }

        host.scroll_into_view(target);
        if above_viewport {
            host.scroll_by(-self.floating_header_height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryOutline;

    const OUTLINE: &str = "\
a
  a1
  a2
    a2x
b [+]
  b1
c
";

    fn id(s: &str) -> EntryId {
        EntryId::new(s)
    }

    #[test]
    fn test_next_entry_descends_and_climbs() {
        let host = MemoryOutline::from_indented(OUTLINE);
        let nav = CursorNavigator::default();

        assert_eq!(nav.next_entry(&host, &id("a")), Some(id("a1")));
        assert_eq!(nav.next_entry(&host, &id("a1")), Some(id("a2")));
        assert_eq!(nav.next_entry(&host, &id("a2")), Some(id("a2x")));
        // two end-of-children markers in a row
        assert_eq!(nav.next_entry(&host, &id("a2x")), Some(id("b")));
        // collapsed entries are stepped over
        assert_eq!(nav.next_entry(&host, &id("b")), Some(id("c")));
        assert_eq!(nav.next_entry(&host, &id("c")), None);
    }

    #[test]
    fn test_previous_entry_enters_last_descendant() {
        let host = MemoryOutline::from_indented(OUTLINE);
        let nav = CursorNavigator::default();

        assert_eq!(nav.previous_entry(&host, &id("b")), Some(id("a2x")));
        assert_eq!(nav.previous_entry(&host, &id("a2x")), Some(id("a2")));
        assert_eq!(nav.previous_entry(&host, &id("a1")), Some(id("a")));
        assert_eq!(nav.previous_entry(&host, &id("a")), None);
    }

    #[test]
    fn test_walk_is_bounded_by_zoom() {
        let mut host = MemoryOutline::from_indented(OUTLINE);
        host.zoom_to(&id("a"));
        let nav = CursorNavigator::default();

        assert_eq!(nav.next_entry(&host, &id("a2x")), None);
        assert_eq!(nav.previous_entry(&host, &id("a1")), None);
        assert_eq!(nav.next_entry(&host, &id("a")), Some(id("a1")));
    }

    #[test]
    fn test_horizontal_out_of_range_is_ignored() {
        let mut host = MemoryOutline::from_indented("abc\n");
        let mut state = StateStore::new();
        let nav = CursorNavigator::default();
        host.place_caret(&id("abc"), 1);

        assert!(nav.move_horizontally(&mut host, &mut state, 2));
        assert_eq!(host.caret().map(|c| c.offset), Some(3));
        assert_eq!(state.anchor_offset(), 3);

        assert!(!nav.move_horizontally(&mut host, &mut state, 1));
        assert!(!nav.move_horizontally(&mut host, &mut state, -4));
        assert_eq!(host.caret().map(|c| c.offset), Some(3));
        assert_eq!(state.anchor_offset(), 3);
    }

    #[test]
    fn test_vertical_move_keeps_wide_column() {
        let mut host = MemoryOutline::from_indented("long line\nab\nanother line\n");
        let mut state = StateStore::new();
        let nav = CursorNavigator::default();
        host.place_caret(&id("long line"), 5);
        state.set(|_| Patch::default().anchor_offset(5));

        assert!(nav.move_down(&mut host, &mut state, &id("long line")));
        assert_eq!(host.caret().map(|c| c.offset), Some(2));
        assert_eq!(state.anchor_offset(), 5);

        assert!(nav.move_down(&mut host, &mut state, &id("ab")));
        assert_eq!(host.caret().map(|c| c.offset), Some(5));
    }

    #[test]
    fn test_scrolls_when_hidden_under_header() {
        let mut host = MemoryOutline::from_indented("a\nb\n");
        let nav = CursorNavigator::new(30.0);
        let mut state = StateStore::new();
        host.set_rect(&id("b"), crate::host::Rect { top: 10.0, bottom: 25.0 });

        nav.set_cursor_after_vertical_move(&mut host, &mut state, &id("b"));
        assert_eq!(host.scroll_log(), &["into-view b".to_string(), "by -30".to_string()]);
    }

    #[test]
    fn test_scrolls_when_crossing_the_fold() {
        let mut host = MemoryOutline::from_indented("a\nb\n");
        host.set_viewport_height(600.0);
        let nav = CursorNavigator::new(30.0);
        let mut state = StateStore::new();
        host.set_rect(&id("b"), crate::host::Rect { top: 590.0, bottom: 610.0 });

        nav.set_cursor_after_vertical_move(&mut host, &mut state, &id("b"));
        assert_eq!(host.scroll_log(), &["into-view b".to_string()]);
    }

    #[test]
    fn test_scrolls_when_below_the_fold() {
        let mut host = MemoryOutline::from_indented("a\nb\n");
        host.set_viewport_height(300.0);
        let nav = CursorNavigator::new(30.0);
        let mut state = StateStore::new();
        host.set_rect(&id("b"), crate::host::Rect { top: 420.0, bottom: 440.0 });

        nav.set_cursor_after_vertical_move(&mut host, &mut state, &id("b"));
        assert_eq!(host.scroll_log(), &["into-view b".to_string()]);
    }

    #[test]
    fn test_visible_entry_does_not_scroll() {
        let mut host = MemoryOutline::from_indented("a\nb\n");
        host.set_viewport_height(600.0);
        let nav = CursorNavigator::new(30.0);
        let mut state = StateStore::new();
        host.set_rect(&id("b"), crate::host::Rect { top: 100.0, bottom: 120.0 });

        nav.set_cursor_after_vertical_move(&mut host, &mut state, &id("b"));
        assert!(host.scroll_log().is_empty());
    }
}
