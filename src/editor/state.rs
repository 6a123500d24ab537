//! Session-wide modal state and its change notification.
//!
//! There is exactly one [`StateStore`] per session, owned by the input
//! handler, because it mirrors the one shared keyboard focus of the page.
//! Readers get copies through [`StateStore::get`]; writers go through
//! [`StateStore::set`], which merges a [`Patch`] and then notifies every
//! subscriber once, synchronously, before returning.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use vimflowy::editor::mode::Mode;
//! use vimflowy::editor::state::{Patch, StateStore};
//!
//! let mut store = StateStore::new();
//! let seen = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&seen);
//! store.subscribe(move |_| counter.set(counter.get() + 1));
//!
//! store.set(|_| Patch::default().mode(Mode::Insert).anchor_offset(3));
//! assert_eq!(seen.get(), 1);
//! assert_eq!(store.get().mode, Mode::Insert);
//! assert_eq!(store.get().anchor_offset, 3);
//! ```

use super::mode::Mode;
use super::timers::TimerHandle;
use crate::host::EntryId;

/// Snapshot of the modal state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModeState {
    /// Current mode; Normal until a key says otherwise.
    pub mode: Mode,
    /// Last known caret column, kept across vertical moves.
    pub anchor_offset: usize,
    /// Gates verbose dispatch tracing.
    pub debug: bool,
    /// Pending "focus first search result" retry, if any.
    pub search_focus_retry: Option<TimerHandle>,
    /// Entry focused before the host's jump menu took focus.
    pub focus_pre_jump: Option<EntryId>,
    /// Zoom location remembered by Normal-mode Enter, restored by Backspace.
    pub prev_enter_item: Option<EntryId>,
    /// Selection snapshot taken before host formatting keys run.
    pub selection_buffer: Vec<EntryId>,
    /// Set while the search box is being focused by our own `/`.
    pub search_requested: bool,
}

/// Partial update merged into [`ModeState`]; `None` fields are left alone.
///
/// Fields that are themselves optional in the state are doubly wrapped, so
/// `Some(None)` clears them.
///
/// # Example
///
/// ```
/// use vimflowy::editor::mode::Mode;
/// use vimflowy::editor::state::Patch;
///
/// let patch = Patch::default().mode(Mode::Visual).focus_pre_jump(None);
/// assert_eq!(patch.mode, Some(Mode::Visual));
/// assert_eq!(patch.focus_pre_jump, Some(None));
/// assert_eq!(patch.anchor_offset, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    pub mode: Option<Mode>,
    pub anchor_offset: Option<usize>,
    pub debug: Option<bool>,
    pub search_focus_retry: Option<Option<TimerHandle>>,
    pub focus_pre_jump: Option<Option<EntryId>>,
    pub prev_enter_item: Option<Option<EntryId>>,
    pub selection_buffer: Option<Vec<EntryId>>,
    pub search_requested: Option<bool>,
}

impl Patch {
    /// Switches the mode.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Records the caret column vertical moves aim for.
    pub fn anchor_offset(mut self, offset: usize) -> Self {
        self.anchor_offset = Some(offset);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Replaces the pending search retry handle; `None` clears it.
    pub fn search_focus_retry(mut self, handle: Option<TimerHandle>) -> Self {
        self.search_focus_retry = Some(handle);
        self
    }

    /// Remembers (or forgets) the entry to return to after the jump menu.
    pub fn focus_pre_jump(mut self, entry: Option<EntryId>) -> Self {
        self.focus_pre_jump = Some(entry);
        self
    }

    pub fn prev_enter_item(mut self, entry: Option<EntryId>) -> Self {
        self.prev_enter_item = Some(entry);
        self
    }

    /// Stores a selection snapshot taken before a formatting key.
    pub fn selection_buffer(mut self, entries: Vec<EntryId>) -> Self {
        self.selection_buffer = Some(entries);
        self
    }

    pub fn search_requested(mut self, requested: bool) -> Self {
        self.search_requested = Some(requested);
        self
    }

    fn apply(self, state: &mut ModeState) {
        if let Some(mode) = self.mode {
            state.mode = mode;
        }
        if let Some(offset) = self.anchor_offset {
            state.anchor_offset = offset;
        }
        if let Some(debug) = self.debug {
            state.debug = debug;
        }
        if let Some(handle) = self.search_focus_retry {
            state.search_focus_retry = handle;
        }
        if let Some(entry) = self.focus_pre_jump {
            state.focus_pre_jump = entry;
        }
        if let Some(entry) = self.prev_enter_item {
            state.prev_enter_item = entry;
        }
        if let Some(entries) = self.selection_buffer {
            state.selection_buffer = entries;
        }
        if let Some(requested) = self.search_requested {
            state.search_requested = requested;
        }
    }
}

/// Identifies a subscription for [`StateStore::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

type Listener = Box<dyn FnMut(&ModeState)>;

/// Owner of the live [`ModeState`].
#[derive(Default)]
pub struct StateStore {
    state: ModeState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: usize,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from `state` instead of the defaults.
    pub fn with_state(state: ModeState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Copy of the current state.
    pub fn get(&self) -> ModeState {
        self.state.clone()
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn anchor_offset(&self) -> usize {
        self.state.anchor_offset
    }

    pub fn debug(&self) -> bool {
        self.state.debug
    }

    /// Merges the patch computed from the current state, then notifies each
    /// subscriber exactly once with the merged state.
    pub fn set<F>(&mut self, updater: F)
    where
        F: FnOnce(&ModeState) -> Patch,
    {
        let patch = updater(&self.state);
        patch.apply(&mut self.state);

        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&ModeState) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_get_returns_copy() {
        let store = StateStore::new();
        let mut snapshot = store.get();
        snapshot.mode = Mode::Visual;
        assert_eq!(store.mode(), Mode::Normal);
    }

    #[test]
    fn test_set_merges_patch() {
        let mut store = StateStore::new();
        store.set(|_| Patch::default().anchor_offset(7).debug(true));
        store.set(|_| Patch::default().mode(Mode::Insert));

        let state = store.get();
        assert_eq!(state.anchor_offset, 7);
        assert!(state.debug);
        assert_eq!(state.mode, Mode::Insert);
    }

    #[test]
    fn test_updater_sees_old_state() {
        let mut store = StateStore::new();
        store.set(|_| Patch::default().anchor_offset(4));
        store.set(|s| Patch::default().anchor_offset(s.anchor_offset + 1));
        assert_eq!(store.anchor_offset(), 5);
    }

    #[test]
    fn test_one_notification_per_set() {
        let mut store = StateStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        store.subscribe(move |s| log.borrow_mut().push((s.mode, s.anchor_offset)));

        store.set(|_| Patch::default().mode(Mode::Visual).anchor_offset(2));
        store.set(|_| Patch::default());

        assert_eq!(
            *seen.borrow(),
            vec![(Mode::Visual, 2), (Mode::Visual, 2)]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = StateStore::new();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        let id = store.subscribe(move |_| *counter.borrow_mut() += 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set(|_| Patch::default().debug(true));
        assert_eq!(*seen.borrow(), 0);
    }
}
