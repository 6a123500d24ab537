//! The key dispatcher.
//!
//! [`InputHandler`] owns the mode state, the timer queue and the host, and
//! routes every key press through its tables in order. The first table with a
//! binding for the current mode runs it; nothing else runs for that event.
//! Unbound keys in Normal mode without modifiers are suppressed so stray
//! letters never reach the document.

use super::actions;
use super::keys::KeyEvent;
use super::table::{ActionContext, ActionTable, KeyHistory, Suppression};
use crate::config::Config;
use crate::editor::cursor::CursorNavigator;
use crate::editor::mode::Mode;
use crate::editor::state::{ModeState, Patch, StateStore};
use crate::editor::timers::{Deferred, Timers};
use crate::host::{EntryId, Host};
use std::time::Duration;
use tracing::{debug, trace};

/// Outcome of handling one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// The host's default handling must not run.
    pub suppressed: bool,
    /// Name of the action that ran, if any.
    pub action: Option<&'static str>,
}

/// Routes key presses to actions and drives deferred work.
pub struct InputHandler<H> {
    host: H,
    state: StateStore,
    timers: Timers,
    navigator: CursorNavigator,
    config: Config,
    tables: Vec<ActionTable>,
    histories: Vec<KeyHistory>,
}

impl<H: Host> InputHandler<H> {
    /// Creates a handler with the default transparent and strict tables.
    ///
    /// # Example
    ///
    /// ```
    /// use vimflowy::config::Config;
    /// use vimflowy::editor::mode::Mode;
    /// use vimflowy::host::MemoryOutline;
    /// use vimflowy::input::{InputHandler, KeyEvent};
    ///
    /// let mut handler = InputHandler::new(MemoryOutline::from_indented("a\n"), Config::default());
    /// handler.handle_key(&KeyEvent::new("i"));
    /// assert_eq!(handler.mode(), Mode::Insert);
    /// ```
    pub fn new(host: H, config: Config) -> Self {
        let tables = actions::default_tables(&config);
        Self::with_tables(host, config, tables)
    }

    /// Creates a handler consulting `tables` in order.
    pub fn with_tables(host: H, config: Config, tables: Vec<ActionTable>) -> Self {
        let histories = tables
            .iter()
            .map(|t| KeyHistory::new(config.sequence_length.max(t.longest_sequence())))
            .collect();
        let state = StateStore::with_state(ModeState {
            debug: config.debug,
            ..ModeState::default()
        });

        Self {
            host,
            state,
            timers: Timers::new(),
            navigator: CursorNavigator::new(config.floating_header_height),
            config,
            tables,
            histories,
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Mutable access, e.g. to subscribe a mode indicator.
    pub fn state_mut(&mut self) -> &mut StateStore {
        &mut self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dispatches one key press.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Dispatch {
        let mode = self.state.mode();
        let mut dispatch = Dispatch::default();
        let mut matched_sequence = false;

        for (table, history) in self.tables.iter().zip(self.histories.iter_mut()) {
            let token = table.token(event);
            if token.is_empty() || event.is_modifier_key() {
                continue;
            }
            history.push(token);
            if dispatch.action.is_some() {
                continue;
            }

            let Some((len, binding)) = table.resolve(mode, history.tokens()) else {
                continue;
            };
            if self.state.debug() {
                debug!(%mode, table = table.name(), action = binding.name(), ?event, "dispatch");
            }

            let mut cx = ActionContext::new(
                &mut self.state,
                &mut self.host,
                &mut self.timers,
                &self.navigator,
                &self.config,
                event,
            );
            binding.run(&mut cx);

            dispatch.suppressed = match table.suppression() {
                Suppression::Always => true,
                Suppression::ByAction => cx.is_suppressed(),
            };
            dispatch.action = Some(binding.name());
            matched_sequence = len > 1;
        }

        if dispatch.action.is_none() && mode == Mode::Normal && !event.modifiers.any() {
            if self.state.debug() {
                debug!(?event, "prevented because NORMAL mode");
            }
            dispatch.suppressed = true;
        }

        if matched_sequence || self.state.mode() != mode {
            self.histories.iter_mut().for_each(KeyHistory::clear);
        }

        dispatch
    }

    /// Key press inside the host's search box. Returns whether it was
    /// suppressed.
    ///
    /// Enter starts trying to put the caret on the first search hit, retrying
    /// at the configured delay until the results have rendered. Any other key
    /// cancels a pending retry.
    pub fn search_box_keydown(&mut self, event: &KeyEvent) -> bool {
        self.cancel_search_retry();
        if event.key != "Enter" {
            return false;
        }

        self.try_focus_first_search_result(0);
        true
    }

    /// The search box gained focus.
    ///
    /// Focus caused by our own search command is acknowledged and otherwise
    /// ignored, as is pointer focus. Any other focus came from the host
    /// escaping out of a search, so the caret goes back to `related`.
    pub fn search_box_focused(&mut self, from_pointer: bool, related: Option<EntryId>) {
        if from_pointer {
            return;
        }
        if self.state.get().search_requested {
            self.state.set(|_| Patch::default().search_requested(false));
            return;
        }

        if self.state.debug() {
            debug!(?related, "restoring caret after search escape");
        }
        if let Some(related) = related.filter(|e| self.host.contains(e)) {
            self.navigator
                .set_cursor_after_vertical_move(&mut self.host, &mut self.state, &related);
        }
    }

    /// The host's multi-selection changed.
    pub fn selection_changed(&mut self) {
        let selected = !self.host.selection().is_empty();
        let next = match self.state.mode() {
            Mode::Normal if selected => Mode::Visual,
            Mode::Visual if !selected => Mode::Normal,
            _ => return,
        };
        self.state.set(|_| Patch::default().mode(next));
        self.histories.iter_mut().for_each(KeyHistory::clear);
    }

    /// Runs every deferred task due at or before `now`, in due order. Work a
    /// task schedules for the next frame runs on the next call.
    pub fn advance(&mut self, now: Duration) {
        let horizon = self.timers.horizon();
        while let Some((handle, task)) = self.timers.pop_due(now, horizon) {
            match task {
                Deferred::FocusFirstSearchResult { attempt } => {
                    if self.state.get().search_focus_retry == Some(handle) {
                        self.state.set(|_| Patch::default().search_focus_retry(None));
                    }
                    self.try_focus_first_search_result(attempt);
                }
                Deferred::FixFocus => {
                    self.with_context(actions::fix_focus);
                }
            }
        }
        self.timers.advance_clock(now);
    }

    /// Flips verbose dispatch tracing.
    pub fn toggle_debugging(&mut self) {
        self.state.set(|s| Patch::default().debug(!s.debug));
    }

    fn cancel_search_retry(&mut self) {
        if let Some(handle) = self.state.get().search_focus_retry {
            self.timers.cancel(handle);
            self.state.set(|_| Patch::default().search_focus_retry(None));
        }
    }

    fn try_focus_first_search_result(&mut self, attempt: u32) {
        if self.state.debug() {
            debug!(attempt, "trying to focus first search result");
        }
        if self.with_context(actions::focus_first_search_result) {
            return;
        }

        if let Some(limit) = self.config.search_retry_limit {
            if attempt >= limit {
                trace!(attempt, "giving up on first search result");
                return;
            }
        }
        let handle = self.timers.schedule(
            self.config.search_retry_delay(),
            Deferred::FocusFirstSearchResult {
                attempt: attempt + 1,
            },
        );
        self.state
            .set(|_| Patch::default().search_focus_retry(Some(handle)));
    }

    /// Runs `f` with a context not tied to a key press.
    fn with_context<R>(&mut self, f: impl FnOnce(&mut ActionContext<'_>) -> R) -> R {
        let event = KeyEvent::default();
        let mut cx = ActionContext::new(
            &mut self.state,
            &mut self.host,
            &mut self.timers,
            &self.navigator,
            &self.config,
            &event,
        );
        f(&mut cx)
    }
}

impl<H: Host + std::fmt::Debug> std::fmt::Debug for InputHandler<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHandler")
            .field("host", &self.host)
            .field("state", &self.state)
            .field("timers", &self.timers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryOutline;

    fn handler(outline: &str) -> InputHandler<MemoryOutline> {
        InputHandler::new(MemoryOutline::from_indented(outline), Config::default())
    }

    fn key(s: &str) -> KeyEvent {
        s.parse().unwrap()
    }

    #[test]
    fn test_one_action_per_event() {
        let mut h = handler("a\nb\n");
        h.host_mut().edit_name(&EntryId::new("b"));

        // ctrl-k is bound in the transparent table; strict would read it as `k`
        let d = h.handle_key(&key("ctrl-k"));
        assert_eq!(d.action, Some("jump-menu"));
        assert_eq!(h.mode(), Mode::Insert);
        assert_eq!(h.host().focused_entry(), Some(EntryId::new("b")));
    }

    #[test]
    fn test_unbound_normal_key_is_suppressed() {
        let mut h = handler("a\n");
        let d = h.handle_key(&key("x"));
        assert_eq!(d, Dispatch { suppressed: true, action: None });

        let d = h.handle_key(&key("ctrl-x"));
        assert!(!d.suppressed);
    }

    #[test]
    fn test_modifier_keydown_does_not_repeat_sequence() {
        let mut h = handler("a\n  b\n");
        h.host_mut().edit_name(&EntryId::new("b"));
        h.handle_key(&key("g"));
        let d = h.handle_key(&KeyEvent::new("Shift").shift());
        assert_eq!(d.action, None);
    }

    #[test]
    fn test_toggle_debugging_notifies() {
        let mut h = handler("a\n");
        let seen = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = seen.clone();
        h.state_mut().subscribe(move |_| counter.set(counter.get() + 1));

        h.toggle_debugging();
        assert!(h.state().debug());
        assert_eq!(seen.get(), 1);
    }
}
