//! Per-mode key tables.
//!
//! An [`ActionTable`] maps `(Mode, KeySequence)` to a named [`Action`]. Each
//! table carries the [`Canonicalizer`] its keys were written for and a
//! [`Suppression`] policy deciding who cancels the host's default handling.

use super::keys::{Canonicalizer, KeyEvent, KeySequence, KeyToken};
use crate::config::Config;
use crate::editor::cursor::CursorNavigator;
use crate::editor::mode::Mode;
use crate::editor::state::StateStore;
use crate::editor::timers::Timers;
use crate::host::Host;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Who suppresses the host's default handling of a bound key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// The dispatcher suppresses every bound key.
    Always,
    /// Each action calls [`ActionContext::suppress`] when it wants to.
    ByAction,
}

/// Everything an action may touch while it runs.
///
/// # Fields
///
/// * `state` - The observable modal state
/// * `host` - The outliner being driven
/// * `timers` - Queue for work that must run after the dispatch returns
/// * `navigator` - Caret and vertical-move helpers
/// * `config` - User settings
pub struct ActionContext<'a> {
    pub state: &'a mut StateStore,
    pub host: &'a mut dyn Host,
    pub timers: &'a mut Timers,
    pub navigator: &'a CursorNavigator,
    pub config: &'a Config,
    event: &'a KeyEvent,
    suppressed: bool,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        state: &'a mut StateStore,
        host: &'a mut dyn Host,
        timers: &'a mut Timers,
        navigator: &'a CursorNavigator,
        config: &'a Config,
        event: &'a KeyEvent,
    ) -> Self {
        Self {
            state,
            host,
            timers,
            navigator,
            config,
            event,
            suppressed: false,
        }
    }

    /// The key press being handled.
    pub fn event(&self) -> &KeyEvent {
        self.event
    }

    /// Cancel the host's default handling and stop propagation.
    pub fn suppress(&mut self) {
        self.suppressed = true;
    }

    /// Whether the host's default handling of the key is cancelled.
    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }
}

/// Behaviour bound to a key.
pub trait Action {
    fn run(&self, cx: &mut ActionContext<'_>);
}

impl<F> Action for F
where
    F: Fn(&mut ActionContext<'_>),
{
    fn run(&self, cx: &mut ActionContext<'_>) {
        self(cx)
    }
}

/// A named action, as stored in a table row.
pub struct Binding {
    name: &'static str,
    action: Box<dyn Action>,
}

impl Binding {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn run(&self, cx: &mut ActionContext<'_>) {
        self.action.run(cx)
    }
}

/// Key bindings for every mode, under one token convention.
pub struct ActionTable {
    name: &'static str,
    canonicalizer: Canonicalizer,
    suppression: Suppression,
    rows: HashMap<Mode, IndexMap<KeySequence, Binding>>,
    longest: usize,
}

impl ActionTable {
    /// An empty table whose keys are spelled by `canonicalizer`.
    pub fn new(name: &'static str, canonicalizer: Canonicalizer, suppression: Suppression) -> Self {
        Self {
            name,
            canonicalizer,
            suppression,
            rows: HashMap::new(),
            longest: 1,
        }
    }

    /// Adds (or replaces) a binding.
    pub fn bind<A>(
        mut self,
        mode: Mode,
        keys: impl Into<KeySequence>,
        name: &'static str,
        action: A,
    ) -> Self
    where
        A: Action + 'static,
    {
        let keys = keys.into();
        self.longest = self.longest.max(keys.len());
        self.rows.entry(mode).or_default().insert(
            keys,
            Binding {
                name,
                action: Box::new(action),
            },
        );
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn suppression(&self) -> Suppression {
        self.suppression
    }

    /// Length of the longest bound sequence.
    pub fn longest_sequence(&self) -> usize {
        self.longest
    }

    /// `event` in this table's spelling.
    pub fn token(&self, event: &KeyEvent) -> KeyToken {
        self.canonicalizer.token(event)
    }

    /// Exact binding for `keys` in `mode`.
    pub fn lookup(&self, mode: Mode, keys: &KeySequence) -> Option<&Binding> {
        self.rows.get(&mode)?.get(keys)
    }

    /// Finds the binding for the longest suffix of `history` bound in `mode`.
    /// Returns how many tokens matched along with the binding.
    pub fn resolve(&self, mode: Mode, history: &[KeyToken]) -> Option<(usize, &Binding)> {
        let longest = self.longest.min(history.len());

        (1..=longest).rev().find_map(|len| {
            let suffix = KeySequence::from(&history[history.len() - len..]);
            self.lookup(mode, &suffix).map(|binding| (len, binding))
        })
    }

    /// Bound sequences and action names for `mode`, in registration order.
    pub fn bindings(&self, mode: Mode) -> Vec<(&KeySequence, &'static str)> {
        self.rows
            .get(&mode)
            .map(|row| row.iter().map(|(keys, b)| (keys, b.name)).collect())
            .unwrap_or_default()
    }
}

/// Rolling window of the most recent tokens seen by one table.
#[derive(Debug, Clone, Default)]
pub struct KeyHistory {
    tokens: Vec<KeyToken>,
    capacity: usize,
}

impl KeyHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, token: KeyToken) {
        if self.tokens.len() == self.capacity {
            self.tokens.remove(0);
        }
        self.tokens.push(token);
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn tokens(&self) -> &[KeyToken] {
        &self.tokens
    }
}
