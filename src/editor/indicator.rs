//! Mode indicator.
//!
//! Subscribes to the [`StateStore`] and redraws through an [`IndicatorSink`]
//! whenever the mode label changes. Other state changes (anchor moves, retry
//! handles) do not redraw.

use super::state::{StateStore, SubscriptionId};
use std::cell::RefCell;
use std::rc::Rc;

/// Where the indicator text is drawn.
pub trait IndicatorSink {
    fn show(&mut self, text: &str);
}

impl<F> IndicatorSink for F
where
    F: FnMut(&str),
{
    fn show(&mut self, text: &str) {
        self(text)
    }
}

/// Keeps a sink showing the current mode.
#[derive(Debug)]
pub struct ModeIndicator {
    text: Rc<RefCell<String>>,
    subscription: SubscriptionId,
}

impl ModeIndicator {
    /// Draws the current mode right away, then follows `store`.
    ///
    /// ```
    /// use vimflowy::editor::indicator::ModeIndicator;
    /// use vimflowy::editor::mode::Mode;
    /// use vimflowy::editor::state::{Patch, StateStore};
    ///
    /// let mut store = StateStore::new();
    /// let indicator = ModeIndicator::attach(&mut store, |_: &str| {});
    /// store.set(|_| Patch::default().mode(Mode::Insert));
    /// assert_eq!(indicator.text(), "INSERT");
    /// ```
    pub fn attach<S>(store: &mut StateStore, mut sink: S) -> Self
    where
        S: IndicatorSink + 'static,
    {
        let initial = store.mode().to_string();
        sink.show(&initial);

        let text = Rc::new(RefCell::new(initial));
        let shown = Rc::clone(&text);
        let subscription = store.subscribe(move |state| {
            let label = state.mode.to_string();
            let mut shown = shown.borrow_mut();
            if *shown != label {
                sink.show(&label);
                *shown = label;
            }
        });

        Self { text, subscription }
    }

    /// Text currently shown.
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Stops following the store.
    pub fn detach(self, store: &mut StateStore) -> bool {
        store.unsubscribe(self.subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::mode::Mode;
    use crate::editor::state::Patch;

    #[test]
    fn test_redraws_only_on_mode_change() {
        let mut store = StateStore::new();
        let drawn = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&drawn);
        let indicator =
            ModeIndicator::attach(&mut store, move |t: &str| log.borrow_mut().push(t.to_string()));

        store.set(|_| Patch::default().anchor_offset(3));
        store.set(|_| Patch::default().mode(Mode::Visual));
        store.set(|_| Patch::default().mode(Mode::Visual));

        assert_eq!(*drawn.borrow(), vec!["NORMAL", "VISUAL"]);
        assert_eq!(indicator.text(), "VISUAL");
    }

    #[test]
    fn test_detach() {
        let mut store = StateStore::new();
        let indicator = ModeIndicator::attach(&mut store, |_: &str| {});
        assert!(indicator.detach(&mut store));
        store.set(|_| Patch::default().mode(Mode::Insert));
    }
}
