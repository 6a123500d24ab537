//! Keyboard input: key canonicalization, key tables and the dispatcher.

pub mod actions;
pub mod handler;
pub mod keys;
pub mod table;

pub use handler::{Dispatch, InputHandler};
pub use keys::{KeyEvent, KeyToken, Modifiers};
