//! Editor state and mode management.
//!
//! This module holds the modal state machine the key actions drive: the
//! current mode, the observable state store, caret navigation over the
//! outline, deferred work, and the mode indicator.
//!
//! # Modules
//!
//! - `mode`: Editor mode enumeration
//! - `state`: Observable mode state (mode, caret anchor, pending retries)
//! - `cursor`: Caret movement across the visible outline
//! - `timers`: Deferred work on a logical clock
//! - `indicator`: Mode label kept in sync with the state
//!
//! # Example
//!
//! ```
//! use vimflowy::editor::mode::Mode;
//!
//! // Editor starts in Normal mode
//! let mode = Mode::default();
//! assert_eq!(mode, Mode::Normal);
//! ```

pub mod cursor;
pub mod indicator;
pub mod mode;
pub mod state;
pub mod timers;
