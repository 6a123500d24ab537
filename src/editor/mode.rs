//! Editing modes for the modal keyboard layer.
//!
//! The machine starts in [`Mode::Normal`] and is never torn down; it lives for
//! as long as the host page does.
//!
//! # Example
//!
//! ```
//! use vimflowy::editor::mode::Mode;
//!
//! let mode = Mode::default();
//! assert_eq!(mode, Mode::Normal);
//! assert_eq!(format!("{}", mode), "NORMAL");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which key table row is active.
///
/// - `Normal`: navigation; stray characters are swallowed.
/// - `Insert`: editing the text of the focused entry.
/// - `Visual`: an active multi-entry selection exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    Visual,
}

impl Mode {
    /// All modes, in table order.
    pub const ALL: [Mode; 3] = [Mode::Normal, Mode::Insert, Mode::Visual];
}

impl fmt::Display for Mode {
    /// Upper-case name, as shown by the mode indicator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => write!(f, "NORMAL"),
            Mode::Insert => write!(f, "INSERT"),
            Mode::Visual => write!(f, "VISUAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_normal() {
        assert_eq!(Mode::default(), Mode::Normal);
    }

    #[test]
    fn test_display() {
        assert_eq!(Mode::Insert.to_string(), "INSERT");
        assert_eq!(Mode::Visual.to_string(), "VISUAL");
    }
}
