//! Vimflowy - modal, vim-style keyboard editing layered over an outliner.
//!
//! The crate is the keyboard layer only. The outliner itself sits behind the
//! [`host::Host`] trait; [`host::MemoryOutline`] is an in-memory stand-in used
//! by the tests and the command-line harness.
//!
//! # Example
//!
//! ```
//! use vimflowy::config::Config;
//! use vimflowy::editor::mode::Mode;
//! use vimflowy::host::{EntryId, Host, MemoryOutline};
//! use vimflowy::input::{InputHandler, KeyEvent};
//!
//! let outline = MemoryOutline::from_indented("first\nsecond\n");
//! let mut handler = InputHandler::new(outline, Config::default());
//! handler.host_mut().edit_name(&EntryId::new("first"));
//!
//! handler.handle_key(&KeyEvent::new("j"));
//! assert_eq!(handler.host().focused_entry(), Some(EntryId::new("second")));
//!
//! handler.handle_key(&KeyEvent::new("i"));
//! assert_eq!(handler.mode(), Mode::Insert);
//! ```

pub mod config;
pub mod editor;
pub mod host;
pub mod input;
