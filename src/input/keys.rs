//! Keyboard events and their canonical lookup tokens.
//!
//! A raw [`KeyEvent`] is turned into a [`KeyToken`] by a [`Canonicalizer`].
//! Two conventions exist because the two key tables were written against two
//! different spellings:
//!
//! - [`Convention::Strict`]: `alt-` prefix, then the key name lower-cased
//!   (`j`, `alt-l`, `escape`).
//! - [`Convention::Transparent`]: `ctrl-` then `alt-` prefixes, then the key
//!   name as the host reports it (`G`, `Enter`, `alt-H`, `ctrl- `).
//!
//! Both share one escape alias table, so every spelling the host produces for
//! the escape key canonicalizes to the single token `escape`.
//!
//! # Example
//!
//! ```
//! use vimflowy::input::keys::{Canonicalizer, Convention, KeyEvent};
//!
//! let strict = Canonicalizer::new(Convention::Strict);
//! let transparent = Canonicalizer::new(Convention::Transparent);
//!
//! let event: KeyEvent = "G".parse().unwrap();
//! assert_eq!(strict.token(&event).as_str(), "g");
//! assert_eq!(transparent.token(&event).as_str(), "G");
//!
//! let esc: KeyEvent = "ctrl-[".parse().unwrap();
//! assert_eq!(strict.token(&esc).as_str(), "escape");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use termion::event::Key;
use thiserror::Error;

/// Token every escape alias resolves to.
pub const ESCAPE: &str = "escape";

/// Spellings of the escape key seen from the host.
pub const DEFAULT_ESCAPE_ALIASES: [&str; 3] = ["Escape", "Esc", "ctrl-["];

/// Modifier flags held during a key press.
///
/// # Fields
///
/// * `ctrl` - Control held
/// * `alt` - Alt (Option) held
/// * `shift` - Shift held; tokens carry it only through the key's case
/// * `meta` - Meta (Command) held; never part of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// True when any modifier is held.
    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }
}

/// A key press as delivered by the host surface.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Host key name (`j`, `G`, `Enter`, `Escape`, `Dead`, ...). May be empty
    /// when the host could not name the key.
    pub key: String,
    /// Modifiers held with the key.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A press of `key` with no modifiers. Chain [`KeyEvent::ctrl`] and
    /// friends to add some.
    ///
    /// # Example
    ///
    /// ```
    /// use vimflowy::input::KeyEvent;
    ///
    /// let event = KeyEvent::new("k").ctrl();
    /// assert_eq!(event, "ctrl-k".parse::<KeyEvent>().unwrap());
    /// ```
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::default(),
        }
    }

    /// Adds Control.
    pub fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    /// Adds Alt.
    pub fn alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }

    /// Adds Shift. The key name is left as given.
    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    /// Adds Meta.
    pub fn meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }

    /// True for key-downs of a bare modifier (`Shift`, `Control`, ...).
    pub fn is_modifier_key(&self) -> bool {
        matches!(
            self.key.as_str(),
            "Shift" | "Control" | "Alt" | "AltGraph" | "Meta" | "CapsLock" | "OS"
        )
    }

    /// Host-style spelling with `ctrl-` and `alt-` prefixes and the key name
    /// untouched.
    fn prefixed(&self) -> String {
        let mut raw = String::with_capacity(self.key.len() + 9);
        if self.modifiers.ctrl {
            raw.push_str("ctrl-");
        }
        if self.modifiers.alt {
            raw.push_str("alt-");
        }
        raw.push_str(&self.key);
        raw
    }
}

/// Error parsing a key description such as `ctrl-k` or `shift-Tab`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("empty key description")]
    Empty,
    #[error("'{0}' names modifiers but no key")]
    MissingKey(String),
}

impl FromStr for KeyEvent {
    type Err = KeyParseError;

    /// Parses `[ctrl-][alt-][shift-][meta-]<key>`.
    ///
    /// `space` stands for `" "`. A single upper-case letter implies shift.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut modifiers = Modifiers::default();
        let mut rest = s;
        loop {
            // "ctrl--" is ctrl plus the minus key
            if rest.len() <= 1 {
                break;
            }
            if let Some(r) = rest.strip_prefix("ctrl-") {
                modifiers.ctrl = true;
                rest = r;
            } else if let Some(r) = rest.strip_prefix("alt-") {
                modifiers.alt = true;
                rest = r;
            } else if let Some(r) = rest.strip_prefix("shift-") {
                modifiers.shift = true;
                rest = r;
            } else if let Some(r) = rest.strip_prefix("meta-") {
                modifiers.meta = true;
                rest = r;
            } else {
                break;
            }
        }

        if rest.is_empty() {
            return Err(KeyParseError::MissingKey(s.to_string()));
        }

        let key = if rest == "space" { " " } else { rest };
        let mut chars = key.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_uppercase() {
                modifiers.shift = true;
            }
        }

        Ok(Self {
            key: key.to_string(),
            modifiers,
        })
    }
}

impl From<Key> for KeyEvent {
    /// Maps a terminal key to the names a browser host would report.
    fn from(key: Key) -> Self {
        let named = |name: &str| KeyEvent::new(name);
        let char_event = |c: char| {
            let event = KeyEvent::new(c.to_string());
            if c.is_uppercase() {
                event.shift()
            } else {
                event
            }
        };

        match key {
            Key::Char('\n') => named("Enter"),
            Key::Char('\t') => named("Tab"),
            Key::BackTab => named("Tab").shift(),
            Key::Char(c) => char_event(c),
            Key::Ctrl(c) => char_event(c).ctrl(),
            Key::Alt('\r') | Key::Alt('\n') => named("Enter").alt(),
            Key::Alt(c) => char_event(c).alt(),
            Key::Esc => named("Escape"),
            Key::Backspace => named("Backspace"),
            Key::Delete => named("Delete"),
            Key::Left => named("ArrowLeft"),
            Key::Right => named("ArrowRight"),
            Key::Up => named("ArrowUp"),
            Key::Down => named("ArrowDown"),
            Key::ShiftLeft => named("ArrowLeft").shift(),
            Key::ShiftRight => named("ArrowRight").shift(),
            Key::ShiftUp => named("ArrowUp").shift(),
            Key::ShiftDown => named("ArrowDown").shift(),
            Key::AltLeft => named("ArrowLeft").alt(),
            Key::AltRight => named("ArrowRight").alt(),
            Key::CtrlLeft => named("ArrowLeft").ctrl(),
            Key::CtrlRight => named("ArrowRight").ctrl(),
            Key::Home => named("Home"),
            Key::End => named("End"),
            Key::PageUp => named("PageUp"),
            Key::PageDown => named("PageDown"),
            Key::Insert => named("Insert"),
            Key::F(n) => named(&format!("F{}", n)),
            // terminals deliver ctrl-space as NUL
            Key::Null => named(" ").ctrl(),
            _ => KeyEvent::default(),
        }
    }
}

/// Canonical lookup key for one key press.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyToken(String);

impl KeyToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for KeyToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One or more tokens pressed in succession (`gg`, `d$`, `jk`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySequence(Vec<KeyToken>);

impl KeySequence {
    pub fn single(token: impl Into<KeyToken>) -> Self {
        Self(vec![token.into()])
    }

    /// One token per character: `KeySequence::chars("d$")` is `d` then `$`.
    pub fn chars(keys: &str) -> Self {
        Self(keys.chars().map(|c| KeyToken(c.to_string())).collect())
    }

    pub fn tokens(&self) -> &[KeyToken] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for KeySequence {
    fn from(token: &str) -> Self {
        Self::single(token)
    }
}

impl From<&[KeyToken]> for KeySequence {
    fn from(tokens: &[KeyToken]) -> Self {
        Self(tokens.to_vec())
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

/// Token spelling a table was written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Convention {
    Strict,
    Transparent,
}

/// Turns key events into tokens under one [`Convention`].
///
/// The same event always yields the same token. An event with an empty key
/// name yields the empty token, which no table binds.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    convention: Convention,
    escape_aliases: Vec<String>,
}

impl Canonicalizer {
    pub fn new(convention: Convention) -> Self {
        Self::with_escape_aliases(convention, DEFAULT_ESCAPE_ALIASES.iter().copied())
    }

    pub fn with_escape_aliases<I, S>(convention: Convention, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            convention,
            escape_aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn token(&self, event: &KeyEvent) -> KeyToken {
        if event.key.is_empty() {
            return KeyToken(String::new());
        }

        let prefixed = event.prefixed();
        if self.escape_aliases.iter().any(|alias| *alias == prefixed) {
            return KeyToken(ESCAPE.to_string());
        }

        match self.convention {
            Convention::Strict => {
                let prefix = if event.modifiers.alt { "alt-" } else { "" };
                KeyToken(format!("{}{}", prefix, event.key.to_lowercase()))
            }
            Convention::Transparent => KeyToken(prefixed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> KeyEvent {
        s.parse().unwrap()
    }

    #[test]
    fn test_strict_lowercases_and_prefixes_alt_only() {
        let c = Canonicalizer::new(Convention::Strict);
        assert_eq!(c.token(&key("J")).as_str(), "j");
        assert_eq!(c.token(&key("alt-l")).as_str(), "alt-l");
        assert_eq!(c.token(&key("ctrl-k")).as_str(), "k");
    }

    #[test]
    fn test_transparent_keeps_case_and_ctrl() {
        let c = Canonicalizer::new(Convention::Transparent);
        assert_eq!(c.token(&key("ctrl-k")).as_str(), "ctrl-k");
        assert_eq!(c.token(&key("alt-H")).as_str(), "alt-H");
        assert_eq!(c.token(&key("ctrl-space")).as_str(), "ctrl- ");
        assert_eq!(c.token(&key("Enter")).as_str(), "Enter");
    }

    #[test]
    fn test_escape_aliases_share_one_token() {
        for convention in [Convention::Strict, Convention::Transparent] {
            let c = Canonicalizer::new(convention);
            for alias in ["Escape", "Esc", "ctrl-["] {
                assert_eq!(c.token(&key(alias)).as_str(), ESCAPE, "{alias}");
            }
        }
    }

    #[test]
    fn test_empty_key_is_empty_token() {
        let c = Canonicalizer::new(Convention::Strict);
        let mut event = KeyEvent::default();
        event.modifiers.alt = true;
        assert!(c.token(&event).is_empty());
    }

    #[test]
    fn test_parse_modifiers() {
        let event = key("ctrl-alt-x");
        assert!(event.modifiers.ctrl && event.modifiers.alt);
        assert_eq!(event.key, "x");
        assert!(key("G").modifiers.shift);
        assert_eq!(key("ctrl--").key, "-");
        assert_eq!("".parse::<KeyEvent>(), Err(KeyParseError::Empty));
    }

    #[test]
    fn test_termion_keys() {
        assert_eq!(KeyEvent::from(Key::Esc).key, "Escape");
        assert_eq!(KeyEvent::from(Key::Char('\n')).key, "Enter");
        let alt = KeyEvent::from(Key::Alt('L'));
        assert!(alt.modifiers.alt && alt.modifiers.shift);
        assert_eq!(alt.key, "L");
    }

    #[test]
    fn test_sequence_display() {
        assert_eq!(KeySequence::chars("d$").to_string(), "d$");
        assert_eq!(KeySequence::chars("gg").len(), 2);
    }
}
