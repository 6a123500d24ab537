use termion::event::Key;
use vimflowy::input::keys::{Canonicalizer, Convention, KeyParseError, KeySequence, ESCAPE};
use vimflowy::input::KeyEvent;

fn key(s: &str) -> KeyEvent {
    s.parse().expect("valid key")
}

#[test]
fn test_ctrl_key_from_terminal() {
    let event = KeyEvent::from(Key::Ctrl('k'));
    assert_eq!(event, key("ctrl-k"));
}

#[test]
fn test_backtab_is_shift_tab() {
    let event = KeyEvent::from(Key::BackTab);
    assert_eq!(event.key, "Tab");
    assert!(event.modifiers.shift);
}

#[test]
fn test_ctrl_space_from_terminal() {
    let c = Canonicalizer::new(Convention::Transparent);
    assert_eq!(c.token(&KeyEvent::from(Key::Null)).as_str(), "ctrl- ");
}

#[test]
fn test_uppercase_char_implies_shift() {
    let event = KeyEvent::from(Key::Char('G'));
    assert!(event.modifiers.shift);
    assert_eq!(event, key("G"));
}

#[test]
fn test_same_event_same_token() {
    let c = Canonicalizer::new(Convention::Strict);
    let a = c.token(&key("alt-H"));
    let b = c.token(&key("alt-H"));
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "alt-h");
}

#[test]
fn test_custom_escape_aliases() {
    let c = Canonicalizer::with_escape_aliases(Convention::Transparent, ["ctrl-c"]);
    assert_eq!(c.token(&key("ctrl-c")).as_str(), ESCAPE);
    assert_eq!(c.token(&key("Escape")).as_str(), "Escape");
}

#[test]
fn test_parse_errors() {
    assert_eq!("".parse::<KeyEvent>(), Err(KeyParseError::Empty));
    assert_eq!(
        "ctrl-".parse::<KeyEvent>(),
        Err(KeyParseError::MissingKey("ctrl-".to_string()))
    );
    let err = anyhow::Error::from(KeyParseError::Empty);
    assert_eq!(err.to_string(), "empty key description");
}

#[test]
fn test_space_keyword() {
    assert_eq!(key("space").key, " ");
    assert!(key("ctrl-space").modifiers.ctrl);
}

#[test]
fn test_sequence_from_chars() {
    let seq = KeySequence::chars("dw");
    let tokens: Vec<&str> = seq.tokens().iter().map(|t| t.as_str()).collect();
    assert_eq!(tokens, vec!["d", "w"]);
}

#[test]
fn test_default_aliases_all_canonicalize_to_escape() {
    let config = vimflowy::config::Config::default();
    let c = Canonicalizer::with_escape_aliases(Convention::Transparent, config.escape_aliases);
    for alias in ["Escape", "Esc", "ctrl-["] {
        assert_eq!(c.token(&key(alias)).as_str(), ESCAPE, "{}", alias);
    }
    assert_ne!(c.token(&key("[")).as_str(), ESCAPE);
}
