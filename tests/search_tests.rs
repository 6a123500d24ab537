use std::time::Duration;
use vimflowy::config::Config;
use vimflowy::host::{EntryId, Host, MemoryOutline};
use vimflowy::input::{InputHandler, KeyEvent};

fn id(s: &str) -> EntryId {
    EntryId::new(s)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn searching(config: Config) -> InputHandler<MemoryOutline> {
    let outline = MemoryOutline::from_indented("apple\nbanana\ncherry\n");
    let mut h = InputHandler::new(outline, config);
    h.host_mut().edit_name(&id("apple"));

    let d = h.handle_key(&KeyEvent::new("/"));
    assert!(d.suppressed);
    assert!(h.host().search_box_focused());
    h
}

#[test]
fn test_own_search_focus_is_acknowledged() {
    let mut h = searching(Config::default());
    assert!(h.state().get().search_requested);

    h.search_box_focused(false, Some(id("apple")));
    assert!(!h.state().get().search_requested);
    // the caret stays in the search box
    assert!(h.host().search_box_focused());
    assert_eq!(h.host().focused_entry(), None);
}

#[test]
fn test_programmatic_focus_restores_caret() {
    let mut h = searching(Config::default());
    h.search_box_focused(false, None);

    // the host escaped out of the search and refocused the box
    h.search_box_focused(false, Some(id("banana")));
    assert_eq!(h.host().focused_entry(), Some(id("banana")));
}

#[test]
fn test_pointer_focus_is_ignored() {
    let mut h = searching(Config::default());
    h.search_box_focused(true, Some(id("banana")));
    assert!(h.state().get().search_requested);
    assert_eq!(h.host().focused_entry(), None);
}

#[test]
fn test_enter_retries_until_results_render() {
    let mut h = searching(Config::default());
    h.search_box_focused(false, Some(id("apple")));

    assert!(h.search_box_keydown(&KeyEvent::new("Enter")));
    assert!(h.state().get().search_focus_retry.is_some());
    assert_eq!(h.host().focused_entry(), None);

    h.advance(ms(100));
    assert_eq!(h.host().focused_entry(), None);

    h.host_mut().render_search_results("an");
    h.advance(ms(200));
    assert_eq!(h.host().focused_entry(), Some(id("banana")));
    assert_eq!(h.state().get().search_focus_retry, None);
    assert!(h.timers().is_empty());
}

#[test]
fn test_results_already_present_focus_immediately() {
    let mut h = searching(Config::default());
    h.host_mut().render_search_results("cherry");

    assert!(h.search_box_keydown(&KeyEvent::new("Enter")));
    assert_eq!(h.host().focused_entry(), Some(id("cherry")));
    assert!(h.timers().is_empty());
}

#[test]
fn test_other_key_cancels_retry() {
    let mut h = searching(Config::default());
    h.search_box_keydown(&KeyEvent::new("Enter"));
    assert_eq!(h.timers().len(), 1);

    assert!(!h.search_box_keydown(&KeyEvent::new("x")));
    assert!(h.timers().is_empty());
    assert_eq!(h.state().get().search_focus_retry, None);

    h.host_mut().render_search_results("apple");
    h.advance(ms(1000));
    assert_eq!(h.host().focused_entry(), None);
}

#[test]
fn test_second_enter_replaces_pending_retry() {
    let mut h = searching(Config::default());
    h.search_box_keydown(&KeyEvent::new("Enter"));
    let first = h.state().get().search_focus_retry;

    h.search_box_keydown(&KeyEvent::new("Enter"));
    assert_eq!(h.timers().len(), 1);
    assert_ne!(h.state().get().search_focus_retry, first);
}

#[test]
fn test_retry_is_unbounded_by_default() {
    let mut h = searching(Config::default());
    h.search_box_keydown(&KeyEvent::new("Enter"));

    h.advance(ms(5000));
    assert_eq!(h.timers().len(), 1);
    assert!(h.state().get().search_focus_retry.is_some());
}

#[test]
fn test_retry_limit_gives_up() {
    let config = Config {
        search_retry_limit: Some(2),
        ..Config::default()
    };
    let mut h = searching(config);
    h.search_box_keydown(&KeyEvent::new("Enter"));

    h.advance(ms(1000));
    assert!(h.timers().is_empty());
    assert_eq!(h.state().get().search_focus_retry, None);
}

#[test]
fn test_retry_delay_is_configurable() {
    let config = Config {
        search_retry_delay_ms: 50,
        ..Config::default()
    };
    let mut h = searching(config);
    h.search_box_keydown(&KeyEvent::new("Enter"));
    h.host_mut().render_search_results("apple");

    h.advance(ms(49));
    assert_eq!(h.host().focused_entry(), None);
    h.advance(ms(50));
    assert_eq!(h.host().focused_entry(), Some(id("apple")));
}

#[test]
fn test_zero_delay_retry_runs_once_per_advance() {
    let config = Config {
        search_retry_delay_ms: 0,
        ..Config::default()
    };
    let mut h = searching(config);
    h.search_box_keydown(&KeyEvent::new("Enter"));

    h.advance(ms(10));
    assert_eq!(h.timers().len(), 1);
    assert!(h.state().get().search_focus_retry.is_some());

    h.host_mut().render_search_results("banana");
    h.advance(ms(10));
    assert_eq!(h.host().focused_entry(), Some(id("banana")));
    assert!(h.timers().is_empty());
}
