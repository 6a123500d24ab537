use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use termion::event::Key;
use termion::input::TermRead;
use termion::raw::IntoRawMode;
use tracing_subscriber::EnvFilter;

use vimflowy::config::Config;
use vimflowy::editor::indicator::ModeIndicator;
use vimflowy::host::{EntryId, Host, MemoryOutline};
use vimflowy::input::keys::{Canonicalizer, Convention, ESCAPE};
use vimflowy::input::{InputHandler, KeyEvent};

const SAMPLE_OUTLINE: &str = "\
Inbox
  call the plumber
  read https://example.com/article
Projects
  vimflowy
    keyboard layer
    search wiring
  garden [+]
    tomatoes
Someday
";

/// Vimflowy - modal, vim-style keyboard editing over an outliner
#[derive(Parser)]
#[command(name = "vimflowy")]
#[command(version)]
#[command(about = "Modal, vim-style keyboard editing over an outliner", long_about = None)]
struct Cli {
    /// Indented outline file, two spaces per level (omit for a sample outline)
    outline: Option<PathBuf>,

    /// Replay space-separated keys (e.g. "j j i x escape") instead of reading the terminal
    #[arg(short, long)]
    keys: Option<String>,

    /// Start with dispatch tracing enabled
    #[arg(long)]
    debug: bool,

    /// Milliseconds of timer time that pass after each replayed key
    #[arg(long, default_value_t = 250)]
    step_ms: u64,
}

/// Restores the cursor before the default panic output, so a panic inside raw
/// mode stays readable.
fn setup_panic_hook() {
    use std::panic;

    let default_panic = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = write!(io::stderr(), "{}", termion::cursor::Show);
        let _ = io::stderr().flush();
        default_panic(panic_info);
    }));
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("VIMFLOWY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    setup_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let outline = match &cli.outline {
        Some(path) => MemoryOutline::load(path)?,
        None => MemoryOutline::from_indented(SAMPLE_OUTLINE),
    };

    let mut config = Config::load();
    config.debug |= cli.debug;

    let mut handler = InputHandler::new(outline, config);
    let root = handler.host().root_entry();
    if let Some(first) = handler.host().visible_children(&root).into_iter().next() {
        handler.host_mut().edit_name(&first);
    }

    match cli.keys {
        Some(keys) => replay(&mut handler, &keys, Duration::from_millis(cli.step_ms)),
        None => interactive(&mut handler),
    }
}

/// Parses a whitespace-separated key list.
fn parse_keys(keys: &str) -> Result<Vec<KeyEvent>> {
    keys.split_whitespace()
        .map(|k| {
            k.parse::<KeyEvent>()
                .with_context(|| format!("Invalid key: {}", k))
        })
        .collect()
}

/// Feeds one key to the search box or the dispatcher, the way a page would.
struct Session {
    query: String,
    focus_before_search: Option<EntryId>,
    keys: Canonicalizer,
}

impl Session {
    fn new(config: &Config) -> Self {
        Self {
            query: String::new(),
            focus_before_search: None,
            keys: Canonicalizer::with_escape_aliases(
                Convention::Transparent,
                config.escape_aliases.clone(),
            ),
        }
    }

    fn feed(&mut self, handler: &mut InputHandler<MemoryOutline>, event: &KeyEvent) {
        if handler.host().search_box_focused() {
            self.feed_search_box(handler, event);
            return;
        }

        let focused = handler.host().focused_entry();
        let dispatch = handler.handle_key(event);
        if !dispatch.suppressed {
            handler.host_mut().apply_default(event);
        }

        if handler.host().search_box_focused() {
            self.query.clear();
            self.focus_before_search = focused;
            handler.search_box_focused(false, self.focus_before_search.clone());
        }
    }

    fn feed_search_box(&mut self, handler: &mut InputHandler<MemoryOutline>, event: &KeyEvent) {
        let suppressed = handler.search_box_keydown(event);
        if suppressed {
            // results render a moment after Enter, so the first attempt misses
            handler.host_mut().render_search_results(&self.query);
            return;
        }

        if self.keys.token(event).as_str() == ESCAPE {
            // the page refocuses the box on escape; the handler restores the caret
            handler.search_box_focused(false, self.focus_before_search.take());
            return;
        }

        match event.key.as_str() {
            "Backspace" => {
                self.query.pop();
            }
            key if key.chars().count() == 1 && !event.modifiers.ctrl => self.query.push_str(key),
            _ => {}
        }
    }
}

fn caret_label(host: &MemoryOutline) -> String {
    match host.caret() {
        Some(caret) => format!("{}@{}", caret.entry, caret.offset),
        None if host.search_box_focused() => "search".to_string(),
        None => "-".to_string(),
    }
}

fn replay(handler: &mut InputHandler<MemoryOutline>, keys: &str, step: Duration) -> Result<()> {
    let events = parse_keys(keys)?;
    let indicator = ModeIndicator::attach(handler.state_mut(), |text: &str| {
        eprintln!(
            "{}{} {} {}{}",
            termion::color::Bg(termion::color::AnsiValue::grayscale(12)),
            termion::color::Fg(termion::color::White),
            text,
            termion::color::Bg(termion::color::Reset),
            termion::color::Fg(termion::color::Reset),
        );
    });

    let mut session = Session::new(handler.config());
    let mut stdout = io::stdout().lock();
    for (event, name) in events.iter().zip(keys.split_whitespace()) {
        session.feed(handler, event);
        let now = handler.timers().now() + step;
        handler.advance(now);

        writeln!(
            stdout,
            "{:<12} {:<7} {}",
            name,
            indicator.text(),
            caret_label(handler.host())
        )?;
    }

    Ok(())
}

/// Lines of the visible outline under the current zoom, caret drawn as `|`.
fn render_outline(host: &MemoryOutline) -> Vec<String> {
    fn walk(host: &MemoryOutline, id: &EntryId, depth: usize, lines: &mut Vec<String>) {
        let mut name = host.name_text(id);
        let focused = host.focused_entry().as_ref() == Some(id);
        if let Some(caret) = host.caret().filter(|c| c.entry == *id) {
            let at = name
                .char_indices()
                .nth(caret.offset)
                .map(|(i, _)| i)
                .unwrap_or(name.len());
            name.insert(at, '|');
        }
        let bullet = match (host.children(id).is_empty(), host.is_expanded(id)) {
            (true, _) => '-',
            (false, true) => 'v',
            (false, false) => '>',
        };
        let done = if host.is_completed(id) { " (done)" } else { "" };
        let selected = if host.selection().contains(id) { "*" } else { " " };
        let marker = if focused { ">" } else { " " };
        lines.push(format!(
            "{}{}{}{} {}{}",
            marker,
            selected,
            "  ".repeat(depth),
            bullet,
            name,
            done
        ));

        for child in host.visible_children(id) {
            walk(host, &child, depth + 1, lines);
        }
    }

    let mut lines = Vec::new();
    let current = host.current_entry();
    if current != host.root_entry() {
        lines.push(format!("[{}]", host.name_text(&current)));
    }
    for child in host.visible_children(&current) {
        walk(host, &child, 0, &mut lines);
    }
    lines
}

fn draw(
    out: &mut impl Write,
    handler: &InputHandler<MemoryOutline>,
    mode: &str,
    query: &str,
) -> Result<()> {
    write!(out, "{}{}", termion::clear::All, termion::cursor::Goto(1, 1))?;
    for line in render_outline(handler.host()) {
        write!(out, "{}\r\n", line)?;
    }
    write!(out, "\r\n")?;
    if handler.host().search_box_focused() {
        write!(out, "search: {}\r\n", query)?;
    }
    write!(
        out,
        "{}{} {} {}{}  Ctrl-C quits\r\n",
        termion::color::Bg(termion::color::AnsiValue::grayscale(12)),
        termion::color::Fg(termion::color::White),
        mode,
        termion::color::Bg(termion::color::Reset),
        termion::color::Fg(termion::color::Reset),
    )?;
    out.flush()?;
    Ok(())
}

fn interactive(handler: &mut InputHandler<MemoryOutline>) -> Result<()> {
    let indicator = ModeIndicator::attach(handler.state_mut(), |_: &str| {});
    let mut stdout = io::stdout()
        .into_raw_mode()
        .context("Failed to enable raw mode")?;
    write!(stdout, "{}", termion::cursor::Hide)?;

    let mut session = Session::new(handler.config());
    draw(&mut stdout, handler, &indicator.text(), &session.query)?;

    for key in io::stdin().keys() {
        let key = key.context("Failed to read key")?;
        if key == Key::Ctrl('c') {
            break;
        }

        session.feed(handler, &KeyEvent::from(key));
        // one retry interval of timer time passes per key press
        let now = handler.timers().now() + handler.config().search_retry_delay();
        handler.advance(now);

        draw(&mut stdout, handler, &indicator.text(), &session.query)?;
    }

    write!(stdout, "{}", termion::cursor::Show)?;
    stdout.flush()?;
    Ok(())
}
