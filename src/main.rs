//! scrapefeed: maintain an RSS feed derived from a scraped source.
//!
//! ## Architecture overview
//!
//! ```text
//! refresh / show:   cli.rs ─► ScrapedFeed::restore_or_create ─► refresh()
//!
//! watch:
//! ┌──────────┐  PollMsg   ┌──────────┐  draw()  ┌──────────┐
//! │  poll.rs │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (thread) │  (channel) │ (state)  │          │ (render) │
//! └──────────┘            └──────────┘          └──────────┘
//!      ▲ wake()                ▲
//!      └──────────────── handle_key_event()
//!                         ┌──────────┐
//!                         │ input.rs │
//!                         └──────────┘
//! ```
//!
//! * **`cli`**: argument and environment parsing.
//! * **`poll`**: background thread that refreshes the feed on a timer.
//! * **`app`**: state of the live view.
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations.

mod app;
mod cli;
mod input;
mod poll;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use app::App;
use cli::{Cli, Command, FeedArgs};
use scrapefeed::{
    Collaborators, FileSnapshotStore, HttpTransport, RefreshOutcome, RssFilePublisher, RssScraper,
    ScrapedFeed,
};

// ---------------------------------------------------------------------------
// RAII terminal guard, restored even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn collaborators(args: &FeedArgs) -> Result<Collaborators> {
    let config = args.to_config();
    let transport = HttpTransport::new(config.timeout).context("building HTTP client")?;
    Ok(Collaborators {
        transport: Box::new(transport),
        scraper: Box::new(RssScraper {
            skip_seen: args.skip_seen,
        }),
        store: Box::new(FileSnapshotStore::new(&config.state_dir)),
        publisher: Box::new(RssFilePublisher),
    })
}

fn restore(args: &FeedArgs) -> Result<ScrapedFeed> {
    let config = args.to_config();
    config.log_settings();
    let store = FileSnapshotStore::new(&config.state_dir);
    ScrapedFeed::restore_or_create(&store, &config)
        .with_context(|| format!("loading feed state for {}", config.url))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_refresh(args: &FeedArgs) -> Result<()> {
    let mut feed = restore(args)?;
    let collaborators = collaborators(args)?;

    match feed.refresh(&collaborators)? {
        RefreshOutcome::NotModified => println!("{}: not modified", args.url),
        RefreshOutcome::Refreshed { report, diagnostic } => {
            if diagnostic {
                eprintln!("{}: scrape failed, diagnostic entry published", args.url);
            }
            println!(
                "{}: {} new, {} updated, {} evicted, {} entries -> {}",
                args.url,
                report.added,
                report.updated,
                report.evicted,
                feed.items().len(),
                feed.metadata().output_file.display()
            );
        }
    }
    Ok(())
}

fn run_show(args: &FeedArgs) -> Result<()> {
    let feed = restore(args)?;
    for entry in feed.items() {
        let date = entry
            .published
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "no date".into());
        let inserted = entry
            .identifier()
            .and_then(|id| feed.registry().inserted_at(id))
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{date:<17} {:<60} {} (run {inserted})",
            entry.title.as_deref().unwrap_or("(untitled)"),
            entry.identifier().unwrap_or_default()
        );
    }
    Ok(())
}

fn run_watch(args: &FeedArgs, interval: Duration) -> Result<()> {
    install_panic_hook();

    let feed = restore(args)?;
    let mut app = App::new(feed.metadata().title.clone());
    let poller = poll::spawn(feed, collaborators(args)?, interval);

    // -- terminal setup (RAII, Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;

    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain any messages from the refresh thread.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(msg) = poller.rx.try_recv() {
            app.apply(msg);
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.refresh_requested {
            app.refresh_requested = false;
            app.status = "Refreshing…".into();
            poller.wake();
        }
        if app.quit {
            break;
        }
    }

    info!("watch stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match &cli.command {
        Command::Refresh(args) => {
            init_logging(None)?;
            run_refresh(args)
        }
        Command::Show(args) => {
            init_logging(None)?;
            run_show(args)
        }
        Command::Watch { feed, interval } => {
            // Log lines on stderr would tear through the alternate screen.
            std::fs::create_dir_all(&feed.state_dir)
                .with_context(|| format!("creating {}", feed.state_dir.display()))?;
            init_logging(Some(&feed.state_dir.join("scrapefeed.log")))?;
            run_watch(feed, Duration::from_secs(*interval))
        }
    }
}
