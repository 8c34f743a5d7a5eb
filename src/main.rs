//! kiosk-listings — a live auction listing board for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────┐ fetch_all ┌────────────┐ reconcile ┌────────────┐
//! │ listing/   │ ◄──────── │ engine.rs  │ ────────► │ reconcile  │
//! │ (fetcher)  │  (pages)  │ (sync task)│           │ (held set) │
//! └────────────┘           └────────────┘           └────────────┘
//!                                │ SyncEvent (channel)
//!                                ▼
//!                          ┌────────────┐  draw()  ┌────────────┐
//!                          │  app.rs    │ ───────► │  ui.rs     │
//!                          │ (state)    │          │ (render)   │
//!                          └────────────┘          └────────────┘
//! ```
//!
//! * **`listing/`** — the `PageFetcher` trait, the `ListingRecord` type and
//!   the HTTP fetcher.
//! * **`paginate`** — walks every page of an auction.
//! * **`reconcile`** — merges a fetch into the held listings in place, or
//!   replaces them.
//! * **`engine`** — the recurring sync task and the read API over the held
//!   listings.
//! * **`sort`** — presentation orderings.
//! * **`app`** / **`ui`** / **`input`** — TUI state, rendering and keys.
//! * **`main`** — wires everything together: parse config, set up logging
//!   and the terminal, and run the event loop.

mod app;
mod config;
mod engine;
mod error;
mod input;
mod listing;
mod paginate;
mod reconcile;
mod sort;
mod ui;

use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use engine::{SyncEngine, SyncEvent};
use listing::HttpPageFetcher;

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
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

/// Restore the terminal before the default panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// The TUI owns stdout, so logs go to `--log-file` or nowhere.  Headless
/// runs log to stderr.
fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kiosk_listings=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(path) = &config.log_file {
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else if config.headless {
        builder.with_writer(io::stderr).init();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Run modes
// ---------------------------------------------------------------------------

async fn run_headless(engine: &SyncEngine, mut events: UnboundedReceiver<SyncEvent>) -> Result<()> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(SyncEvent::Synced { count, outcome, generation, at }) => {
                    info!(count, generation, ?outcome, %at, "listings synced");
                    for listing in engine.current_listings() {
                        debug!(
                            id = %listing.id,
                            bids = ?listing.bid_count,
                            current_bid_cents = ?listing.current_bid_cents,
                            revision = listing.revision,
                            "listing"
                        );
                    }
                }
                Some(SyncEvent::Failed { diagnostic, at }) => {
                    warn!(%diagnostic, %at, "listings sync failed");
                }
                None => break,
            },
        }
    }
    Ok(())
}

fn run_tui(engine: &SyncEngine, events: &mut UnboundedReceiver<SyncEvent>) -> Result<()> {
    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new();

    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain sync events.
    //   2. Re-read the sorted view if it went stale.
    //   3. Render, then poll for keyboard input.
    //   4. Pin the selected listing by engine handle.
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(event) = events.try_recv() {
            app.apply_event(&event);
        }

        if app.dirty {
            let anchor = app.pinned.and_then(|handle| engine.get(handle));
            app.set_items(engine.sorted_listings(app.sort), anchor.as_ref());
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        app.pinned = app.selected().and_then(|listing| engine.handle(&listing.id));

        if app.quit {
            break;
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(&config)?;

    let fetcher = HttpPageFetcher::new(&config.api_base, config.request_timeout())
        .context("building HTTP client")?;
    let (mut engine, mut events) = SyncEngine::new(Arc::new(fetcher));

    engine.start(&config.auction_id, config.page_size, config.sync_interval())?;
    info!(auction = %config.auction_id, api = %config.api_base, "kiosk started");

    if config.headless {
        run_headless(&engine, events).await?;
    } else {
        tokio::task::block_in_place(|| run_tui(&engine, &mut events))?;
    }

    engine.stop().await?;
    Ok(())
}
