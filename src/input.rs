//! Key bindings for the listing board.
//!
//! | Keys            | Action                                   |
//! |-----------------|------------------------------------------|
//! | `j` / `Down`    | next listing                             |
//! | `k` / `Up`      | previous listing                         |
//! | `g` / `Home`    | first listing                            |
//! | `G` / `End`     | last listing                             |
//! | `s`             | next [`SortStrategy`] (wraps to grid)    |
//! | `q` / `Esc`     | quit                                     |
//!
//! Cycling the sort only marks the view stale.  The main loop then re-reads
//! [`SyncEngine::sorted_listings`] with the new strategy, and the cursor
//! stays on the pinned listing.  New bindings need a matching entry in the
//! status bar hint in `ui.rs`.
//!
//! [`SortStrategy`]: crate::sort::SortStrategy
//! [`SyncEngine::sorted_listings`]: crate::engine::SyncEngine::sorted_listings

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Apply one key press to `app`.  Repeats and releases do nothing.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        _ => {}
    }
}
