use ratatui::widgets::ListState;

use crate::engine::{SyncEvent, SyncOutcome};
use crate::listing::ListingRecord;
use crate::reconcile::{ListingHandle, ReplaceReason};
use crate::sort::SortStrategy;

pub struct App {
    /// Sorted view of the engine's listings, as last refreshed.
    pub items: Vec<ListingRecord>,
    /// Active presentation order.
    pub sort: SortStrategy,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last sync status message.
    pub status: String,
    /// Set when `items` should be re-read from the engine.
    pub dirty: bool,
    /// Engine handle of the listing under the cursor.
    pub pinned: Option<ListingHandle>,
}

impl App {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            sort: SortStrategy::default(),
            list_state: ListState::default(),
            quit: false,
            status: "Starting…".into(),
            dirty: true,
            pinned: None,
        }
    }

    /// Replace the displayed listings and put the cursor back on `anchor`.
    ///
    /// `anchor` is the pinned listing as the engine holds it now.  When the
    /// handle went stale the previously selected id is tried instead, and
    /// failing that the cursor index is clamped.
    pub fn set_items(&mut self, items: Vec<ListingRecord>, anchor: Option<&ListingRecord>) {
        let selected_id = anchor.or_else(|| self.selected()).map(ListingRecord::id_key);
        self.items = items;
        self.dirty = false;

        let index = selected_id
            .and_then(|id| self.items.iter().position(|item| item.id_key() == id))
            .or_else(|| self.list_state.selected().map(|i| i.min(self.items.len().saturating_sub(1))));
        self.list_state
            .select(index.filter(|_| !self.items.is_empty()));
    }

    /// The listing under the cursor.
    pub fn selected(&self) -> Option<&ListingRecord> {
        self.list_state.selected().and_then(|i| self.items.get(i))
    }

    /// Record a sync event in the status line and mark the view stale.
    pub fn apply_event(&mut self, event: &SyncEvent) {
        match event {
            SyncEvent::Synced { count, outcome, at, .. } => {
                let at = at.format("%H:%M:%S");
                self.status = match outcome {
                    SyncOutcome::Merged { updated } => format!("Updated {updated} listings at {at}"),
                    SyncOutcome::Replaced {
                        reason: ReplaceReason::CountChanged { held: 0, .. },
                    } => format!("Loaded {count} listings at {at}"),
                    SyncOutcome::Replaced { reason } => {
                        format!("Reloaded {count} listings at {at} ({reason})")
                    }
                };
                self.dirty = true;
            }
            SyncEvent::Failed { diagnostic, at } => {
                self.status = format!("Sync failed at {}: {diagnostic}", at.format("%H:%M:%S"));
            }
        }
    }

    /// Switch to the next sort strategy.
    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.dirty = true;
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_item(id: &str, bids: u32) -> ListingRecord {
        ListingRecord {
            bid_count: Some(bids),
            ..ListingRecord::new(id)
        }
    }

    fn sample_items() -> Vec<ListingRecord> {
        vec![make_item("1", 5), make_item("2", 1), make_item("3", 9)]
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_starts_empty_and_stale() {
        let app = App::new();
        assert!(app.items.is_empty());
        assert!(!app.quit);
        assert!(app.dirty);
        assert_eq!(app.sort, SortStrategy::Grid);
        assert!(app.list_state.selected().is_none());
    }

    // -- set_items -----------------------------------------------------------

    #[test]
    fn set_items_clears_dirty_flag() {
        let mut app = App::new();
        app.set_items(sample_items(), None);
        assert_eq!(app.items.len(), 3);
        assert!(!app.dirty);
    }

    #[test]
    fn selection_follows_listing_across_resort() {
        let mut app = App::new();
        app.set_items(sample_items(), None);
        app.select_last(); // id "3"

        app.set_items(SortStrategy::MostBids.sort(&sample_items()), None);

        assert_eq!(app.selected().map(|i| i.id.as_str()), Some("3"));
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn anchor_wins_over_the_stale_selection() {
        let mut app = App::new();
        app.set_items(sample_items(), None);
        app.select_first(); // id "1"

        let anchor = make_item("2", 1);
        app.set_items(sample_items(), Some(&anchor));

        assert_eq!(app.selected().map(|i| i.id.as_str()), Some("2"));
    }

    #[test]
    fn selection_clamps_when_selected_listing_disappears() {
        let mut app = App::new();
        app.set_items(sample_items(), None);
        app.select_last();

        app.set_items(vec![make_item("9", 0)], None);
        assert_eq!(app.list_state.selected(), Some(0));

        app.set_items(Vec::new(), None);
        assert!(app.list_state.selected().is_none());
    }

    // -- events --------------------------------------------------------------

    #[test]
    fn synced_event_updates_status_and_marks_dirty() {
        let mut app = App::new();
        app.set_items(Vec::new(), None);
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();

        app.apply_event(&SyncEvent::Synced {
            count: 42,
            outcome: SyncOutcome::Merged { updated: 42 },
            generation: 3,
            at,
        });

        assert_eq!(app.status, "Updated 42 listings at 12:30:00");
        assert!(app.dirty);
    }

    #[test]
    fn replace_reason_shows_in_status() {
        let mut app = App::new();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 15, 0).unwrap();

        app.apply_event(&SyncEvent::Synced {
            count: 7,
            outcome: SyncOutcome::Replaced {
                reason: ReplaceReason::CountChanged { held: 0, fetched: 7 },
            },
            generation: 1,
            at,
        });
        assert_eq!(app.status, "Loaded 7 listings at 09:15:00");

        app.apply_event(&SyncEvent::Synced {
            count: 7,
            outcome: SyncOutcome::Replaced {
                reason: ReplaceReason::IdMismatch { index: 2 },
            },
            generation: 2,
            at,
        });
        assert_eq!(
            app.status,
            "Reloaded 7 listings at 09:15:00 (ids diverged at position 2)"
        );

        app.apply_event(&SyncEvent::Synced {
            count: 8,
            outcome: SyncOutcome::Replaced {
                reason: ReplaceReason::CountChanged { held: 7, fetched: 8 },
            },
            generation: 3,
            at,
        });
        assert_eq!(
            app.status,
            "Reloaded 8 listings at 09:15:00 (count changed from 7 to 8)"
        );
    }

    #[test]
    fn failed_event_keeps_view() {
        let mut app = App::new();
        app.set_items(sample_items(), None);
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 5).unwrap();

        app.apply_event(&SyncEvent::Failed {
            diagnostic: "Sale Not Found".into(),
            at,
        });

        assert_eq!(app.status, "Sync failed at 08:00:05: Sale Not Found");
        assert!(!app.dirty);
        assert_eq!(app.items.len(), 3);
    }

    #[test]
    fn cycle_sort_advances_and_marks_dirty() {
        let mut app = App::new();
        app.set_items(Vec::new(), None);
        app.cycle_sort();
        assert_eq!(app.sort, SortStrategy::LeastBids);
        assert!(app.dirty);
    }

    // -- navigation ----------------------------------------------------------

    #[test]
    fn navigation_on_empty_is_noop() {
        let mut app = App::new();
        app.select_next();
        app.select_previous();
        app.select_first();
        app.select_last();
        assert!(app.list_state.selected().is_none());
    }

    #[test]
    fn select_next_starts_at_zero_then_clamps() {
        let mut app = App::new();
        app.set_items(sample_items(), None);

        app.select_next();
        assert_eq!(app.list_state.selected(), Some(0));
        app.select_next();
        app.select_next();
        app.select_next();
        assert_eq!(app.list_state.selected(), Some(2));
    }

    #[test]
    fn select_previous_clamps_at_zero() {
        let mut app = App::new();
        app.set_items(sample_items(), None);

        app.select_last();
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(1));
        app.select_first();
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));
    }
}
