//! Presentation orderings for the listing view.
//!
//! These only ever produce a sorted copy for display; the reconciler keeps
//! its own id ordering and never consults them.

use std::cmp::Reverse;

use crate::listing::ListingRecord;

/// The closed set of orderings offered by the kiosk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortStrategy {
    /// Arrival order, as the API returned it.
    #[default]
    Grid,
    LeastBids,
    MostBids,
    HighestCurrentBid,
    LowestCurrentBid,
    /// Artist sort key, case-insensitive.
    Alphabetical,
}

impl SortStrategy {
    /// Every strategy, in switcher order.
    pub const ALL: [SortStrategy; 6] = [
        SortStrategy::Grid,
        SortStrategy::LeastBids,
        SortStrategy::MostBids,
        SortStrategy::HighestCurrentBid,
        SortStrategy::LowestCurrentBid,
        SortStrategy::Alphabetical,
    ];

    /// Label shown in the status bar.
    pub fn name(self) -> &'static str {
        match self {
            SortStrategy::Grid => "Grid",
            SortStrategy::LeastBids => "Least Bids",
            SortStrategy::MostBids => "Most Bids",
            SortStrategy::HighestCurrentBid => "Highest Bid",
            SortStrategy::LowestCurrentBid => "Lowest Bid",
            SortStrategy::Alphabetical => "A–Z",
        }
    }

    /// The strategy after this one, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// Return a sorted copy of `listings`.
    ///
    /// All orderings are stable: records with equal keys keep their input
    /// order.
    pub fn sort(self, listings: &[ListingRecord]) -> Vec<ListingRecord> {
        let mut sorted = listings.to_vec();
        match self {
            SortStrategy::Grid => {}
            SortStrategy::LeastBids => sorted.sort_by_key(|r| r.bids()),
            SortStrategy::MostBids => sorted.sort_by_key(|r| Reverse(r.bids())),
            SortStrategy::HighestCurrentBid => sorted.sort_by_key(|r| Reverse(r.current_bid())),
            SortStrategy::LowestCurrentBid => sorted.sort_by_key(|r| r.current_bid()),
            SortStrategy::Alphabetical => {
                sorted.sort_by_cached_key(|r| r.artist_sort_key.to_lowercase())
            }
        }
        sorted
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make(id: &str, bids: Option<u32>, bid_cents: Option<i64>, artist: &str) -> ListingRecord {
        ListingRecord {
            bid_count: bids,
            current_bid_cents: bid_cents,
            artist_sort_key: artist.to_string(),
            ..ListingRecord::new(id)
        }
    }

    fn sample() -> Vec<ListingRecord> {
        vec![
            make("a", Some(3), Some(500), "warhol-andy"),
            make("b", None, None, "Basquiat-Jean-Michel"),
            make("c", Some(3), Some(9_000), "kusama-yayoi"),
            make("d", Some(1), Some(200), "abramovic-marina"),
        ]
    }

    fn ids(records: &[ListingRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn grid_keeps_arrival_order() {
        assert_eq!(ids(&SortStrategy::Grid.sort(&sample())), ["a", "b", "c", "d"]);
    }

    #[test]
    fn least_bids_treats_missing_as_zero_and_is_stable() {
        assert_eq!(ids(&SortStrategy::LeastBids.sort(&sample())), ["b", "d", "a", "c"]);
    }

    #[test]
    fn most_bids_is_stable_for_ties() {
        assert_eq!(ids(&SortStrategy::MostBids.sort(&sample())), ["a", "c", "d", "b"]);
    }

    #[test]
    fn current_bid_orderings() {
        assert_eq!(
            ids(&SortStrategy::HighestCurrentBid.sort(&sample())),
            ["c", "a", "d", "b"]
        );
        assert_eq!(
            ids(&SortStrategy::LowestCurrentBid.sort(&sample())),
            ["b", "d", "a", "c"]
        );
    }

    #[test]
    fn alphabetical_ignores_case() {
        assert_eq!(
            ids(&SortStrategy::Alphabetical.sort(&sample())),
            ["d", "b", "c", "a"]
        );
    }

    #[test]
    fn sort_does_not_touch_input() {
        let input = sample();
        let _ = SortStrategy::MostBids.sort(&input);
        assert_eq!(ids(&input), ["a", "b", "c", "d"]);
    }

    #[test]
    fn next_cycles_through_all_strategies() {
        let mut strategy = SortStrategy::default();
        for expected in SortStrategy::ALL.iter().skip(1) {
            strategy = strategy.next();
            assert_eq!(strategy, *expected);
        }
        assert_eq!(strategy.next(), SortStrategy::Grid);
    }

    #[test]
    fn names_match_switcher_labels() {
        let names: Vec<_> = SortStrategy::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            ["Grid", "Least Bids", "Most Bids", "Highest Bid", "Lowest Bid", "A–Z"]
        );
    }
}
