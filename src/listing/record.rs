//! The listing record shared by the fetcher, the reconciler and the UI.
//!
//! `ListingRecord` is one lot in an auction.  Its `id` is the only identity
//! key; every other field may change between syncs.  The reconciler relies
//! on that split: it matches records by id and then copies the remaining
//! fields across with [`ListingRecord::update_with`].

use std::cmp::Ordering;

/// A single auction listing, normalised from the remote sale-artwork shape.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ListingRecord {
    /// Remote identifier.  Compared case-insensitively; never changes.
    pub id: String,

    /// Number of bids placed so far.  `None` orders as zero.
    pub bid_count: Option<u32>,

    /// Highest bid in cents.  `None` orders as zero.
    pub current_bid_cents: Option<i64>,

    /// Key used for the alphabetical ordering (e.g. `"andy-warhol"`).
    pub artist_sort_key: String,

    /// Display name of the artist.
    pub artist_name: String,

    /// Artwork title.
    pub title: String,

    /// Lot number as printed in the catalogue, if any.
    pub lot_label: Option<String>,

    /// Opening bid in cents.
    pub opening_bid_cents: Option<i64>,

    /// Reserve state as reported by the server (`"no_reserve"`,
    /// `"reserve_met"`, ...).
    pub reserve_status: Option<String>,

    /// Local mutation counter.  Bumped each time a sync copies fresh values
    /// into this record in place, so observers can tell an updated record
    /// from a replaced one.
    pub revision: u64,
}

impl ListingRecord {
    /// Minimal constructor; the remaining fields start empty.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Lower-cased id, the key used for id ordering.
    pub fn id_key(&self) -> String {
        self.id.to_lowercase()
    }

    /// Case-insensitive id comparison.
    pub fn cmp_id(&self, other: &Self) -> Ordering {
        self.id_key().cmp(&other.id_key())
    }

    pub fn same_id(&self, other: &Self) -> bool {
        self.cmp_id(other) == Ordering::Equal
    }

    /// Bid count with the missing value treated as zero.
    pub fn bids(&self) -> u32 {
        self.bid_count.unwrap_or(0)
    }

    /// Current bid with the missing value treated as zero.
    pub fn current_bid(&self) -> i64 {
        self.current_bid_cents.unwrap_or(0)
    }

    /// Copy every mutable field from `fresh` into `self`, keeping `id`.
    ///
    /// `self` stays the same value in the same slot; only its contents move
    /// forward and `revision` is incremented.
    pub fn update_with(&mut self, fresh: &ListingRecord) {
        self.bid_count = fresh.bid_count;
        self.current_bid_cents = fresh.current_bid_cents;
        self.artist_sort_key.clone_from(&fresh.artist_sort_key);
        self.artist_name.clone_from(&fresh.artist_name);
        self.title.clone_from(&fresh.title);
        self.lot_label.clone_from(&fresh.lot_label);
        self.opening_bid_cents = fresh.opening_bid_cents;
        self.reserve_status.clone_from(&fresh.reserve_status);
        self.revision += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
