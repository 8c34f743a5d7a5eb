//! Identity-preserving reconciliation of fetched listings into the held set.
//!
//! When a fresh fetch has the same size as what we already hold it is most
//! likely the same lots with new bid and price values.  In that case the
//! held records are updated field by field where they sit, so their indices
//! (and any [`ListingHandle`] pointing at them) stay valid.  Anything else is
//! a wholesale replace that bumps the collection's generation.

use std::fmt;
use std::mem;

use tracing::{debug, info};

use crate::listing::ListingRecord;

/// The listings currently exposed to observers.
///
/// `generation` changes only on a wholesale replace.  An in-place merge
/// leaves it alone and bumps each updated record's `revision` instead.
#[derive(Debug, Default)]
pub struct HeldCollection {
    records: Vec<ListingRecord>,
    generation: u64,
}

/// Stable reference to a held record: valid for as long as the collection's
/// generation does not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingHandle {
    pub generation: u64,
    pub index: usize,
}

/// Why a reconcile replaced the held records instead of merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceReason {
    /// The fetched collection has a different length.
    CountChanged { held: usize, fetched: usize },
    /// Same length, but the id-sorted walk diverged at `index`.
    IdMismatch { index: usize },
}

impl fmt::Display for ReplaceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceReason::CountChanged { held, fetched } => {
                write!(f, "count changed from {held} to {fetched}")
            }
            ReplaceReason::IdMismatch { index } => write!(f, "ids diverged at position {index}"),
        }
    }
}

/// What a call to [`HeldCollection::reconcile`] did.
#[derive(Debug)]
pub enum Reconciliation {
    /// Every held record was updated in place.
    Merged { updated: usize },
    /// The held records were swapped out; `displaced` are the old ones,
    /// untouched.
    Replaced {
        reason: ReplaceReason,
        displaced: Vec<ListingRecord>,
    },
}

impl HeldCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Handle to the record at `index`, if there is one.
    pub fn handle(&self, index: usize) -> Option<ListingHandle> {
        (index < self.records.len()).then_some(ListingHandle {
            generation: self.generation,
            index,
        })
    }

    /// Handle to the record whose id matches `id` case-insensitively.
    pub fn find(&self, id: &str) -> Option<ListingHandle> {
        let key = id.to_lowercase();
        let index = self.records.iter().position(|r| r.id_key() == key)?;
        self.handle(index)
    }

    /// Resolve a handle.  Returns `None` once the collection was replaced.
    pub fn get(&self, handle: ListingHandle) -> Option<&ListingRecord> {
        if handle.generation != self.generation {
            return None;
        }
        self.records.get(handle.index)
    }

    /// Merge `fetched` into the held records, or replace them.
    ///
    /// Equal counts: both sides are ordered by case-insensitive id and
    /// walked in lock-step.  If every position pairs up, each held record
    /// takes the fields of its fetched twin and keeps its place.  A single
    /// mismatch abandons the merge before anything is written.
    pub fn reconcile(&mut self, fetched: Vec<ListingRecord>) -> Reconciliation {
        if fetched.len() != self.records.len() {
            let reason = ReplaceReason::CountChanged {
                held: self.records.len(),
                fetched: fetched.len(),
            };
            debug!(%reason, "replacing held listings");
            return self.replace(fetched, reason);
        }

        let held_order = id_order(&self.records);
        let fetched_order = id_order(&fetched);

        let mismatch = held_order
            .iter()
            .zip(&fetched_order)
            .position(|(&h, &f)| !self.records[h].same_id(&fetched[f]));

        if let Some(index) = mismatch {
            let reason = ReplaceReason::IdMismatch { index };
            info!(
                index,
                held_id = %self.records[held_order[index]].id,
                fetched_id = %fetched[fetched_order[index]].id,
                "listing ids diverged, replacing held listings"
            );
            return self.replace(fetched, reason);
        }

        for (&h, &f) in held_order.iter().zip(&fetched_order) {
            self.records[h].update_with(&fetched[f]);
        }

        debug!(updated = self.records.len(), "merged listings in place");
        Reconciliation::Merged {
            updated: self.records.len(),
        }
    }

    fn replace(&mut self, fetched: Vec<ListingRecord>, reason: ReplaceReason) -> Reconciliation {
        self.generation += 1;
        Reconciliation::Replaced {
            reason,
            displaced: mem::replace(&mut self.records, fetched),
        }
    }
}

/// Indices of `records` in case-insensitive ascending id order.
///
/// The sort is stable, so duplicate ids keep their relative positions.
fn id_order(records: &[ListingRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_cached_key(|&i| records[i].id_key());
    order
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, bids: u32) -> ListingRecord {
        ListingRecord {
            bid_count: Some(bids),
            ..ListingRecord::new(id)
        }
    }

    fn held(records: Vec<ListingRecord>) -> HeldCollection {
        let mut collection = HeldCollection::new();
        collection.reconcile(records);
        collection
    }

    fn ids(records: &[ListingRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn starts_empty_at_generation_zero() {
        let collection = HeldCollection::new();
        assert!(collection.records().is_empty());
        assert_eq!(collection.generation(), 0);
    }

    #[test]
    fn count_change_replaces_with_fetched_order() {
        let originals: Vec<_> = ["a", "b", "c", "d", "e"].iter().map(|id| listing(id, 1)).collect();
        let mut collection = held(originals.clone());
        let generation = collection.generation();

        let fetched: Vec<_> =
            ["f", "e", "d", "c", "b", "a"].iter().map(|id| listing(id, 7)).collect();
        let outcome = collection.reconcile(fetched.clone());

        assert_eq!(collection.records(), fetched.as_slice());
        assert_eq!(collection.generation(), generation + 1);
        match outcome {
            Reconciliation::Replaced { reason, displaced } => {
                assert_eq!(reason, ReplaceReason::CountChanged { held: 5, fetched: 6 });
                assert_eq!(displaced, originals, "old records must not be mutated");
            }
            other => panic!("expected replace, got {other:?}"),
        }
    }

    #[test]
    fn same_ids_merge_in_place_keeping_order() {
        let mut collection = held(vec![listing("A", 1), listing("B", 2)]);
        let generation = collection.generation();
        let handle_a = collection.handle(0).unwrap();

        let outcome = collection.reconcile(vec![listing("B", 5), listing("A", 9)]);

        assert!(matches!(outcome, Reconciliation::Merged { updated: 2 }));
        assert_eq!(ids(collection.records()), ["A", "B"]);
        assert_eq!(collection.records()[0].bid_count, Some(9));
        assert_eq!(collection.records()[1].bid_count, Some(5));
        assert_eq!(collection.generation(), generation);
        assert!(collection.records().iter().all(|r| r.revision == 1));

        let a = collection.get(handle_a).expect("handle survives a merge");
        assert_eq!(a.id, "A");
        assert_eq!(a.bid_count, Some(9));
    }

    #[test]
    fn merge_matches_ids_case_insensitively() {
        let mut collection = held(vec![listing("lot-a", 1), listing("Lot-B", 1)]);

        let outcome = collection.reconcile(vec![listing("LOT-B", 3), listing("LOT-A", 4)]);

        assert!(matches!(outcome, Reconciliation::Merged { .. }));
        assert_eq!(ids(collection.records()), ["lot-a", "Lot-B"], "held ids are kept");
        assert_eq!(collection.records()[0].bid_count, Some(4));
        assert_eq!(collection.records()[1].bid_count, Some(3));
    }

    #[test]
    fn id_mismatch_falls_back_to_replace() {
        let mut collection = held(vec![listing("A", 1), listing("B", 1)]);
        let handle = collection.handle(1).unwrap();

        let fetched = vec![listing("A", 2), listing("C", 2)];
        let outcome = collection.reconcile(fetched.clone());

        assert_eq!(collection.records(), fetched.as_slice());
        assert!(collection.get(handle).is_none(), "replace invalidates handles");
        match outcome {
            Reconciliation::Replaced { reason, displaced } => {
                assert_eq!(reason, ReplaceReason::IdMismatch { index: 1 });
                assert_eq!(displaced[0].bid_count, Some(1), "no partial merge before abort");
                assert_eq!(displaced[0].revision, 0);
            }
            other => panic!("expected replace, got {other:?}"),
        }
    }

    #[test]
    fn empty_against_empty_is_a_trivial_merge() {
        let mut collection = HeldCollection::new();
        let outcome = collection.reconcile(Vec::new());
        assert!(matches!(outcome, Reconciliation::Merged { updated: 0 }));
        assert_eq!(collection.generation(), 0);
    }

    #[test]
    fn repeated_merges_keep_bumping_revision() {
        let mut collection = held(vec![listing("x", 0)]);
        for bids in 1..=3 {
            collection.reconcile(vec![listing("x", bids)]);
        }
        assert_eq!(collection.records()[0].revision, 3);
        assert_eq!(collection.records()[0].bid_count, Some(3));
    }

    #[test]
    fn find_resolves_ids_case_insensitively() {
        let mut collection = held(vec![listing("Lot-A", 1), listing("lot-b", 2)]);

        let handle = collection.find("LOT-B").expect("id is held");
        assert_eq!(handle.index, 1);
        assert!(collection.find("lot-c").is_none());

        collection.reconcile(vec![listing("lot-a", 4), listing("LOT-B", 6)]);
        assert_eq!(collection.get(handle).and_then(|r| r.bid_count), Some(6));
    }

    #[test]
    fn replace_reasons_read_as_prose() {
        let count = ReplaceReason::CountChanged { held: 5, fetched: 6 };
        assert_eq!(count.to_string(), "count changed from 5 to 6");
        assert_eq!(
            ReplaceReason::IdMismatch { index: 1 }.to_string(),
            "ids diverged at position 1"
        );
    }

    #[test]
    fn handle_out_of_range_is_none() {
        let collection = held(vec![listing("x", 0)]);
        assert!(collection.handle(1).is_none());
    }
}
