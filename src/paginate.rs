//! Exhaustive pagination.
//!
//! Pages are requested strictly in order: page N+1 is only asked for once
//! page N came back full.  The first short page (including an empty one)
//! ends the walk; no total-count header is consulted.

use tracing::{debug, instrument};

use crate::error::{SyncError, SyncResult};
use crate::listing::{ListingRecord, PageFetcher};

/// Fetch every page of `auction_id` and concatenate them in page order.
///
/// Any failed page fails the whole call and the pages already fetched are
/// dropped, so callers never see a silently truncated collection.
#[instrument(skip(fetcher), level = "debug")]
pub async fn fetch_all(
    fetcher: &dyn PageFetcher,
    auction_id: &str,
    page_size: u32,
) -> SyncResult<Vec<ListingRecord>> {
    if page_size == 0 {
        return Err(SyncError::InvalidPageSize);
    }

    let mut listings = Vec::new();
    let mut page = 1;

    loop {
        let batch = fetcher.fetch_page(auction_id, page, page_size).await?;
        let full = batch.len() >= page_size as usize;
        listings.extend(batch);

        if !full {
            break;
        }
        page += 1;
    }

    debug!(pages = page, count = listings.len(), "pagination complete");
    Ok(listings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
