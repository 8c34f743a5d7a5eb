//! Listing source abstraction layer.
//!
//! This module defines the [`PageFetcher`] trait and the common
//! [`ListingRecord`] type.  The HTTP implementation lives in [`http`].
//!
//! ## For contributors — adding a new fetcher
//!
//! 1. Create a new file in this directory.
//! 2. Define a struct holding the fetcher's configuration and implement
//!    [`PageFetcher`] for it.
//! 3. Re-export it below and hand an `Arc` of it to
//!    [`SyncEngine::new`](crate::engine::SyncEngine::new).
//!
//! Pagination, reconciliation and sorting are fetcher-agnostic.

pub mod http;
mod record;

pub use http::HttpPageFetcher;
pub use record::ListingRecord;

use async_trait::async_trait;

use crate::error::SyncResult;

/// Fetches a single page of listings for an auction.
///
/// The paginator calls [`fetch_page`](PageFetcher::fetch_page) with page
/// indices starting at 1 and never issues two calls for the same cycle at
/// once.  Retry and backoff, if any, belong to the implementation.
///
/// ## Implementing a new fetcher
///
/// ```ignore
/// pub struct FixtureFetcher { pages: Vec<Vec<ListingRecord>> }
///
/// #[async_trait]
/// impl PageFetcher for FixtureFetcher {
///     async fn fetch_page(&self, _auction_id: &str, page: u32, _page_size: u32)
///         -> SyncResult<Vec<ListingRecord>>
///     {
///         Ok(self.pages.get(page as usize - 1).cloned().unwrap_or_default())
///     }
/// }
/// ```
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Return at most `page_size` records for page `page` (1-based).
    ///
    /// Failures carry the server's diagnostic where one is available.
    async fn fetch_page(
        &self,
        auction_id: &str,
        page: u32,
        page_size: u32,
    ) -> SyncResult<Vec<ListingRecord>>;
}
