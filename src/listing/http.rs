//! HTTP listing fetcher.
//!
//! Requests `/api/v1/sale/{auction}/sale_artworks` one page at a time and
//! converts the sale-artwork JSON into [`ListingRecord`]s.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{ListingRecord, PageFetcher};
use crate::error::{SyncError, SyncResult};

/// Fetches listing pages from the auction API over HTTP.
pub struct HttpPageFetcher {
    client: Client,
    /// API root without a trailing slash, e.g. `https://api.artsy.net`.
    api_base: String,
}

impl HttpPageFetcher {
    /// Create a fetcher for `api_base` whose requests give up after
    /// `timeout`.
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn listings_url(&self, auction_id: &str) -> String {
        format!("{}/api/v1/sale/{auction_id}/sale_artworks", self.api_base)
    }

    /// Decode one page body.  Pure, so tests can skip the network.
    pub fn parse_page(body: &[u8], page: u32) -> SyncResult<Vec<ListingRecord>> {
        let raw: Vec<RawSaleArtwork> =
            serde_json::from_slice(body).map_err(|source| SyncError::Decode { page, source })?;
        Ok(raw.into_iter().map(ListingRecord::from).collect())
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch_page(
        &self,
        auction_id: &str,
        page: u32,
        page_size: u32,
    ) -> SyncResult<Vec<ListingRecord>> {
        let response = self
            .client
            .get(self.listings_url(auction_id))
            .query(&[("page", page), ("size", page_size)])
            .send()
            .await
            .map_err(|e| SyncError::PageFetch {
                page,
                diagnostic: e.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| SyncError::PageFetch {
            page,
            diagnostic: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(SyncError::PageFetch {
                page,
                diagnostic: server_diagnostic(status, &body),
            });
        }

        let records = Self::parse_page(&body, page)?;
        debug!(count = records.len(), "page received");
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawSaleArtwork {
    id: String,
    lot_label: Option<String>,
    bidder_positions_count: Option<u32>,
    opening_bid_cents: Option<i64>,
    reserve_status: Option<String>,
    highest_bid: Option<RawBid>,
    artwork: Option<RawArtwork>,
}

#[derive(Debug, Deserialize)]
struct RawBid {
    amount_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawArtwork {
    title: Option<String>,
    artist: Option<RawArtist>,
}

#[derive(Debug, Deserialize)]
struct RawArtist {
    name: Option<String>,
    sortable_id: Option<String>,
}

impl From<RawSaleArtwork> for ListingRecord {
    fn from(raw: RawSaleArtwork) -> Self {
        let artwork = raw.artwork;
        let title = artwork.as_ref().and_then(|a| a.title.clone());
        let artist = artwork.and_then(|a| a.artist);
        let artist_name = artist.as_ref().and_then(|a| a.name.clone());
        let artist_sort_key = artist.and_then(|a| a.sortable_id);

        ListingRecord {
            bid_count: raw.bidder_positions_count,
            current_bid_cents: raw.highest_bid.and_then(|b| b.amount_cents),
            artist_sort_key: artist_sort_key.unwrap_or_default(),
            artist_name: artist_name.unwrap_or_default(),
            title: title.unwrap_or_else(|| "(untitled)".to_string()),
            lot_label: raw.lot_label,
            opening_bid_cents: raw.opening_bid_cents,
            reserve_status: raw.reserve_status,
            ..ListingRecord::new(raw.id)
        }
    }
}

/// Error body the API sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ServerError {
    error: Option<String>,
    message: Option<String>,
    text: Option<String>,
}

/// Pull the server's own message out of an error body, falling back to the
/// status line.
fn server_diagnostic(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ServerError>(body)
        .ok()
        .and_then(|e| e.message.or(e.text).or(e.error))
        .unwrap_or_else(|| status.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
