//! Error type for the sync engine.

use thiserror::Error;

/// Everything that can go wrong while fetching or scheduling.
///
/// None of these are fatal: a failed cycle leaves the held listings as they
/// were and the next tick tries again.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A page request failed at the transport or server level.
    #[error("page {page} failed: {diagnostic}")]
    PageFetch { page: u32, diagnostic: String },

    /// The server answered but the body was not a listing array.
    #[error("page {page} could not be decoded: {source}")]
    Decode {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be built.
    #[error("http client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A zero page size would never produce a short page.
    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error("sync interval must be non-zero")]
    InvalidInterval,

    /// `start` was called while a sync loop is already running.
    #[error("sync engine already running")]
    AlreadyRunning,

    /// `stop` was called with no sync loop running.
    #[error("sync engine not running")]
    NotRunning,

    /// The background sync task panicked.
    #[error("sync task join failed: {0}")]
    TaskJoin(String),
}

impl SyncError {
    /// Short human-readable diagnostic for the event channel / status bar.
    pub fn diagnostic(&self) -> String {
        match self {
            SyncError::PageFetch { diagnostic, .. } => diagnostic.clone(),
            other => other.to_string(),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
