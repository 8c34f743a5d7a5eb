//! Command-line / environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Live auction listings for the terminal.
#[derive(Debug, Clone, Parser)]
#[command(name = "kiosk-listings", version, about)]
pub struct Config {
    /// Auction (sale) to follow.
    #[arg(long, env = "KIOSK_AUCTION_ID")]
    pub auction_id: String,

    /// API root the listings are fetched from.
    #[arg(long, env = "KIOSK_API_BASE", default_value = "https://api.artsy.net")]
    pub api_base: String,

    /// Listings requested per page.
    #[arg(
        long,
        env = "KIOSK_PAGE_SIZE",
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub page_size: u32,

    /// Seconds between syncs.
    #[arg(
        long,
        env = "KIOSK_SYNC_INTERVAL_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sync_interval_secs: u64,

    /// Per-request timeout in seconds.
    #[arg(
        long,
        env = "KIOSK_REQUEST_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub request_timeout_secs: u64,

    /// Write logs to this file (the TUI otherwise logs nothing).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Run without the TUI, logging each sync to stderr.
    #[arg(long)]
    pub headless: bool,
}

impl Config {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
