//! Recurring listing sync.
//!
//! [`SyncEngine`] owns the held listings and a background task that fetches
//! every page of an auction on a fixed interval and reconciles the result
//! into them.  Progress is reported over an unbounded channel of
//! [`SyncEvent`]s, one per completed cycle.
//!
//! ## Scheduling
//!
//! The first tick fires as soon as the engine starts, then one per
//! interval.  At most one paginated fetch is ever in flight: a tick that
//! fires while the previous fetch is still pending is skipped, and the
//! timer keeps its schedule.  Every fetch that resolves is reconciled
//! exactly once.
//!
//! Stopping (or dropping) the engine cancels the loop.  A fetch that was
//! pending at that moment is dropped with it, so its result never reaches
//! the held listings or the event channel.

use std::future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{SyncError, SyncResult};
use crate::listing::{ListingRecord, PageFetcher};
use crate::paginate;
use crate::reconcile::{HeldCollection, ListingHandle, Reconciliation, ReplaceReason};
use crate::sort::SortStrategy;

/// How a successful cycle changed the held listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// `updated` existing records were refreshed in place.
    Merged { updated: usize },
    /// The held listings were swapped for the fetched ones.
    Replaced { reason: ReplaceReason },
}

/// Emitted once per completed sync cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Every page was fetched and reconciled.
    Synced {
        count: usize,
        outcome: SyncOutcome,
        /// Generation of the held listings after this cycle.
        generation: u64,
        at: DateTime<Utc>,
    },
    /// A page failed; the held listings are unchanged.
    Failed {
        diagnostic: String,
        at: DateTime<Utc>,
    },
}

type FetchFuture = BoxFuture<'static, SyncResult<Vec<ListingRecord>>>;

/// Everything the background loop needs, moved into the task.
struct SyncLoopContext {
    fetcher: Arc<dyn PageFetcher>,
    held: Arc<RwLock<HeldCollection>>,
    events: UnboundedSender<SyncEvent>,
    auction_id: Arc<str>,
    page_size: u32,
    interval: Duration,
}

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Keeps a held listing collection in sync with a paginated remote source.
pub struct SyncEngine {
    fetcher: Arc<dyn PageFetcher>,
    held: Arc<RwLock<HeldCollection>>,
    events: UnboundedSender<SyncEvent>,
    running: Option<Running>,
}

impl SyncEngine {
    /// Create an idle engine around `fetcher`.
    ///
    /// Returns the receiving end of the event channel alongside it.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> (Self, UnboundedReceiver<SyncEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let engine = Self {
            fetcher,
            held: Arc::new(RwLock::new(HeldCollection::new())),
            events,
            running: None,
        };
        (engine, rx)
    }

    /// Start syncing `auction_id`, immediately and then every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`SyncError::AlreadyRunning`] if a loop is active,
    /// [`SyncError::InvalidPageSize`] / [`SyncError::InvalidInterval`] for
    /// zero arguments.
    #[instrument(skip(self))]
    pub fn start(&mut self, auction_id: &str, page_size: u32, interval: Duration) -> SyncResult<()> {
        if self.is_running() {
            return Err(SyncError::AlreadyRunning);
        }
        if page_size == 0 {
            return Err(SyncError::InvalidPageSize);
        }
        if interval.is_zero() {
            return Err(SyncError::InvalidInterval);
        }

        let context = SyncLoopContext {
            fetcher: Arc::clone(&self.fetcher),
            held: Arc::clone(&self.held),
            events: self.events.clone(),
            auction_id: Arc::from(auction_id),
            page_size,
            interval,
        };
        let cancel = CancellationToken::new();
        let task = tokio::spawn(sync_loop(context, cancel.clone()));

        self.running = Some(Running { cancel, task });
        info!("sync engine started");
        Ok(())
    }

    /// Stop syncing and wait for the background task to exit.
    ///
    /// A fetch in flight at this point is discarded.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotRunning`] if the engine was never started or is
    /// already stopped.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SyncResult<()> {
        let Some(running) = self.running.take() else {
            return Err(SyncError::NotRunning);
        };

        running.cancel.cancel();
        running
            .task
            .await
            .map_err(|e| SyncError::TaskJoin(e.to_string()))?;

        info!("sync engine stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Snapshot of the held listings in their held order.
    pub fn current_listings(&self) -> Vec<ListingRecord> {
        self.read().records().to_vec()
    }

    /// Snapshot of the held listings passed through `strategy`.
    pub fn sorted_listings(&self, strategy: SortStrategy) -> Vec<ListingRecord> {
        strategy.sort(self.read().records())
    }

    /// Handle to the held listing with this id, valid until the next
    /// wholesale replace.
    pub fn handle(&self, id: &str) -> Option<ListingHandle> {
        self.read().find(id)
    }

    /// Current state of the listing behind `handle`, or `None` once the
    /// held listings were replaced.
    pub fn get(&self, handle: ListingHandle) -> Option<ListingRecord> {
        self.read().get(handle).cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, HeldCollection> {
        self.held.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.cancel.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Background loop
// ---------------------------------------------------------------------------

async fn sync_loop(context: SyncLoopContext, cancel: CancellationToken) {
    let mut ticker = time::interval(context.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight: Option<FetchFuture> = None;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                if in_flight.is_some() {
                    debug!("discarding in-flight fetch");
                }
                debug!("sync loop cancelled");
                break;
            }
            result = resolve(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                context.complete(result);
            }
            _ = ticker.tick() => {
                if in_flight.is_some() {
                    debug!("previous fetch still pending, skipping tick");
                } else {
                    debug!(at = %Utc::now(), auction = %context.auction_id, "syncing");
                    in_flight = Some(context.fetch());
                }
            }
        }
    }
}

/// Await the pending fetch, or never resolve if there is none.
async fn resolve(in_flight: &mut Option<FetchFuture>) -> SyncResult<Vec<ListingRecord>> {
    match in_flight {
        Some(fetch) => fetch.await,
        None => future::pending().await,
    }
}

impl SyncLoopContext {
    fn fetch(&self) -> FetchFuture {
        let fetcher = Arc::clone(&self.fetcher);
        let auction_id = Arc::clone(&self.auction_id);
        let page_size = self.page_size;
        async move { paginate::fetch_all(fetcher.as_ref(), &auction_id, page_size).await }.boxed()
    }

    fn complete(&self, result: SyncResult<Vec<ListingRecord>>) {
        let event = match result {
            Ok(listings) => {
                let count = listings.len();
                let (reconciliation, generation) = {
                    let mut held = self.write();
                    let reconciliation = held.reconcile(listings);
                    (reconciliation, held.generation())
                };
                let outcome = match reconciliation {
                    Reconciliation::Merged { updated } => SyncOutcome::Merged { updated },
                    Reconciliation::Replaced { reason, displaced } => {
                        debug!(%reason, displaced = displaced.len(), "dropping displaced listings");
                        SyncOutcome::Replaced { reason }
                    }
                };
                info!(count, generation, ?outcome, "sync complete");
                SyncEvent::Synced {
                    count,
                    outcome,
                    generation,
                    at: Utc::now(),
                }
            }
            Err(e) => {
                warn!(error = %e, "sync failed, keeping current listings");
                SyncEvent::Failed {
                    diagnostic: e.diagnostic(),
                    at: Utc::now(),
                }
            }
        };

        // Nobody listening is fine; the held listings are still readable.
        let _ = self.events.send(event);
    }

    fn write(&self) -> RwLockWriteGuard<'_, HeldCollection> {
        self.held.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
