//! Refresh scheduler
//!
//! One task owns both timers and the manual refresh channel:
//! - the analytics snapshot is fetched on start, on every analytics tick, and on demand
//! - the last-updated stamp is polled on its own, shorter period
//!
//! Fetches run one at a time. Requests that arrive while a fetch is in flight are
//! satisfied by that fetch rather than queued behind it, and a manual refetch
//! restarts the analytics timer. Dropping the [`AnalyticsFeed`] aborts the task,
//! including any request in flight.
//!
//! Every request is awaited inside the loop, so a slow snapshot fetch (up to the
//! API timeout) holds back the last-updated poll as well. Polls missed meanwhile
//! are skipped, not replayed; the next one runs once the fetch returns.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{AnalyticsSource, AnalyticsState, LastUpdatedAt, RefreshIntervals, FETCH_ERROR_FALLBACK};
use crate::timestamp_parser::TimestampParser;

pub struct RefreshScheduler {
    source: Arc<dyn AnalyticsSource>,
    intervals: RefreshIntervals,
    state_tx: watch::Sender<AnalyticsState>,
    last_updated_tx: watch::Sender<LastUpdatedAt>,
    refetch_rx: mpsc::Receiver<()>,
}

impl RefreshScheduler {
    /// Fetch the snapshot once and publish the outcome
    async fn fetch_analytics(&self) {
        debug!("Fetching analytics snapshot");
        self.state_tx.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        match self.source.latest_snapshot().await {
            Ok(snapshot) => {
                info!(pharmacy_id = %snapshot.pharmacy_id, "Analytics snapshot received");
                let snapshot = Arc::new(snapshot);
                self.state_tx.send_modify(|state| {
                    state.data = Some(snapshot);
                    state.loading = false;
                });
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch analytics");
                let message = e.message_or(FETCH_ERROR_FALLBACK);
                self.state_tx.send_modify(|state| {
                    state.error = Some(message);
                    state.loading = false;
                });
            }
        }
    }

    async fn poll_last_updated(&self) {
        match self.source.last_updated().await {
            Ok(stamp) => {
                let parsed = stamp.last_updated_at.as_deref().and_then(TimestampParser::parse_opt);
                if stamp.last_updated_at.is_some() && parsed.is_none() {
                    warn!(value = ?stamp.last_updated_at, "Unrecognised last-updated timestamp");
                }
                self.last_updated_tx.send_replace(parsed);
            }
            Err(e) => warn!(error = %e, "Failed to fetch last updated"),
        }
    }

    /// Discard refresh requests that the fetch that just finished already covered
    fn drain_refetch_requests(&mut self) {
        while self.refetch_rx.try_recv().is_ok() {}
    }

    async fn run(mut self) {
        let mut analytics_tick = interval(self.intervals.analytics);
        analytics_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_updated_tick = interval(self.intervals.last_updated);
        last_updated_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            analytics_secs = self.intervals.analytics.as_secs(),
            last_updated_secs = self.intervals.last_updated.as_secs(),
            "Refresh scheduler started"
        );

        loop {
            tokio::select! {
                _ = analytics_tick.tick() => {
                    self.fetch_analytics().await;
                    self.drain_refetch_requests();
                }
                request = self.refetch_rx.recv() => {
                    if request.is_none() {
                        debug!("Refetch channel closed, stopping scheduler");
                        break;
                    }
                    self.fetch_analytics().await;
                    self.drain_refetch_requests();
                    analytics_tick.reset();
                }
                _ = last_updated_tick.tick() => {
                    self.poll_last_updated().await;
                }
            }
        }
    }
}

/// Handle to a running scheduler
pub struct AnalyticsFeed {
    state_rx: watch::Receiver<AnalyticsState>,
    last_updated_rx: watch::Receiver<LastUpdatedAt>,
    refetch_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl AnalyticsFeed {
    /// Start the scheduler on the current tokio runtime
    pub fn spawn(source: Arc<dyn AnalyticsSource>, intervals: RefreshIntervals) -> Self {
        let (state_tx, state_rx) = watch::channel(AnalyticsState::default());
        let (last_updated_tx, last_updated_rx) = watch::channel(None);
        // Capacity 1: a pending request absorbs any further ones
        let (refetch_tx, refetch_rx) = mpsc::channel(1);

        let scheduler = RefreshScheduler {
            source,
            intervals,
            state_tx,
            last_updated_tx,
            refetch_rx,
        };
        let task = tokio::spawn(scheduler.run());

        Self {
            state_rx,
            last_updated_rx,
            refetch_tx,
            task,
        }
    }

    pub fn state(&self) -> AnalyticsState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalyticsState> {
        self.state_rx.clone()
    }

    pub fn last_updated(&self) -> LastUpdatedAt {
        *self.last_updated_rx.borrow()
    }

    pub fn subscribe_last_updated(&self) -> watch::Receiver<LastUpdatedAt> {
        self.last_updated_rx.clone()
    }

    /// Ask for a fresh snapshot; returns immediately
    pub fn refetch(&self) {
        if self.refetch_tx.try_send(()).is_err() {
            debug!("Refetch already pending");
        }
    }

    /// Stop the timers and abandon any request in flight
    pub fn shutdown(self) {
        // Drop does the work
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AnalyticsFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}
