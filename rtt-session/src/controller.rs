//! Ranging Session Controller
//!
//! Owns the set of concurrent measurement subscriptions for a session:
//! - One worker task per target drives the external [`RangingSource`],
//!   restarting the exchange after every batch and backing off on failure
//! - Batches are marshaled over a bounded mpsc channel to a single
//!   consumer task, the only writer of the stats tracker and the log
//! - After each folded batch a [`SessionEvent::Summary`] is broadcast
//!
//! Batch policy: an empty batch is dropped with a debug notice; a batch
//! containing any `Fail`-status element is logged raw but not folded
//! (whole-batch drop, no partial statistics). `stop()` aborts every task
//! before returning; tracker state and the log file survive until the
//! next session or an explicit `reset()`.

#![forbid(unsafe_code)]

use std::sync::Arc;

use chrono::Local;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use rtt_core::{Measurement, PeerId, RangingConfig, SessionSummary, StatsTracker};
use rtt_log::{LogRecord, MeasurementLog};

use crate::events::{EventBus, SessionEvent};
use crate::retry::backoff_policy;
use crate::source::RangingSource;

/// Manages ranging subscriptions and aggregates their measurements.
pub struct RangingSessionController<S: RangingSource> {
    source: Arc<S>,
    config: RangingConfig,
    tracker: Arc<RwLock<StatsTracker>>,
    events: EventBus,
    log: Option<Arc<MeasurementLog>>,
    batch_tx: Option<mpsc::Sender<Vec<Measurement>>>,
    workers: Vec<JoinHandle<()>>,
    consumer: Option<JoinHandle<()>>,
}

impl<S: RangingSource> RangingSessionController<S> {
    pub fn new(source: S, config: RangingConfig) -> Self {
        let events = EventBus::new(config.event_buffer);
        Self {
            source: Arc::new(source),
            config,
            tracker: Arc::new(RwLock::new(StatsTracker::new())),
            events,
            log: None,
            batch_tx: None,
            workers: Vec::new(),
            consumer: None,
        }
    }

    /// Subscribe to summary and transport-error events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.batch_tx.is_some()
    }

    /// Path of the current session's log file, once a session started.
    pub fn log_path(&self) -> Option<std::path::PathBuf> {
        self.log.as_ref().map(|l| l.path().to_path_buf())
    }

    /// Open one subscription per target.
    ///
    /// The first call of a session creates the measurement log (named
    /// after this instant) and the consumer task. Calling `start` while
    /// already running adds subscriptions; it does not clear existing
    /// statistics. Accumulation across starts is documented behavior,
    /// cleared only via [`reset`](Self::reset).
    pub fn start(&mut self, targets: impl IntoIterator<Item = PeerId>) {
        if self.batch_tx.is_none() {
            let log = Arc::new(MeasurementLog::new(
                &self.config.log_dir,
                &self.config.device_suffix,
                Local::now(),
            ));
            let (tx, rx) = mpsc::channel(self.config.batch_buffer);
            let consumer = tokio::spawn(consume_batches(
                rx,
                Arc::clone(&self.tracker),
                Arc::clone(&log),
                self.events.clone(),
            ));
            info!(log_file = %log.path().display(), "ranging session started");
            self.log = Some(log);
            self.batch_tx = Some(tx);
            self.consumer = Some(consumer);
        }

        let Some(tx) = self.batch_tx.clone() else { return };
        for target in targets {
            let worker = tokio::spawn(run_subscription(
                Arc::clone(&self.source),
                target,
                tx.clone(),
                self.events.clone(),
                self.config.retry_base_ms,
                self.config.retry_max_ms,
            ));
            self.workers.push(worker);
            info!(%target, "ranging subscription opened");
        }
    }

    /// Cancel every subscription synchronously. No further summary
    /// updates are delivered after this returns; per-peer statistics and
    /// the log file on disk are left untouched.
    pub fn stop(&mut self) {
        for worker in self.workers.drain(..) {
            worker.abort();
        }
        if let Some(consumer) = self.consumer.take() {
            consumer.abort();
        }
        self.batch_tx = None;
        info!("ranging session stopped");
    }

    /// Snapshot of the current per-peer statistics.
    pub async fn summary(&self) -> SessionSummary {
        self.tracker.read().await.summarize()
    }

    /// Clear all accumulated per-peer statistics.
    pub async fn reset(&self) {
        self.tracker.write().await.reset();
        info!("ranging statistics reset");
    }
}

/// Per-target subscription loop: one ranging exchange per iteration,
/// immediate restart on completion, backoff with jitter on failure.
async fn run_subscription<S: RangingSource>(
    source: Arc<S>,
    target: PeerId,
    tx: mpsc::Sender<Vec<Measurement>>,
    events: EventBus,
    retry_base_ms: u64,
    retry_max_ms: u64,
) {
    let mut attempt: u32 = 0;
    loop {
        match source.range(target).await {
            Ok(batch) => {
                attempt = 0;
                if tx.send(batch).await.is_err() {
                    // Consumer is gone; the session ended.
                    break;
                }
            }
            Err(e) => {
                warn!(%target, error = %e, "ranging exchange failed, re-subscribing");
                events.publish(SessionEvent::TransportError {
                    peer: target,
                    message: e.to_string(),
                });
                let delay = backoff_policy::exponential_with_jitter(attempt, retry_base_ms, retry_max_ms);
                attempt = attempt.saturating_add(1);
                tokio::time::sleep(delay).await;
            }
        }
    }
    debug!(%target, "ranging subscription closed");
}

/// Single-writer consumption loop. Processing of one batch (log, then
/// integrity gate, then fold, then summarize) is atomic with respect to
/// the tracker: no other task mutates it.
async fn consume_batches(
    mut rx: mpsc::Receiver<Vec<Measurement>>,
    tracker: Arc<RwLock<StatsTracker>>,
    log: Arc<MeasurementLog>,
    events: EventBus,
) {
    while let Some(batch) = rx.recv().await {
        if batch.is_empty() {
            debug!("empty ranging batch received");
            continue;
        }

        // Raw audit trail first: every attempted measurement is logged,
        // including failed ones, before any integrity decision.
        for m in &batch {
            log.append_best_effort(&LogRecord::from_measurement(m));
        }

        if batch.iter().any(Measurement::is_fail) {
            debug!(batch_len = batch.len(), "batch contains failed measurement, dropping");
            continue;
        }

        let summary = {
            let mut tracker = tracker.write().await;
            for m in &batch {
                tracker.observe(m);
            }
            tracker.summarize()
        };
        events.publish(SessionEvent::Summary(summary));
    }
    debug!("batch consumer finished");
}
