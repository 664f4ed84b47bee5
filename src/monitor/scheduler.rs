//! Per-category polling with skip-if-busy semantics.
//!
//! Every registered category runs in its own task with its own interval.
//! A fetch in progress is kept as a pending future in that task and raced
//! against the next tick, so a tick that lands while the fetch is still
//! outstanding is seen and dropped instead of queued. A slow or hung
//! provider only delays its own category.

use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{MonitorError, Result};
use crate::metrics::{MetricCategory, MetricProvider, MetricValue, PollPolicy};
use crate::monitor::aggregator::SnapshotAggregator;
use crate::monitor::notifier::ThresholdNotifier;

struct Registration {
    policy: PollPolicy,
    provider: Arc<dyn MetricProvider>,
}

/// Owns one recurring timer per category.
pub struct SourceScheduler {
    aggregator: Arc<SnapshotAggregator>,
    notifier: Arc<ThresholdNotifier>,
    registrations: BTreeMap<MetricCategory, Registration>,
    shutdown_tx: Option<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

impl SourceScheduler {
    pub fn new(aggregator: Arc<SnapshotAggregator>, notifier: Arc<ThresholdNotifier>) -> Self {
        Self {
            aggregator,
            notifier,
            registrations: BTreeMap::new(),
            shutdown_tx: None,
            tasks: Vec::new(),
        }
    }

    /// Install a recurring fetch for a category.
    pub fn register(
        &mut self,
        category: MetricCategory,
        interval: Duration,
        provider: Arc<dyn MetricProvider>,
    ) -> Result<()> {
        if self.is_running() {
            return Err(MonitorError::scheduler_error(format!(
                "cannot register {} while running",
                category
            )));
        }
        if interval.is_zero() {
            return Err(MonitorError::scheduler_error(format!(
                "{} interval must be positive",
                category
            )));
        }
        if self.registrations.contains_key(&category) {
            return Err(MonitorError::scheduler_error(format!(
                "{} is already registered",
                category
            )));
        }

        self.registrations.insert(
            category,
            Registration {
                policy: PollPolicy::new(interval),
                provider,
            },
        );
        Ok(())
    }

    pub fn registered(&self) -> impl Iterator<Item = (MetricCategory, PollPolicy)> + '_ {
        self.registrations.iter().map(|(c, r)| (*c, r.policy))
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    /// Start every registered timer. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(MonitorError::scheduler_error("scheduler already started"));
        }
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            MonitorError::scheduler_error(format!("no async runtime to drive timers: {}", e))
        })?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        for (category, registration) in &self.registrations {
            let poller = CategoryPoller {
                category: *category,
                policy: registration.policy,
                provider: Arc::clone(&registration.provider),
                aggregator: Arc::clone(&self.aggregator),
                notifier: Arc::clone(&self.notifier),
            };
            self.tasks.push(handle.spawn(poller.run(shutdown_rx.clone())));
        }
        self.shutdown_tx = Some(shutdown_tx);

        info!("Started polling {} metric categories", self.registrations.len());
        Ok(())
    }

    /// Cancel every timer and wait for the category tasks to exit.
    ///
    /// Pending fetches are abandoned and their results discarded; once this
    /// returns, no task touches the aggregator or the notifier again.
    pub async fn stop(&mut self) {
        let Some(shutdown_tx) = self.shutdown_tx.take() else {
            return;
        };
        let _ = shutdown_tx.send(true);

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("Polling task ended abnormally: {}", e);
            }
        }
        info!("Stopped polling");
    }
}

impl Drop for SourceScheduler {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// The task state of one category.
struct CategoryPoller {
    category: MetricCategory,
    policy: PollPolicy,
    provider: Arc<dyn MetricProvider>,
    aggregator: Arc<SnapshotAggregator>,
    notifier: Arc<ThresholdNotifier>,
}

impl CategoryPoller {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        debug!("{} polling every {:?}", self.category, self.policy.interval);

        let mut ticker = interval(self.policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut pending: Option<BoxFuture<'static, Result<MetricValue>>> = None;

        loop {
            // Shutdown first, then a finished fetch, so a fetch that lands on
            // a tick boundary is recorded before that tick is considered.
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                result = poll_pending(&mut pending) => {
                    pending = None;
                    self.complete(result).await;
                }
                _ = ticker.tick() => {
                    if pending.is_some() {
                        let skipped = self.aggregator.record_skip(self.category);
                        debug!("{} fetch still in flight, dropping tick ({} skipped)", self.category, skipped);
                        continue;
                    }
                    self.aggregator.begin_fetch(self.category);
                    let provider = Arc::clone(&self.provider);
                    pending = Some(Box::pin(async move { provider.fetch().await }));
                }
            }
        }

        if pending.take().is_some() {
            debug!("{} abandoning in-flight fetch", self.category);
            self.aggregator.abandon_fetch(self.category);
        }
    }

    async fn complete(&self, result: Result<MetricValue>) {
        let state = match result {
            Ok(value) if value.category() != self.category => {
                let message = format!("provider returned {} data", value.category());
                warn!("{} fetch failed: {}", self.category, message);
                self.aggregator.record_failure(self.category, message)
            }
            Ok(value) => {
                debug!("{} fetch succeeded", self.category);
                self.aggregator.record_success(self.category, value)
            }
            Err(e) => {
                warn!("{} fetch failed: {}", self.category, e);
                self.aggregator.record_failure(self.category, e.to_string())
            }
        };

        if self.category == MetricCategory::Battery {
            self.notifier.on_battery_state(&state).await;
        }
    }
}

/// Resolve the in-flight fetch, or never resolve if there is none.
async fn poll_pending(pending: &mut Option<BoxFuture<'static, Result<MetricValue>>>) -> Result<MetricValue> {
    match pending.as_mut() {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}
