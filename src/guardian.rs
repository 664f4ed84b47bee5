//! The assembled engine.

use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::metrics::{MetricCategory, MetricProvider, TimeoutProvider};
use crate::monitor::{
    NotifierState, SettingsStore, SettingsUpdateRequest, Snapshot, SnapshotAggregator,
    SourceScheduler, SourceState, ThresholdNotifier, Thresholds,
};
use crate::notify::NotificationSink;

/// Polling engine plus the battery alert pipeline behind one handle.
///
/// Reads and settings updates never wait on a fetch; only `start` and
/// `stop` touch the scheduler.
///
/// ```rust,no_run
/// use battery_guardian::{Guardian, MonitorConfig};
///
/// #[tokio::main]
/// async fn main() -> battery_guardian::Result<()> {
///     let guardian = Guardian::with_system_providers(MonitorConfig::default())?;
///     guardian.start().await?;
///     let snapshot = guardian.snapshot();
///     println!("{} categories", snapshot.sources.len());
///     guardian.stop().await;
///     Ok(())
/// }
/// ```
pub struct Guardian {
    config: MonitorConfig,
    aggregator: Arc<SnapshotAggregator>,
    settings: Arc<SettingsStore>,
    notifier: Arc<ThresholdNotifier>,
    scheduler: Mutex<SourceScheduler>,
}

impl Guardian {
    pub fn builder(config: MonitorConfig) -> GuardianBuilder {
        GuardianBuilder {
            config,
            sink: None,
            providers: Vec::new(),
        }
    }

    /// Engine polling this host, alerting through the configured backend.
    pub fn with_system_providers(config: MonitorConfig) -> Result<Self> {
        Self::builder(config)
            .providers(crate::metrics::system_providers())
            .build()
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler.lock().await.start()
    }

    /// Stop polling. No state changes once this returns.
    pub async fn stop(&self) {
        self.scheduler.lock().await.stop().await;
    }

    pub async fn is_running(&self) -> bool {
        self.scheduler.lock().await.is_running()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.aggregator.read_all()
    }

    pub fn source(&self, category: MetricCategory) -> Arc<SourceState> {
        self.aggregator.read(category)
    }

    pub fn thresholds(&self) -> Thresholds {
        self.settings.read()
    }

    /// Apply new limits; a rejected request leaves the current ones in place.
    pub fn update_settings(&self, request: SettingsUpdateRequest) -> Result<Thresholds> {
        self.settings.apply(request)
    }

    pub fn notifier_state(&self) -> NotifierState {
        self.notifier.state()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

/// Collects providers and the sink before the engine is assembled.
pub struct GuardianBuilder {
    config: MonitorConfig,
    sink: Option<Arc<dyn NotificationSink>>,
    providers: Vec<(MetricCategory, Arc<dyn MetricProvider>)>,
}

impl GuardianBuilder {
    /// Use this sink instead of the configured backend.
    pub fn sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn provider(mut self, category: MetricCategory, provider: Arc<dyn MetricProvider>) -> Self {
        self.providers.push((category, provider));
        self
    }

    pub fn providers(
        mut self,
        providers: impl IntoIterator<Item = (MetricCategory, Arc<dyn MetricProvider>)>,
    ) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn build(self) -> Result<Guardian> {
        let GuardianBuilder {
            config,
            sink,
            providers,
        } = self;
        config.validate()?;

        let sink = sink.unwrap_or_else(|| config.notifications.build());
        let aggregator = Arc::new(SnapshotAggregator::new());
        let settings = Arc::new(SettingsStore::new(config.thresholds));
        let notifier = Arc::new(ThresholdNotifier::new(Arc::clone(&settings), sink));
        let mut scheduler = SourceScheduler::new(Arc::clone(&aggregator), Arc::clone(&notifier));

        let timeout = config.provider_timeout();
        for (category, provider) in providers {
            let provider: Arc<dyn MetricProvider> = match timeout {
                Some(timeout) => Arc::new(TimeoutProvider::new(provider, category, timeout)),
                None => provider,
            };
            scheduler.register(category, config.poll_policy(category).interval, provider)?;
        }
        info!(
            "Guardian ready: {} sources, limits {}% - {}%",
            scheduler.registered().count(),
            config.thresholds.min,
            config.thresholds.max
        );

        Ok(Guardian {
            config,
            aggregator,
            settings,
            notifier,
            scheduler: Mutex::new(scheduler),
        })
    }
}

/// Fetch every provider once, concurrently, without starting any timers.
pub async fn snapshot_once(
    providers: impl IntoIterator<Item = (MetricCategory, Arc<dyn MetricProvider>)>,
) -> Snapshot {
    let aggregator = SnapshotAggregator::new();
    let fetches = providers.into_iter().map(|(category, provider)| async move {
        (category, provider.fetch().await)
    });

    for (category, result) in join_all(fetches).await {
        match result {
            Ok(value) => {
                aggregator.record_success(category, value);
            }
            Err(e) => {
                aggregator.record_failure(category, e.to_string());
            }
        }
    }
    aggregator.read_all()
}
