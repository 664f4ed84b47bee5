//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{MonitorError, Result};
use crate::metrics::{MetricCategory, PollPolicy};
use crate::monitor::Thresholds;
use crate::notify::NotificationBackend;
use crate::web::WebConfig;

/// Configuration for the monitor, loadable from a JSON file.
///
/// ```json
/// {
///   "intervals": { "battery": 10000, "cpu": 2000 },
///   "thresholds": { "min": 20, "max": 85 },
///   "provider_timeout_ms": 15000,
///   "notifications": "log",
///   "web": { "host": "127.0.0.1", "port": 8787, "enable_cors": false }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Polling interval overrides in milliseconds, keyed by category name
    pub intervals: BTreeMap<String, u64>,
    pub thresholds: Thresholds,
    /// Fail a fetch that runs longer than this
    pub provider_timeout_ms: Option<u64>,
    pub notifications: NotificationBackend,
    pub web: WebConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            intervals: BTreeMap::new(),
            thresholds: Thresholds::default(),
            provider_timeout_ms: None,
            notifications: NotificationBackend::default(),
            web: WebConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::config_error(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            MonitorError::config_error(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Override the polling interval of one category.
    pub fn with_interval(mut self, category: MetricCategory, interval: Duration) -> Self {
        self.intervals
            .insert(category.as_str().to_string(), interval.as_millis() as u64);
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.provider_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn with_notifications(mut self, backend: NotificationBackend) -> Self {
        self.notifications = backend;
        self
    }

    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Check every value a hand-written file could get wrong.
    pub fn validate(&self) -> Result<()> {
        for (name, interval_ms) in &self.intervals {
            let category: MetricCategory = name
                .parse()
                .map_err(|e: MonitorError| MonitorError::config_error(e.to_string()))?;
            if *interval_ms == 0 {
                return Err(MonitorError::config_error(format!(
                    "interval for {} must be positive",
                    category
                )));
            }
        }
        Thresholds::new(self.thresholds.min.into(), self.thresholds.max.into())
            .map_err(|e| MonitorError::config_error(e.to_string()))?;
        if self.provider_timeout_ms == Some(0) {
            return Err(MonitorError::config_error("provider_timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Effective polling policy of a category.
    pub fn poll_policy(&self, category: MetricCategory) -> PollPolicy {
        self.intervals
            .iter()
            .find(|(name, _)| name.parse::<MetricCategory>().ok() == Some(category))
            .map(|(_, ms)| PollPolicy::from_millis(*ms))
            .unwrap_or_else(|| PollPolicy::from(category))
    }

    pub fn provider_timeout(&self) -> Option<Duration> {
        self.provider_timeout_ms.map(Duration::from_millis)
    }
}
