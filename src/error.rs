//! Error handling for the Battery Guardian crate.

use crate::metrics::MetricCategory;

/// A specialized `Result` type for Battery Guardian operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// The main error type for Battery Guardian.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// A single fetch from a metric provider failed
    #[error("{category} provider failed: {message}")]
    Provider {
        category: MetricCategory,
        message: String,
    },

    /// A fetch did not resolve within the configured timeout
    #[error("{category} provider timed out after {after_ms}ms")]
    Timeout {
        category: MetricCategory,
        after_ms: u64,
    },

    /// A settings update violated `0 <= min < max <= 100`
    #[error("Invalid thresholds min={min}, max={max}: {reason}")]
    Validation { min: i64, max: i64, reason: String },

    /// An alert could not be delivered to the desktop
    #[error("Notification delivery failed: {0}")]
    Notification(String),

    /// Timer registration or lifecycle fault
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// System information parsing failed
    #[error("Failed to parse system information: {0}")]
    ParseError(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// Create a new provider failure for a category
    pub fn provider(category: MetricCategory, msg: impl Into<String>) -> Self {
        Self::Provider {
            category,
            message: msg.into(),
        }
    }

    /// Create a new threshold validation error
    pub fn validation(min: i64, max: i64, reason: impl Into<String>) -> Self {
        Self::Validation {
            min,
            max,
            reason: reason.into(),
        }
    }

    /// Create a new notification delivery error
    pub fn notification_error(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create a new scheduler error
    pub fn scheduler_error(msg: impl Into<String>) -> Self {
        Self::Scheduler(msg.into())
    }

    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The category this error belongs to, if it came from a provider.
    pub fn category(&self) -> Option<MetricCategory> {
        match self {
            Self::Provider { category, .. } | Self::Timeout { category, .. } => Some(*category),
            _ => None,
        }
    }
}
