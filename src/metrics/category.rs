//! Metric categories and their default polling cadence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::MonitorError;

/// One monitored subsystem of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricCategory {
    #[serde(rename = "battery")]
    Battery,
    #[serde(rename = "processes")]
    Processes,
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "filesystem")]
    Filesystem,
    #[serde(rename = "systemOS")]
    SystemOs,
    #[serde(rename = "cpu")]
    Cpu,
    #[serde(rename = "network")]
    Network,
    #[serde(rename = "disk")]
    Disk,
    #[serde(rename = "graphics")]
    Graphics,
    #[serde(rename = "users")]
    Users,
    #[serde(rename = "time")]
    Time,
}

impl MetricCategory {
    /// Every category, in display order.
    pub const ALL: [MetricCategory; 11] = [
        MetricCategory::Battery,
        MetricCategory::Processes,
        MetricCategory::Memory,
        MetricCategory::Filesystem,
        MetricCategory::SystemOs,
        MetricCategory::Cpu,
        MetricCategory::Network,
        MetricCategory::Disk,
        MetricCategory::Graphics,
        MetricCategory::Users,
        MetricCategory::Time,
    ];

    /// Wire name used in JSON and HTTP paths.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricCategory::Battery => "battery",
            MetricCategory::Processes => "processes",
            MetricCategory::Memory => "memory",
            MetricCategory::Filesystem => "filesystem",
            MetricCategory::SystemOs => "systemOS",
            MetricCategory::Cpu => "cpu",
            MetricCategory::Network => "network",
            MetricCategory::Disk => "disk",
            MetricCategory::Graphics => "graphics",
            MetricCategory::Users => "users",
            MetricCategory::Time => "time",
        }
    }

    /// Default polling interval for this category.
    pub fn default_interval(self) -> Duration {
        let secs = match self {
            MetricCategory::Battery => 30,
            MetricCategory::Users => 10,
            MetricCategory::Processes
            | MetricCategory::Memory
            | MetricCategory::Filesystem
            | MetricCategory::SystemOs
            | MetricCategory::Cpu
            | MetricCategory::Network
            | MetricCategory::Disk
            | MetricCategory::Graphics
            | MetricCategory::Time => 5,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricCategory {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], "");
        MetricCategory::ALL
            .into_iter()
            .find(|category| category.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| MonitorError::parse_error(format!("unknown metric category '{}'", s)))
    }
}

/// Polling policy for one category.
///
/// Concurrency is fixed at one in-flight fetch per category, so the
/// interval is the only knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(interval_ms))
    }
}

impl From<MetricCategory> for PollPolicy {
    fn from(category: MetricCategory) -> Self {
        Self::new(category.default_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_names() {
        for category in MetricCategory::ALL {
            assert_eq!(category.as_str().parse::<MetricCategory>().unwrap(), category);
        }
        assert_eq!(
            "system_os".parse::<MetricCategory>().unwrap(),
            MetricCategory::SystemOs
        );
        assert_eq!(" CPU ".parse::<MetricCategory>().unwrap(), MetricCategory::Cpu);
        assert!("gpu".parse::<MetricCategory>().is_err());
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&MetricCategory::SystemOs).unwrap();
        assert_eq!(json, "\"systemOS\"");
        assert_eq!(MetricCategory::SystemOs.to_string(), "systemOS");
    }

    #[test]
    fn test_default_intervals() {
        for category in MetricCategory::ALL {
            let expected = match category {
                MetricCategory::Battery => 30,
                MetricCategory::Users => 10,
                _ => 5,
            };
            assert_eq!(
                category.default_interval(),
                Duration::from_secs(expected),
                "{}",
                category
            );
        }
        assert_eq!(
            PollPolicy::from(MetricCategory::Battery).interval,
            Duration::from_secs(30)
        );
    }
}
