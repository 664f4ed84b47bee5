//! Per-category source state and the aggregate snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::metrics::{MetricCategory, MetricValue};

/// Structured description of a failed fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub category: MetricCategory,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Latest known state of one category.
///
/// A failing fetch never clears `last_value`, so consumers keep seeing the
/// last good reading alongside the current error.
#[derive(Debug, Clone, Serialize)]
pub struct SourceState {
    pub category: MetricCategory,
    pub last_value: Option<Arc<MetricValue>>,
    pub last_error: Option<ErrorInfo>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub in_flight: bool,
    /// Completed fetches, successful or not
    pub fetches: u64,
    pub failures: u64,
    /// Ticks dropped because a fetch was still outstanding
    pub skipped_ticks: u64,
}

impl SourceState {
    /// State of a category that has never been fetched.
    pub fn empty(category: MetricCategory) -> Self {
        Self {
            category,
            last_value: None,
            last_error: None,
            last_updated_at: None,
            in_flight: false,
            fetches: 0,
            failures: 0,
            skipped_ticks: 0,
        }
    }

    /// Whether the last value is older than the last error.
    pub fn is_stale(&self) -> bool {
        match (&self.last_error, self.last_updated_at) {
            (Some(error), Some(updated)) => error.at >= updated,
            (Some(_), None) => false,
            (None, _) => false,
        }
    }
}

/// Read-only projection of every category at query time.
///
/// Each entry is independently consistent; entries may reflect different
/// instants.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub sources: BTreeMap<MetricCategory, Arc<SourceState>>,
}

impl Snapshot {
    pub fn get(&self, category: MetricCategory) -> Option<&SourceState> {
        self.sources.get(&category).map(|s| s.as_ref())
    }

    /// Categories whose latest fetch failed.
    pub fn failing(&self) -> impl Iterator<Item = &SourceState> {
        self.sources
            .values()
            .map(|s| s.as_ref())
            .filter(|s| s.last_error.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_staleness() {
        let mut state = SourceState::empty(MetricCategory::Cpu);
        assert!(!state.is_stale());

        let now = Utc::now();
        state.last_updated_at = Some(now - Duration::seconds(10));
        state.last_error = Some(ErrorInfo {
            category: MetricCategory::Cpu,
            message: "boom".into(),
            at: now,
        });
        assert!(state.is_stale());

        state.last_updated_at = None;
        assert!(!state.is_stale(), "nothing to be stale about without a value");
    }
}
