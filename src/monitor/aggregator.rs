//! Latest-known-state store for every category.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::metrics::{MetricCategory, MetricValue};
use crate::monitor::state::{ErrorInfo, Snapshot, SourceState};

/// Holds one immutable [`SourceState`] per category.
///
/// Every category has its own lock and writers swap in a whole new `Arc`,
/// so a reader gets either the old or the new state of a category, never a
/// mix. Reads never trigger a fetch.
pub struct SnapshotAggregator {
    entries: BTreeMap<MetricCategory, RwLock<Arc<SourceState>>>,
}

impl SnapshotAggregator {
    pub fn new() -> Self {
        let entries = MetricCategory::ALL
            .into_iter()
            .map(|category| (category, RwLock::new(Arc::new(SourceState::empty(category)))))
            .collect();
        Self { entries }
    }

    /// Current state of one category.
    pub fn read(&self, category: MetricCategory) -> Arc<SourceState> {
        match self.entries.get(&category) {
            Some(entry) => Arc::clone(&entry.read().unwrap_or_else(PoisonError::into_inner)),
            None => Arc::new(SourceState::empty(category)),
        }
    }

    /// Current state of every category.
    pub fn read_all(&self) -> Snapshot {
        Snapshot {
            taken_at: Utc::now(),
            sources: MetricCategory::ALL
                .into_iter()
                .map(|category| (category, self.read(category)))
                .collect(),
        }
    }

    fn update(&self, category: MetricCategory, f: impl FnOnce(&mut SourceState)) -> Arc<SourceState> {
        let Some(entry) = self.entries.get(&category) else {
            return Arc::new(SourceState::empty(category));
        };
        let mut guard = entry.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = SourceState::clone(&guard);
        f(&mut next);
        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        next
    }

    pub(crate) fn begin_fetch(&self, category: MetricCategory) {
        self.update(category, |state| state.in_flight = true);
    }

    pub(crate) fn record_skip(&self, category: MetricCategory) -> u64 {
        self.update(category, |state| state.skipped_ticks += 1)
            .skipped_ticks
    }

    pub(crate) fn record_success(&self, category: MetricCategory, value: MetricValue) -> Arc<SourceState> {
        self.update(category, |state| {
            state.last_value = Some(Arc::new(value));
            state.last_error = None;
            state.last_updated_at = Some(Utc::now());
            state.in_flight = false;
            state.fetches += 1;
        })
    }

    pub(crate) fn record_failure(&self, category: MetricCategory, message: String) -> Arc<SourceState> {
        self.update(category, |state| {
            state.last_error = Some(ErrorInfo {
                category,
                message,
                at: Utc::now(),
            });
            state.in_flight = false;
            state.fetches += 1;
            state.failures += 1;
        })
    }

    /// Drop the in-flight mark of a fetch whose result is being discarded.
    pub(crate) fn abandon_fetch(&self, category: MetricCategory) {
        self.update(category, |state| state.in_flight = false);
    }
}

impl Default for SnapshotAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MemoryInfo, TimeInfo};

    #[test]
    fn test_never_fetched_reports_absent() {
        let aggregator = SnapshotAggregator::new();
        let snapshot = aggregator.read_all();

        assert_eq!(snapshot.sources.len(), MetricCategory::ALL.len());
        for state in snapshot.sources.values() {
            assert!(state.last_value.is_none());
            assert!(state.last_error.is_none());
            assert!(state.last_updated_at.is_none());
        }
    }

    #[test]
    fn test_failure_keeps_stale_value() {
        let aggregator = SnapshotAggregator::new();
        let value = MetricValue::Memory(MemoryInfo {
            total_bytes: 1024,
            ..Default::default()
        });

        aggregator.begin_fetch(MetricCategory::Memory);
        aggregator.record_success(MetricCategory::Memory, value.clone());
        aggregator.begin_fetch(MetricCategory::Memory);
        let state = aggregator.record_failure(MetricCategory::Memory, "meminfo vanished".into());

        assert_eq!(state.last_value.as_deref(), Some(&value));
        assert_eq!(state.last_error.as_ref().unwrap().message, "meminfo vanished");
        assert!(!state.in_flight);
        assert_eq!((state.fetches, state.failures), (2, 1));
        assert!(state.is_stale());
    }

    #[test]
    fn test_success_clears_error() {
        let aggregator = SnapshotAggregator::new();
        aggregator.record_failure(MetricCategory::Time, "clock".into());
        let state = aggregator.record_success(MetricCategory::Time, MetricValue::Time(TimeInfo::default()));

        assert!(state.last_error.is_none());
        assert!(state.last_updated_at.is_some());
    }

    #[test]
    fn test_reader_keeps_pre_fetch_state() {
        let aggregator = SnapshotAggregator::new();
        let before = MetricValue::Time(TimeInfo {
            current_ms: 1,
            ..Default::default()
        });
        aggregator.record_success(MetricCategory::Time, before.clone());

        aggregator.begin_fetch(MetricCategory::Time);
        let during = aggregator.read(MetricCategory::Time);
        assert!(during.in_flight);
        assert_eq!(during.last_value.as_deref(), Some(&before));

        aggregator.record_success(
            MetricCategory::Time,
            MetricValue::Time(TimeInfo {
                current_ms: 2,
                ..Default::default()
            }),
        );
        // The Arc handed out earlier is an immutable snapshot
        assert_eq!(during.last_value.as_deref(), Some(&before));
    }

    #[test]
    fn test_categories_are_independent() {
        let aggregator = SnapshotAggregator::new();
        aggregator.record_failure(MetricCategory::Graphics, "no drm".into());

        let snapshot = aggregator.read_all();
        assert_eq!(snapshot.failing().count(), 1);
        assert!(snapshot.get(MetricCategory::Cpu).unwrap().last_error.is_none());
    }
}
