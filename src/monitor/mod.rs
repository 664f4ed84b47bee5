//! The polling engine: per-category scheduling, the snapshot aggregator,
//! threshold settings and the battery alert latch.

pub mod aggregator;
pub mod notifier;
pub mod scheduler;
pub mod settings;
pub mod state;

pub use aggregator::SnapshotAggregator;
pub use notifier::{
    AlertKind, AlertZone, BatteryAlert, BatterySample, NotifierState, ThresholdNotifier,
};
pub use scheduler::SourceScheduler;
pub use settings::{
    SettingsStore, SettingsUpdateRequest, Thresholds, DEFAULT_MAX_PERCENT, DEFAULT_MIN_PERCENT,
};
pub use state::{ErrorInfo, Snapshot, SourceState};
