//! Edge-triggered battery threshold alerts.
//!
//! Each battery sample is classified into an [`AlertZone`]. An alert fires
//! only when the sample enters a boundary zone that is not already latched,
//! and the latch is cleared only by a sample inside the thresholds. A
//! battery sitting at 15% therefore alerts once, not on every poll.

use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::metrics::BatteryInfo;
use crate::monitor::settings::{SettingsStore, Thresholds};
use crate::monitor::state::SourceState;
use crate::notify::NotificationSink;

/// A battery reading relevant to the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatterySample {
    pub percent: u8,
    pub is_charging: bool,
}

impl BatterySample {
    pub fn new(percent: u8, is_charging: bool) -> Self {
        Self {
            percent,
            is_charging,
        }
    }

    /// `None` for hosts without battery hardware.
    pub fn from_info(info: &BatteryInfo) -> Option<Self> {
        info.has_battery
            .then(|| Self::new(info.percent.min(100), info.is_charging))
    }

    /// Sample from the battery category's latest known value.
    pub fn from_state(state: &SourceState) -> Option<Self> {
        state
            .last_value
            .as_deref()
            .and_then(|value| value.as_battery())
            .and_then(Self::from_info)
    }
}

/// Where a sample sits relative to the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertZone {
    BelowMin,
    InRange,
    AboveMaxCharging,
}

impl AlertZone {
    pub fn classify(sample: BatterySample, thresholds: Thresholds) -> Self {
        if sample.percent <= thresholds.min && !sample.is_charging {
            AlertZone::BelowMin
        } else if sample.percent >= thresholds.max && sample.is_charging {
            AlertZone::AboveMaxCharging
        } else {
            AlertZone::InRange
        }
    }
}

/// The two alerts the notifier can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKind {
    BatteryLow,
    BatteryFull,
}

impl AlertKind {
    pub fn title(self) -> &'static str {
        match self {
            AlertKind::BatteryLow => "🔌 Battery Low",
            AlertKind::BatteryFull => "🔋 Battery Full",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AlertKind::BatteryLow => "Please plug in your charger.",
            AlertKind::BatteryFull => "Please unplug your charger.",
        }
    }
}

/// An alert raised for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatteryAlert {
    pub kind: AlertKind,
    pub sample: BatterySample,
    pub thresholds: Thresholds,
}

/// The zone latch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotifierState {
    pub last_fired_zone: Option<AlertZone>,
}

impl NotifierState {
    /// Advance the latch for a newly classified zone, returning the alert to
    /// raise, if any.
    pub fn advance(&mut self, zone: AlertZone) -> Option<AlertKind> {
        let kind = match zone {
            AlertZone::InRange => {
                self.last_fired_zone = None;
                return None;
            }
            _ if self.last_fired_zone == Some(zone) => return None,
            AlertZone::BelowMin => AlertKind::BatteryLow,
            AlertZone::AboveMaxCharging => AlertKind::BatteryFull,
        };
        self.last_fired_zone = Some(zone);
        Some(kind)
    }
}

/// Drives the latch from battery samples and delivers alerts.
pub struct ThresholdNotifier {
    settings: Arc<SettingsStore>,
    sink: Arc<dyn NotificationSink>,
    state: Mutex<NotifierState>,
}

impl ThresholdNotifier {
    pub fn new(settings: Arc<SettingsStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            settings,
            sink,
            state: Mutex::new(NotifierState::default()),
        }
    }

    /// Current latch.
    pub fn state(&self) -> NotifierState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed the latest battery state after a fetch completed.
    pub async fn on_battery_state(&self, state: &SourceState) -> Option<BatteryAlert> {
        self.observe(BatterySample::from_state(state)).await
    }

    /// Process one sample. Absent samples are ignored.
    ///
    /// The latch is committed before delivery is attempted and is kept even
    /// if delivery fails.
    pub async fn observe(&self, sample: Option<BatterySample>) -> Option<BatteryAlert> {
        let sample = sample?;
        let thresholds = self.settings.read();
        let zone = AlertZone::classify(sample, thresholds);

        let kind = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.advance(zone)
        };
        debug!(
            "Battery {}% (charging: {}) is {:?} for {}/{}",
            sample.percent, sample.is_charging, zone, thresholds.min, thresholds.max
        );

        let kind = kind?;
        info!("{} at {}%", kind.title(), sample.percent);

        if let Err(e) = self.sink.notify(kind.title(), kind.message()).await {
            warn!("Failed to deliver battery alert: {}", e);
        }

        Some(BatteryAlert {
            kind,
            sample,
            thresholds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MonitorError, Result};
    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(&self, title: &str, _message: &str) -> Result<()> {
            self.sent.lock().unwrap().push(title.to_string());
            if self.fail {
                Err(MonitorError::notification_error("bus unavailable"))
            } else {
                Ok(())
            }
        }
    }

    fn notifier_with(sink: Arc<RecordingSink>) -> (ThresholdNotifier, Arc<SettingsStore>) {
        let settings = Arc::new(SettingsStore::default());
        (ThresholdNotifier::new(Arc::clone(&settings), sink), settings)
    }

    fn discharging(percent: u8) -> Option<BatterySample> {
        Some(BatterySample::new(percent, false))
    }

    fn charging(percent: u8) -> Option<BatterySample> {
        Some(BatterySample::new(percent, true))
    }

    #[test]
    fn test_classify_boundaries() {
        let t = Thresholds::default();
        let zone = |p, c| AlertZone::classify(BatterySample::new(p, c), t);

        assert_eq!(zone(25, false), AlertZone::BelowMin);
        assert_eq!(zone(26, false), AlertZone::InRange);
        assert_eq!(zone(25, true), AlertZone::InRange);
        assert_eq!(zone(80, true), AlertZone::AboveMaxCharging);
        assert_eq!(zone(79, true), AlertZone::InRange);
        assert_eq!(zone(100, false), AlertZone::InRange);
    }

    #[test]
    fn test_latch_transitions() {
        let mut state = NotifierState::default();
        assert_eq!(state.advance(AlertZone::BelowMin), Some(AlertKind::BatteryLow));
        assert_eq!(state.advance(AlertZone::BelowMin), None);
        assert_eq!(
            state.advance(AlertZone::AboveMaxCharging),
            Some(AlertKind::BatteryFull)
        );
        assert_eq!(state.advance(AlertZone::InRange), None);
        assert_eq!(state.last_fired_zone, None);
        assert_eq!(state.advance(AlertZone::AboveMaxCharging), Some(AlertKind::BatteryFull));
    }

    #[tokio::test]
    async fn test_low_fires_once_while_condition_persists() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, _) = notifier_with(Arc::clone(&sink));

        for percent in [20, 18, 15] {
            notifier.observe(discharging(percent)).await;
        }

        assert_eq!(*sink.sent.lock().unwrap(), vec!["🔌 Battery Low"]);
        assert_eq!(notifier.state().last_fired_zone, Some(AlertZone::BelowMin));
    }

    #[tokio::test]
    async fn test_rearms_after_passing_through_range() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, _) = notifier_with(Arc::clone(&sink));

        notifier.observe(discharging(18)).await;
        notifier.observe(discharging(50)).await;
        notifier.observe(discharging(15)).await;

        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_full_alert_below_max() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, _) = notifier_with(Arc::clone(&sink));

        assert!(notifier.observe(charging(50)).await.is_none());
        assert!(notifier.observe(charging(79)).await.is_none());
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_fires_at_boundary() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, _) = notifier_with(Arc::clone(&sink));

        let alert = notifier.observe(charging(80)).await.unwrap();
        assert_eq!(alert.kind, AlertKind::BatteryFull);
        assert!(notifier.observe(charging(85)).await.is_none());
        assert_eq!(*sink.sent.lock().unwrap(), vec!["🔋 Battery Full"]);
    }

    #[tokio::test]
    async fn test_absent_sample_is_ignored() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, _) = notifier_with(Arc::clone(&sink));

        notifier.observe(discharging(10)).await;
        assert!(notifier.observe(None).await.is_none());
        // Absence does not clear the latch
        assert_eq!(notifier.state().last_fired_zone, Some(AlertZone::BelowMin));

        let no_battery = BatteryInfo::absent();
        assert_eq!(BatterySample::from_info(&no_battery), None);
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_latch() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let (notifier, _) = notifier_with(Arc::clone(&sink));

        assert!(notifier.observe(discharging(12)).await.is_some());
        assert!(notifier.observe(discharging(11)).await.is_none());
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_new_thresholds_apply_to_next_sample() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, settings) = notifier_with(Arc::clone(&sink));

        assert!(notifier.observe(discharging(28)).await.is_none());
        settings.update(30, 85).unwrap();
        let alert = notifier.observe(discharging(28)).await.unwrap();
        assert_eq!(alert.thresholds, Thresholds { min: 30, max: 85 });

        assert!(notifier.observe(charging(82)).await.is_none());
    }
}
