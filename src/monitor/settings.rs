//! Battery threshold settings.

use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

use crate::error::{MonitorError, Result};

/// Default lower battery limit in percent.
pub const DEFAULT_MIN_PERCENT: u8 = 25;

/// Default upper battery limit in percent.
pub const DEFAULT_MAX_PERCENT: u8 = 80;

/// Battery charge limits. Always satisfies `min < max <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min: u8,
    pub max: u8,
}

impl Thresholds {
    /// Validate a pair of limits.
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if !(0..=100).contains(&min) || !(0..=100).contains(&max) {
            return Err(MonitorError::validation(min, max, "limits must be within 0..=100"));
        }
        if min >= max {
            return Err(MonitorError::validation(min, max, "min must be below max"));
        }
        Ok(Self {
            min: min as u8,
            max: max as u8,
        })
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_PERCENT,
            max: DEFAULT_MAX_PERCENT,
        }
    }
}

/// Inbound request to change the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdateRequest {
    pub min: i64,
    pub max: i64,
}

/// Owner of the mutable threshold pair.
///
/// The pair is replaced as a whole, so a reader never sees a new `min` with
/// an old `max`.
#[derive(Debug, Default)]
pub struct SettingsStore {
    current: RwLock<Thresholds>,
}

impl SettingsStore {
    pub fn new(initial: Thresholds) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Latest committed thresholds.
    pub fn read(&self) -> Thresholds {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace both limits, or reject the update and keep the current pair.
    pub fn update(&self, min: i64, max: i64) -> Result<Thresholds> {
        let next = match Thresholds::new(min, max) {
            Ok(next) => next,
            Err(e) => {
                warn!("Rejected threshold update: {}", e);
                return Err(e);
            }
        };
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
        info!("Updated limits: {}% - {}%", next.min, next.max);
        Ok(next)
    }

    pub fn apply(&self, request: SettingsUpdateRequest) -> Result<Thresholds> {
        self.update(request.min, request.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let store = SettingsStore::default();
        assert_eq!(store.read(), Thresholds { min: 25, max: 80 });
    }

    #[test]
    fn test_rejects_inverted_pair() {
        let store = SettingsStore::default();
        let err = store.update(90, 80).unwrap_err();
        assert!(matches!(err, MonitorError::Validation { min: 90, max: 80, .. }));
        assert_eq!(store.read(), Thresholds::default());

        assert!(store.update(50, 50).is_err());
        assert_eq!(store.read(), Thresholds::default());
    }

    #[test]
    fn test_rejects_out_of_range() {
        let store = SettingsStore::default();
        assert!(store.update(-1, 80).is_err());
        assert!(store.update(20, 101).is_err());
        assert_eq!(store.read(), Thresholds::default());
    }

    #[test]
    fn test_accepts_valid_pair() {
        let store = SettingsStore::default();
        let applied = store
            .apply(SettingsUpdateRequest { min: 30, max: 85 })
            .unwrap();
        assert_eq!(applied, Thresholds { min: 30, max: 85 });
        assert_eq!(store.read(), applied);

        assert_eq!(store.update(0, 100).unwrap(), Thresholds { min: 0, max: 100 });
    }

    #[test]
    fn test_reads_are_never_torn() {
        use std::sync::Arc;

        let store = Arc::new(SettingsStore::default());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..2000 {
                    let (min, max) = if i % 2 == 0 { (10, 20) } else { (70, 90) };
                    store.update(min, max).unwrap();
                }
            })
        };

        for _ in 0..2000 {
            let t = store.read();
            assert!(
                matches!((t.min, t.max), (25, 80) | (10, 20) | (70, 90)),
                "torn read {:?}",
                t
            );
        }
        writer.join().unwrap();
    }
}
