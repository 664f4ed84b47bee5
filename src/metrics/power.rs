//! Battery readings through the platform battery APIs.
//!
//! The `battery` crate covers Linux, macOS and Windows. When it cannot see a
//! battery the sysfs reader gets a second look, since some Linux firmware
//! only shows up there.

use battery::units::ratio::percent;
use battery::State;
use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::metrics::data::BatteryInfo;
use crate::metrics::MetricCategory;

/// Read the first battery the platform reports, if any.
pub fn read_platform_battery() -> Result<Option<BatteryInfo>> {
    let fail = |e: battery::Error| MonitorError::provider(MetricCategory::Battery, e.to_string());

    let manager = battery::Manager::new().map_err(fail)?;
    let mut batteries = manager.batteries().map_err(fail)?;

    match batteries.next() {
        None => Ok(None),
        Some(Err(e)) => Err(fail(e)),
        Some(Ok(battery)) => Ok(Some(battery_info(
            battery.state(),
            battery.state_of_charge().get::<percent>(),
            battery.cycle_count(),
            battery.vendor(),
            battery.model(),
        ))),
    }
}

/// Build a reading from platform battery fields.
pub fn battery_info(
    state: State,
    charge_percent: f32,
    cycle_count: Option<u32>,
    vendor: Option<&str>,
    model: Option<&str>,
) -> BatteryInfo {
    BatteryInfo {
        has_battery: true,
        percent: charge_percent.round().clamp(0.0, 100.0) as u8,
        is_charging: matches!(state, State::Charging),
        ac_connected: matches!(state, State::Charging | State::Full),
        status: format!("{:?}", state),
        cycle_count,
        manufacturer: vendor.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        model: model.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
    }
}

/// Prefer the platform reading; fall back when it has nothing to say.
pub fn resolve_battery(
    platform: Result<Option<BatteryInfo>>,
    fallback: impl FnOnce() -> Result<BatteryInfo>,
) -> Result<BatteryInfo> {
    match platform {
        Ok(Some(info)) => Ok(info),
        Ok(None) => fallback(),
        Err(e) => {
            debug!("Platform battery read failed, trying sysfs: {}", e);
            fallback()
        }
    }
}
