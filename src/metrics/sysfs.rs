//! Direct `/sys` and `/proc` readers for metrics sysinfo does not cover.
//!
//! Every reader takes its root directory so tests can point it at a
//! fixture tree.

use std::fs;
use std::path::Path;

use crate::error::{MonitorError, Result};
use crate::metrics::data::{BatteryInfo, BlockDevice, DiskIo, GraphicsController};

pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";
pub const BLOCK_ROOT: &str = "/sys/block";
pub const DISKSTATS_PATH: &str = "/proc/diskstats";
pub const DRM_ROOT: &str = "/sys/class/drm";
pub const DMI_ROOT: &str = "/sys/class/dmi/id";
pub const THERMAL_ZONE0: &str = "/sys/class/thermal/thermal_zone0/temp";

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Read the first battery under a power supply root.
///
/// A missing root or a root without any `Battery` entry means the host has
/// no battery hardware, which is reported as [`BatteryInfo::absent`].
pub fn read_battery(root: &Path) -> Result<BatteryInfo> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BatteryInfo::absent()),
        Err(e) => return Err(e.into()),
    };

    let mut supplies: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    supplies.sort();

    let ac_connected = supplies.iter().any(|supply| {
        read_trimmed(&supply.join("type")).as_deref() == Some("Mains")
            && read_trimmed(&supply.join("online")).as_deref() == Some("1")
    });

    let Some(battery) = supplies
        .iter()
        .find(|supply| read_trimmed(&supply.join("type")).as_deref() == Some("Battery"))
    else {
        return Ok(BatteryInfo::absent());
    };

    if read_trimmed(&battery.join("present")).as_deref() == Some("0") {
        return Ok(BatteryInfo::absent());
    }

    let percent = match read_trimmed(&battery.join("capacity")) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|e| MonitorError::parse_error(format!("battery capacity '{}': {}", raw, e)))?
            .min(100) as u8,
        None => percent_from_energy(battery)?,
    };

    let status = read_trimmed(&battery.join("status")).unwrap_or_else(|| "Unknown".to_string());

    Ok(BatteryInfo {
        has_battery: true,
        percent,
        is_charging: status.eq_ignore_ascii_case("charging"),
        ac_connected,
        status,
        cycle_count: read_trimmed(&battery.join("cycle_count")).and_then(|s| s.parse().ok()),
        manufacturer: read_trimmed(&battery.join("manufacturer")),
        model: read_trimmed(&battery.join("model_name")),
    })
}

/// Fallback for firmware that exposes energy/charge counters but no capacity.
fn percent_from_energy(battery: &Path) -> Result<u8> {
    let pairs = [("energy_now", "energy_full"), ("charge_now", "charge_full")];
    for (now, full) in pairs {
        let now = read_trimmed(&battery.join(now)).and_then(|s| s.parse::<u64>().ok());
        let full = read_trimmed(&battery.join(full)).and_then(|s| s.parse::<u64>().ok());
        if let (Some(now), Some(full)) = (now, full) {
            if full > 0 {
                return Ok(((now * 100 / full).min(100)) as u8);
            }
        }
    }
    Err(MonitorError::parse_error(format!(
        "no capacity reported under {}",
        battery.display()
    )))
}

/// List whole block devices, skipping loop, ram and device-mapper nodes.
pub fn read_block_devices(root: &Path) -> Result<Vec<BlockDevice>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut devices = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("loop") || name.starts_with("ram") || name.starts_with("dm-") {
            continue;
        }
        let path = entry.path();
        // The size file is always in 512-byte sectors
        let sectors = read_trimmed(&path.join("size"))
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        devices.push(BlockDevice {
            name,
            size_bytes: sectors * 512,
            rotational: read_trimmed(&path.join("queue/rotational")).as_deref() == Some("1"),
            removable: read_trimmed(&path.join("removable")).as_deref() == Some("1"),
            model: read_trimmed(&path.join("device/model")),
        });
    }
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}

/// Sum IO counters of the given whole disks from `/proc/diskstats` content.
pub fn parse_diskstats(content: &str, disks: &[String]) -> DiskIo {
    let mut io = DiskIo::default();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 || !disks.iter().any(|d| d == fields[2]) {
            continue;
        }
        let field = |i: usize| fields[i].parse::<u64>().unwrap_or(0);
        io.reads_completed += field(3);
        io.read_bytes += field(5) * 512;
        io.writes_completed += field(7);
        io.written_bytes += field(9) * 512;
    }
    io
}

/// List DRM cards (`card0`, `card1`, ...) with their PCI identity.
pub fn read_drm_cards(root: &Path) -> Result<Vec<GraphicsController>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut cards = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let card = entry.file_name().to_string_lossy().to_string();
        // Connectors show up as card0-HDMI-A-1 and friends
        let is_card = card
            .strip_prefix("card")
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
        if !is_card {
            continue;
        }
        let device = entry.path().join("device");
        let vendor_id = read_trimmed(&device.join("vendor")).unwrap_or_default();
        cards.push(GraphicsController {
            card,
            vendor: vendor_name(&vendor_id).to_string(),
            vendor_id,
            device_id: read_trimmed(&device.join("device")).unwrap_or_default(),
            driver: fs::read_link(device.join("driver"))
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string())),
        });
    }
    cards.sort_by(|a, b| a.card.cmp(&b.card));
    Ok(cards)
}

/// Map a PCI vendor id to a display name.
pub fn vendor_name(vendor_id: &str) -> &'static str {
    match vendor_id.to_ascii_lowercase().as_str() {
        "0x8086" => "Intel",
        "0x1002" | "0x1022" => "AMD",
        "0x10de" => "NVIDIA",
        "0x14e4" => "Broadcom",
        "0x1af4" => "Red Hat (virtio)",
        "0x15ad" => "VMware",
        _ => "Unknown",
    }
}

/// Hardware vendor and model from DMI.
pub fn read_dmi(root: &Path) -> (Option<String>, Option<String>) {
    (
        read_trimmed(&root.join("sys_vendor")),
        read_trimmed(&root.join("product_name")),
    )
}

/// Read a thermal zone in Celsius.
pub fn read_thermal_zone(path: &Path) -> Option<f32> {
    let millicelsius = read_trimmed(path)?.parse::<i32>().ok()?;
    Some(millicelsius as f32 / 1000.0)
}
