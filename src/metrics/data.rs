//! Data structures for host metrics, one payload per category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::MetricCategory;

/// The typed result of one successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data")]
pub enum MetricValue {
    #[serde(rename = "battery")]
    Battery(BatteryInfo),
    #[serde(rename = "processes")]
    Processes(ProcessList),
    #[serde(rename = "memory")]
    Memory(MemoryInfo),
    #[serde(rename = "filesystem")]
    Filesystem(Vec<FsSizeInfo>),
    #[serde(rename = "systemOS")]
    SystemOs(SystemOsInfo),
    #[serde(rename = "cpu")]
    Cpu(CpuInfo),
    #[serde(rename = "network")]
    Network(NetworkInfo),
    #[serde(rename = "disk")]
    Disk(DiskInfo),
    #[serde(rename = "graphics")]
    Graphics(GraphicsInfo),
    #[serde(rename = "users")]
    Users(Vec<UserInfo>),
    #[serde(rename = "time")]
    Time(TimeInfo),
}

impl MetricValue {
    /// The category this value belongs to.
    pub fn category(&self) -> MetricCategory {
        match self {
            MetricValue::Battery(_) => MetricCategory::Battery,
            MetricValue::Processes(_) => MetricCategory::Processes,
            MetricValue::Memory(_) => MetricCategory::Memory,
            MetricValue::Filesystem(_) => MetricCategory::Filesystem,
            MetricValue::SystemOs(_) => MetricCategory::SystemOs,
            MetricValue::Cpu(_) => MetricCategory::Cpu,
            MetricValue::Network(_) => MetricCategory::Network,
            MetricValue::Disk(_) => MetricCategory::Disk,
            MetricValue::Graphics(_) => MetricCategory::Graphics,
            MetricValue::Users(_) => MetricCategory::Users,
            MetricValue::Time(_) => MetricCategory::Time,
        }
    }

    /// Battery payload, if this is a battery value.
    pub fn as_battery(&self) -> Option<&BatteryInfo> {
        match self {
            MetricValue::Battery(info) => Some(info),
            _ => None,
        }
    }
}

/// Battery state as reported by the power supply class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryInfo {
    /// Whether the host has battery hardware at all
    pub has_battery: bool,
    /// Charge level (0 to 100)
    pub percent: u8,
    /// Whether the battery is currently charging
    pub is_charging: bool,
    /// Whether an AC adapter is online
    pub ac_connected: bool,
    /// Raw status string (e.g., "Charging", "Discharging", "Full")
    pub status: String,
    /// Charge cycle count, when the firmware reports it
    pub cycle_count: Option<u32>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

impl BatteryInfo {
    /// The value reported by hosts without battery hardware.
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Running processes with summary counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessList {
    pub all: usize,
    pub running: usize,
    pub sleeping: usize,
    pub list: Vec<ProcessInfo>,
}

/// A single running process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    pub name: String,
    /// CPU usage percentage since the previous refresh
    pub cpu_percent: f32,
    /// Resident memory in bytes
    pub memory_bytes: u64,
    pub status: String,
}

/// Memory usage information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Total system memory in bytes
    pub total_bytes: u64,
    /// Free memory in bytes
    pub free_bytes: u64,
    /// Used memory in bytes
    pub used_bytes: u64,
    /// Available memory in bytes
    pub available_bytes: u64,
    /// Memory usage percentage (0.0 to 100.0)
    pub usage_percent: f32,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
    pub swap_free_bytes: u64,
}

/// One mounted file system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsSizeInfo {
    /// Device name (e.g., "/dev/nvme0n1p2")
    pub fs: String,
    /// Mount point (e.g., "/", "/boot")
    pub mount: String,
    /// Filesystem type (e.g., "ext4", "vfat")
    pub fs_type: String,
    pub size_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    /// Usage percentage (0.0 to 100.0)
    pub use_percent: f32,
    pub removable: bool,
}

/// Host and operating system identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemOsInfo {
    pub hostname: String,
    pub os_name: String,
    pub os_version: String,
    pub long_os_version: String,
    pub kernel_version: String,
    pub arch: String,
    /// Hardware vendor from DMI, when exposed
    pub vendor: Option<String>,
    /// Hardware model from DMI, when exposed
    pub model: Option<String>,
}

/// CPU information, usage statistics and package temperature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    /// CPU model name
    pub brand: String,
    /// Number of logical cores
    pub cores: u32,
    /// Overall usage percentage (0.0 to 100.0)
    pub usage_percent: f32,
    /// Per-core usage percentages
    pub core_usage: Vec<f32>,
    /// Current frequency of the first core in MHz
    pub frequency_mhz: u64,
    /// Load averages (1, 5, 15 minutes)
    pub load_average: LoadAverage,
    /// Package temperature in Celsius, if a thermal zone is readable
    pub temperature_celsius: Option<f32>,
}

/// System load averages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAverage {
    pub one_minute: f64,
    pub five_minutes: f64,
    pub fifteen_minutes: f64,
}

/// Network interfaces and their traffic counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub interfaces: Vec<NetworkInterface>,
    pub stats: Vec<NetworkStats>,
}

/// Static identity of one interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// Interface name (e.g., "wlan0", "eth0")
    pub name: String,
    pub mac_address: String,
    pub addresses: Vec<String>,
}

/// Traffic counters of one interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub interface: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_bytes_per_sec: u64,
    pub tx_bytes_per_sec: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

/// Block device layout and IO totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub layout: Vec<BlockDevice>,
    pub io: DiskIo,
}

/// A physical block device from `/sys/block`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDevice {
    /// Device name (e.g., "nvme0n1", "sda")
    pub name: String,
    pub size_bytes: u64,
    pub rotational: bool,
    pub removable: bool,
    pub model: Option<String>,
}

/// Aggregate IO counters across whole disks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskIo {
    pub reads_completed: u64,
    pub writes_completed: u64,
    pub read_bytes: u64,
    pub written_bytes: u64,
}

/// Graphics controllers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphicsInfo {
    pub controllers: Vec<GraphicsController>,
}

/// One DRM card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicsController {
    /// DRM card name (e.g., "card0")
    pub card: String,
    /// PCI vendor id (e.g., "0x8086")
    pub vendor_id: String,
    pub vendor: String,
    /// PCI device id
    pub device_id: String,
    /// Kernel driver bound to the device
    pub driver: Option<String>,
}

/// An active login session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Login name
    pub name: String,
    /// Terminal line (e.g., "tty1", "pts/0")
    pub tty: String,
    /// Remote host for network logins
    pub host: Option<String>,
    pub login_at: Option<DateTime<Utc>>,
}

/// Clock, uptime and timezone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeInfo {
    /// Current time (Unix timestamp in milliseconds)
    pub current_ms: i64,
    /// System uptime in seconds
    pub uptime_seconds: u64,
    /// Boot time (Unix timestamp)
    pub boot_time: u64,
    /// UTC offset (e.g., "+0200")
    pub timezone: String,
    /// IANA timezone name, when known
    pub timezone_name: Option<String>,
}
