//! Host metric collection using sysinfo and direct `/sys` access.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Disks, Networks, ProcessStatus, ProcessesToUpdate, System};

use crate::error::{MonitorError, Result};
use crate::metrics::data::*;
use crate::metrics::provider::MetricProvider;
use crate::metrics::{power, sessions, sysfs};
use crate::metrics::MetricCategory;

/// Collector state for one provider.
///
/// Each category gets its own collector, so the sysinfo handles are only
/// created for the categories that use them.
pub struct SystemCollector {
    system: System,
    disks: Option<Disks>,
    networks: Option<Networks>,
    last_network_refresh: Option<Instant>,
    /// Read batteries only from this sysfs tree instead of the platform API
    power_supply_root: Option<PathBuf>,
}

impl SystemCollector {
    /// Create a new collector instance.
    pub fn new() -> Self {
        Self {
            system: System::new(),
            disks: None,
            networks: None,
            last_network_refresh: None,
            power_supply_root: None,
        }
    }

    /// Read batteries from a different power supply root.
    pub fn with_power_supply_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.power_supply_root = Some(root.into());
        self
    }

    /// Collect one category.
    pub fn collect(&mut self, category: MetricCategory) -> Result<MetricValue> {
        let value = match category {
            MetricCategory::Battery => MetricValue::Battery(self.collect_battery()?),
            MetricCategory::Processes => MetricValue::Processes(self.collect_processes()),
            MetricCategory::Memory => MetricValue::Memory(self.collect_memory()),
            MetricCategory::Filesystem => MetricValue::Filesystem(self.collect_filesystems()),
            MetricCategory::SystemOs => MetricValue::SystemOs(self.collect_system_os()),
            MetricCategory::Cpu => MetricValue::Cpu(self.collect_cpu()?),
            MetricCategory::Network => MetricValue::Network(self.collect_network()),
            MetricCategory::Disk => MetricValue::Disk(self.collect_disk()?),
            MetricCategory::Graphics => MetricValue::Graphics(self.collect_graphics()?),
            MetricCategory::Users => MetricValue::Users(self.collect_users()?),
            MetricCategory::Time => MetricValue::Time(self.collect_time()),
        };
        Ok(value)
    }

    fn collect_battery(&self) -> Result<BatteryInfo> {
        if let Some(root) = &self.power_supply_root {
            return sysfs::read_battery(root);
        }
        power::resolve_battery(power::read_platform_battery(), || {
            sysfs::read_battery(Path::new(sysfs::POWER_SUPPLY_ROOT))
        })
    }

    fn collect_processes(&mut self) -> ProcessList {
        self.system.refresh_processes(ProcessesToUpdate::All, true);

        let mut list: Vec<ProcessInfo> = self
            .system
            .processes()
            .values()
            .map(|process| ProcessInfo {
                pid: process.pid().as_u32(),
                parent_pid: process.parent().map(|pid| pid.as_u32()),
                name: process.name().to_string_lossy().to_string(),
                cpu_percent: process.cpu_usage(),
                memory_bytes: process.memory(),
                status: format!("{:?}", process.status()),
            })
            .collect();
        list.sort_by_key(|p| p.pid);

        let statuses = || self.system.processes().values().map(|p| p.status());
        ProcessList {
            all: list.len(),
            running: statuses()
                .filter(|s| matches!(s, ProcessStatus::Run))
                .count(),
            sleeping: statuses()
                .filter(|s| matches!(s, ProcessStatus::Sleep | ProcessStatus::Idle))
                .count(),
            list,
        }
    }

    fn collect_memory(&mut self) -> MemoryInfo {
        self.system.refresh_memory();

        let total_bytes = self.system.total_memory();
        let used_bytes = self.system.used_memory();
        let usage_percent = if total_bytes > 0 {
            (used_bytes as f32 / total_bytes as f32) * 100.0
        } else {
            0.0
        };

        MemoryInfo {
            total_bytes,
            free_bytes: self.system.free_memory(),
            used_bytes,
            available_bytes: self.system.available_memory(),
            usage_percent,
            swap_total_bytes: self.system.total_swap(),
            swap_used_bytes: self.system.used_swap(),
            swap_free_bytes: self.system.free_swap(),
        }
    }

    fn collect_filesystems(&mut self) -> Vec<FsSizeInfo> {
        let disks = self.disks.get_or_insert_with(Disks::new_with_refreshed_list);
        disks.refresh(true);

        disks
            .iter()
            .map(|disk| {
                let size_bytes = disk.total_space();
                let available_bytes = disk.available_space();
                let used_bytes = size_bytes.saturating_sub(available_bytes);

                let use_percent = if size_bytes > 0 {
                    (used_bytes as f32 / size_bytes as f32) * 100.0
                } else {
                    0.0
                };

                FsSizeInfo {
                    fs: disk.name().to_string_lossy().to_string(),
                    mount: disk.mount_point().to_string_lossy().to_string(),
                    fs_type: disk.file_system().to_string_lossy().to_string(),
                    size_bytes,
                    used_bytes,
                    available_bytes,
                    use_percent,
                    removable: disk.is_removable(),
                }
            })
            .collect()
    }

    fn collect_system_os(&self) -> SystemOsInfo {
        let unknown = || "unknown".to_string();
        let (vendor, model) = sysfs::read_dmi(Path::new(sysfs::DMI_ROOT));

        SystemOsInfo {
            hostname: System::host_name().unwrap_or_else(unknown),
            os_name: System::name().unwrap_or_else(unknown),
            os_version: System::os_version().unwrap_or_else(unknown),
            long_os_version: System::long_os_version().unwrap_or_else(unknown),
            kernel_version: System::kernel_version().unwrap_or_else(unknown),
            arch: std::env::consts::ARCH.to_string(),
            vendor,
            model,
        }
    }

    fn collect_cpu(&mut self) -> Result<CpuInfo> {
        self.system.refresh_cpu_all();
        let cpus = self.system.cpus();

        if cpus.is_empty() {
            return Err(MonitorError::provider(
                MetricCategory::Cpu,
                "No CPU information available",
            ));
        }

        let load = System::load_average();

        Ok(CpuInfo {
            brand: cpus[0].brand().trim().to_string(),
            cores: cpus.len() as u32,
            usage_percent: self.system.global_cpu_usage(),
            core_usage: cpus.iter().map(|cpu| cpu.cpu_usage()).collect(),
            frequency_mhz: cpus[0].frequency(),
            load_average: LoadAverage {
                one_minute: load.one,
                five_minutes: load.five,
                fifteen_minutes: load.fifteen,
            },
            temperature_celsius: sysfs::read_thermal_zone(Path::new(
                sysfs::THERMAL_ZONE0,
            )),
        })
    }

    fn collect_network(&mut self) -> NetworkInfo {
        let networks = self
            .networks
            .get_or_insert_with(Networks::new_with_refreshed_list);
        networks.refresh(true);

        let now = Instant::now();
        let elapsed_secs = self
            .last_network_refresh
            .map(|t| now.duration_since(t).as_secs_f64())
            .unwrap_or(1.0)
            .max(f64::EPSILON);
        self.last_network_refresh = Some(now);

        let mut info = NetworkInfo::default();
        for (name, data) in networks.iter() {
            info.interfaces.push(NetworkInterface {
                name: name.clone(),
                mac_address: data.mac_address().to_string(),
                addresses: data
                    .ip_networks()
                    .iter()
                    .map(|net| format!("{}/{}", net.addr, net.prefix))
                    .collect(),
            });
            info.stats.push(NetworkStats {
                interface: name.clone(),
                rx_bytes: data.total_received(),
                tx_bytes: data.total_transmitted(),
                rx_bytes_per_sec: (data.received() as f64 / elapsed_secs) as u64,
                tx_bytes_per_sec: (data.transmitted() as f64 / elapsed_secs) as u64,
                rx_errors: data.total_errors_on_received(),
                tx_errors: data.total_errors_on_transmitted(),
            });
        }
        info.interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        info.stats.sort_by(|a, b| a.interface.cmp(&b.interface));
        info
    }

    fn collect_disk(&self) -> Result<DiskInfo> {
        let layout = sysfs::read_block_devices(Path::new(sysfs::BLOCK_ROOT))
            .map_err(|e| MonitorError::provider(MetricCategory::Disk, e.to_string()))?;
        let names: Vec<String> = layout.iter().map(|d| d.name.clone()).collect();
        let io = fs::read_to_string(sysfs::DISKSTATS_PATH)
            .map(|content| sysfs::parse_diskstats(&content, &names))
            .unwrap_or_default();

        Ok(DiskInfo { layout, io })
    }

    fn collect_graphics(&self) -> Result<GraphicsInfo> {
        Ok(GraphicsInfo {
            controllers: sysfs::read_drm_cards(Path::new(sysfs::DRM_ROOT))?,
        })
    }

    fn collect_users(&self) -> Result<Vec<UserInfo>> {
        sessions::read_sessions(Path::new(sessions::UTMP_PATH))
    }

    fn collect_time(&self) -> TimeInfo {
        let now = chrono::Local::now();
        let timezone_name = std::env::var("TZ")
            .ok()
            .or_else(|| fs::read_to_string("/etc/timezone").ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        TimeInfo {
            current_ms: now.timestamp_millis(),
            uptime_seconds: System::uptime(),
            boot_time: System::boot_time(),
            timezone: now.format("%z").to_string(),
            timezone_name,
        }
    }
}

impl Default for SystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Host-backed provider for one category.
///
/// Collection is blocking, so it runs on tokio's blocking pool.
pub struct SystemProvider {
    category: MetricCategory,
    collector: Arc<Mutex<SystemCollector>>,
}

impl SystemProvider {
    pub fn new(category: MetricCategory) -> Self {
        Self::with_collector(category, SystemCollector::new())
    }

    pub fn with_collector(category: MetricCategory, collector: SystemCollector) -> Self {
        Self {
            category,
            collector: Arc::new(Mutex::new(collector)),
        }
    }

    pub fn category(&self) -> MetricCategory {
        self.category
    }
}

#[async_trait]
impl MetricProvider for SystemProvider {
    async fn fetch(&self) -> Result<MetricValue> {
        let category = self.category;
        let collector = Arc::clone(&self.collector);

        let result = tokio::task::spawn_blocking(move || {
            let mut collector = collector
                .lock()
                .map_err(|_| MonitorError::provider(category, "collector lock poisoned"))?;
            collector.collect(category)
        })
        .await
        .map_err(|e| MonitorError::provider(category, format!("collector task failed: {}", e)))?;

        result.map_err(|e| match e {
            MonitorError::Provider { .. } | MonitorError::Timeout { .. } => e,
            other => MonitorError::provider(category, other.to_string()),
        })
    }
}

/// One host-backed provider per category.
pub fn system_providers() -> Vec<(MetricCategory, Arc<dyn MetricProvider>)> {
    MetricCategory::ALL
        .into_iter()
        .map(|category| {
            let provider: Arc<dyn MetricProvider> = Arc::new(SystemProvider::new(category));
            (category, provider)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_battery_provider_reads_fixture() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("BAT0")).unwrap();
        fs::write(dir.path().join("BAT0/type"), "Battery").unwrap();
        fs::write(dir.path().join("BAT0/capacity"), "64").unwrap();
        fs::write(dir.path().join("BAT0/status"), "Discharging").unwrap();

        let collector = SystemCollector::new().with_power_supply_root(dir.path());
        let provider = SystemProvider::with_collector(MetricCategory::Battery, collector);

        let value = provider.fetch().await.unwrap();
        let battery = value.as_battery().unwrap();
        assert_eq!(battery.percent, 64);
        assert!(!battery.is_charging);
    }

    #[tokio::test]
    async fn test_platform_battery_read_never_fails_the_fetch() {
        // Without a sysfs override the platform API is asked first; hosts
        // with no battery or no power daemon still yield a value
        let value = SystemProvider::new(MetricCategory::Battery).fetch().await.unwrap();
        assert!(value.as_battery().is_some());
    }

    #[tokio::test]
    async fn test_parse_failures_become_provider_failures() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("BAT0")).unwrap();
        fs::write(dir.path().join("BAT0/type"), "Battery").unwrap();
        fs::write(dir.path().join("BAT0/capacity"), "n/a").unwrap();

        let collector = SystemCollector::new().with_power_supply_root(dir.path());
        let provider = SystemProvider::with_collector(MetricCategory::Battery, collector);

        let err = provider.fetch().await.unwrap_err();
        assert_eq!(err.category(), Some(MetricCategory::Battery));
    }

    #[tokio::test]
    async fn test_memory_and_time_collection() {
        let memory = SystemProvider::new(MetricCategory::Memory).fetch().await.unwrap();
        match memory {
            MetricValue::Memory(info) => assert!(info.total_bytes > 0),
            other => panic!("unexpected value {:?}", other),
        }

        let time = SystemProvider::new(MetricCategory::Time).fetch().await.unwrap();
        match time {
            MetricValue::Time(info) => assert!(info.current_ms > 0),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_one_provider_per_category() {
        let providers = system_providers();
        assert_eq!(providers.len(), MetricCategory::ALL.len());
    }
}
