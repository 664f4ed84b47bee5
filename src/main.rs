//! Battery Guardian binary.
//!
//! Polls the host, alerts on battery thresholds and serves the state over HTTP.

use anyhow::{bail, Context};
use battery_guardian::{
    metrics::system_providers, snapshot_once, start_web_server, AlertZone, BatterySample,
    Guardian, MetricCategory, MetricValue, MonitorConfig, NotificationBackend, Snapshot,
    SourceState, Thresholds,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "battery-guardian")]
#[command(about = "🔋 Battery Guardian - host polling and battery threshold alerts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Polls host metrics on per-category schedules and raises a desktop alert when the battery leaves the configured charge range"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Web server bind address
    #[arg(long)]
    host: Option<String>,

    /// Web server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Allow cross-origin requests to the HTTP API
    #[arg(long)]
    cors: bool,

    /// Low battery threshold in percent
    #[arg(long)]
    min: Option<i64>,

    /// High battery threshold in percent
    #[arg(long)]
    max: Option<i64>,

    /// Fail any fetch that takes longer than this many milliseconds
    #[arg(long)]
    provider_timeout_ms: Option<u64>,

    /// Write alerts to the log instead of the desktop
    #[arg(long)]
    log_notifications: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start polling and the HTTP API (default)
    Serve,

    /// Fetch every category once and exit
    Snapshot(SnapshotArgs),

    /// Show which alert zone a battery reading falls in
    Classify(ClassifyArgs),
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,

    /// Only fetch this category
    #[arg(long)]
    category: Option<String>,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Charge level in percent
    #[arg(long)]
    percent: u8,

    /// The battery is charging
    #[arg(long)]
    charging: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;
    let config = load_config(&cli)?;

    match &cli.command {
        Some(Commands::Serve) | None => serve_command(config).await,
        Some(Commands::Snapshot(args)) => snapshot_command(args).await,
        Some(Commands::Classify(args)) => classify_command(&config, args),
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install the log subscriber")?;

    Ok(())
}

/// File values first, then command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<MonitorConfig> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => MonitorConfig::default(),
    };

    if let Some(host) = &cli.host {
        config.web = config.web.with_host(host.clone());
    }
    if let Some(port) = cli.port {
        config.web = config.web.with_port(port);
    }
    if cli.cors {
        config.web = config.web.with_cors(true);
    }
    if cli.min.is_some() || cli.max.is_some() {
        let min = cli.min.unwrap_or(config.thresholds.min.into());
        let max = cli.max.unwrap_or(config.thresholds.max.into());
        config.thresholds = Thresholds::new(min, max).context("invalid --min/--max")?;
    }
    if let Some(timeout_ms) = cli.provider_timeout_ms {
        config = config.with_provider_timeout(Some(Duration::from_millis(timeout_ms)));
    }
    if cli.log_notifications {
        config = config.with_notifications(NotificationBackend::Log);
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn serve_command(config: MonitorConfig) -> anyhow::Result<()> {
    info!("Starting Battery Guardian...");

    let web_config = config.web.clone();
    info!(
        "Limits {}% - {}%, alerts via {:?}",
        config.thresholds.min, config.thresholds.max, config.notifications
    );

    let guardian = Arc::new(
        Guardian::with_system_providers(config).context("failed to assemble the monitor")?,
    );
    guardian.start().await.context("failed to start polling")?;

    let stopping = Arc::clone(&guardian);
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
        info!("Shutting down...");
        stopping.stop().await;
    };

    if let Err(e) = start_web_server(Arc::clone(&guardian), web_config, shutdown).await {
        guardian.stop().await;
        return Err(e).context("web server failed");
    }

    Ok(())
}

async fn snapshot_command(args: &SnapshotArgs) -> anyhow::Result<()> {
    let only = args
        .category
        .as_deref()
        .map(str::parse::<MetricCategory>)
        .transpose()?;
    if !matches!(args.format.as_str(), "json" | "pretty") {
        bail!("Unsupported format: {}. Use 'json' or 'pretty'", args.format);
    }

    let providers = system_providers()
        .into_iter()
        .filter(|(category, _)| only.map_or(true, |c| c == *category));
    let snapshot = snapshot_once(providers).await;

    match args.format.as_str() {
        "json" => match only {
            Some(category) => println!(
                "{}",
                serde_json::to_string_pretty(&snapshot.sources[&category])?
            ),
            None => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        },
        _ => print_pretty_snapshot(&snapshot, only),
    }

    Ok(())
}

fn classify_command(config: &MonitorConfig, args: &ClassifyArgs) -> anyhow::Result<()> {
    if args.percent > 100 {
        bail!("--percent must be between 0 and 100");
    }
    let sample = BatterySample::new(args.percent, args.charging);
    let zone = AlertZone::classify(sample, config.thresholds);

    println!(
        "{}% ({}) with limits {}% - {}%: {:?}",
        sample.percent,
        if sample.is_charging { "charging" } else { "discharging" },
        config.thresholds.min,
        config.thresholds.max,
        zone
    );
    Ok(())
}

fn print_pretty_snapshot(snapshot: &Snapshot, only: Option<MetricCategory>) {
    println!(
        "🔋 Battery Guardian Snapshot ({})",
        snapshot.taken_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");
    println!();

    for state in snapshot.sources.values() {
        if only.map_or(false, |c| c != state.category) {
            continue;
        }
        print_source(state);
    }
}

fn print_source(state: &SourceState) {
    let Some(value) = state.last_value.as_deref() else {
        match &state.last_error {
            Some(error) => println!("{}: ❌ {}", state.category, error.message),
            None => println!("{}: no data", state.category),
        }
        return;
    };

    match value {
        MetricValue::Battery(battery) if !battery.has_battery => {
            println!("battery: no battery hardware")
        }
        MetricValue::Battery(battery) => println!(
            "battery: {}% {} (AC: {})",
            battery.percent,
            battery.status,
            if battery.ac_connected { "online" } else { "offline" }
        ),
        MetricValue::Processes(processes) => println!(
            "processes: {} total, {} running, {} sleeping",
            processes.all, processes.running, processes.sleeping
        ),
        MetricValue::Memory(memory) => println!(
            "memory: {:.1} GB total, {:.1}% used",
            gigabytes(memory.total_bytes),
            memory.usage_percent
        ),
        MetricValue::Filesystem(filesystems) => {
            println!("filesystem:");
            for fs in filesystems {
                println!(
                    "  {}: {:.1} GB total, {:.1}% used",
                    fs.mount,
                    gigabytes(fs.size_bytes),
                    fs.use_percent
                );
            }
        }
        MetricValue::SystemOs(os) => println!(
            "systemOS: {} ({} {}, kernel {})",
            os.hostname, os.os_name, os.os_version, os.kernel_version
        ),
        MetricValue::Cpu(cpu) => {
            println!(
                "cpu: {} ({} cores) {:.1}% at {} MHz, load {:.2}",
                cpu.brand, cpu.cores, cpu.usage_percent, cpu.frequency_mhz, cpu.load_average.one_minute
            );
            if let Some(temp) = cpu.temperature_celsius {
                println!("  temperature: {:.1}°C", temp);
            }
        }
        MetricValue::Network(network) => {
            println!("network:");
            for stats in &network.stats {
                println!(
                    "  {}: RX {:.1} MB, TX {:.1} MB",
                    stats.interface,
                    stats.rx_bytes as f64 / 1024.0 / 1024.0,
                    stats.tx_bytes as f64 / 1024.0 / 1024.0
                );
            }
        }
        MetricValue::Disk(disk) => {
            println!(
                "disk: {} devices, {} reads, {} writes",
                disk.layout.len(),
                disk.io.reads_completed,
                disk.io.writes_completed
            );
        }
        MetricValue::Graphics(graphics) => {
            println!("graphics:");
            for controller in &graphics.controllers {
                println!("  {}: {} {}", controller.card, controller.vendor, controller.device_id);
            }
        }
        MetricValue::Users(users) if users.is_empty() => println!("users: No active users"),
        MetricValue::Users(users) => {
            println!("users:");
            for user in users {
                let since = user
                    .login_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("  {} ({}) {}", user.name, user.tty, since);
            }
        }
        MetricValue::Time(time) => println!(
            "time: up {} seconds, UTC{}",
            time.uptime_seconds, time.timezone
        ),
    }
}

fn gigabytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0 / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use battery_guardian::{DEFAULT_WEB_HOST, DEFAULT_WEB_PORT};

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["battery-guardian", "--port", "9090", "--min", "20"]).unwrap();
        assert_eq!(cli.port, Some(9090));

        let config = load_config(&cli).unwrap();
        assert_eq!(config.web.port, 9090);
        assert_eq!(config.thresholds, Thresholds { min: 20, max: 80 });
    }

    #[test]
    fn test_web_overrides() {
        let cli = Cli::try_parse_from(["battery-guardian", "--host", "0.0.0.0", "--cors"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.web.bind_address(), format!("0.0.0.0:{}", DEFAULT_WEB_PORT));
        assert!(config.web.enable_cors);
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["battery-guardian"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.web.port, DEFAULT_WEB_PORT);
        assert_eq!(config.web.host, DEFAULT_WEB_HOST);
        assert_eq!(config.notifications, NotificationBackend::Desktop);
        assert!(!config.web.enable_cors);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let cli = Cli::try_parse_from(["battery-guardian", "--min", "90", "--max", "80"]).unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::try_parse_from([
            "battery-guardian",
            "--log-notifications",
            "classify",
            "--percent",
            "15",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Classify(ClassifyArgs { percent: 15, charging: false }))
        ));
        assert_eq!(load_config(&cli).unwrap().notifications, NotificationBackend::Log);
    }
}
