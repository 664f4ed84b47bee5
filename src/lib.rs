//! # Battery Guardian - Host Polling and Battery Threshold Alerts
//!
//! Polls a set of host metric sources on independent schedules, keeps the
//! latest known state of each, and raises a desktop alert when the battery
//! crosses a configurable low or high charge threshold.
//!
//! ## Features
//!
//! - **Per-category polling**: every category has its own interval and at
//!   most one fetch in flight; a slow source never delays the others
//! - **Latest-known-state snapshot**: failures keep the last good value
//!   alongside the current error
//! - **Edge-triggered alerts**: "Battery Low" and "Battery Full" fire once
//!   per entry into the zone, not on every poll
//! - **HTTP API**: snapshot reads and threshold updates as JSON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use battery_guardian::{start_web_server, Guardian, MonitorConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::default();
//!     let web = config.web.clone();
//!     let guardian = Arc::new(Guardian::with_system_providers(config)?);
//!     guardian.start().await?;
//!
//!     let shutdown = async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     };
//!     start_web_server(Arc::clone(&guardian), web, shutdown).await?;
//!     guardian.stop().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod guardian;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod web;

// Re-export public API
pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use guardian::{snapshot_once, Guardian, GuardianBuilder};
pub use metrics::{MetricCategory, MetricProvider, MetricValue, PollPolicy};
pub use monitor::{
    AlertKind, AlertZone, BatterySample, NotifierState, SettingsUpdateRequest, Snapshot,
    SourceState, Thresholds,
};
pub use notify::{DesktopNotifier, LogNotifier, NotificationBackend, NotificationSink};
pub use web::{start_web_server, WebConfig};

/// The default web server bind host
pub const DEFAULT_WEB_HOST: &str = "127.0.0.1";

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8787;
