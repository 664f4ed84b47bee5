//! Metric categories, data structures and providers.
//!
//! This module provides the typed payload for every monitored category,
//! the [`MetricProvider`] trait the scheduler polls, and host-backed
//! providers built on sysinfo, the platform battery API, utmp and direct
//! `/sys` access.

pub mod category;
pub mod collector;
pub mod data;
pub mod power;
pub mod provider;
pub mod sessions;
pub mod sysfs;

// Re-export commonly used items
pub use category::{MetricCategory, PollPolicy};
pub use collector::{system_providers, SystemCollector, SystemProvider};
pub use data::*;
pub use provider::{FnProvider, MetricProvider, TimeoutProvider};
