//! Alert delivery.
//!
//! The engine only knows [`NotificationSink`]; the desktop and log sinks
//! here are the two hosts the binary ships with.

mod desktop;

pub use desktop::DesktopNotifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::error::Result;

/// Delivers a title + message alert to the user.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<()>;
}

#[async_trait]
impl<S: NotificationSink + ?Sized> NotificationSink for Arc<S> {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        (**self).notify(title, message).await
    }
}

/// Writes alerts to the log instead of the desktop.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        warn!(target: "battery_guardian::alert", "{}: {}", title, message);
        Ok(())
    }
}

/// Which sink the binary should build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationBackend {
    #[default]
    Desktop,
    Log,
}

impl NotificationBackend {
    pub fn build(self) -> Arc<dyn NotificationSink> {
        match self {
            NotificationBackend::Desktop => Arc::new(DesktopNotifier::new()),
            NotificationBackend::Log => Arc::new(LogNotifier),
        }
    }
}
