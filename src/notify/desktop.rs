//! Desktop notifications via notify-rust.

use async_trait::async_trait;
use notify_rust::Notification;
use tracing::debug;

use super::NotificationSink;
use crate::error::{MonitorError, Result};

const APP_NAME: &str = "Battery Guardian";

/// OS notification sink.
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for DesktopNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        debug!("Desktop notification: {}", title);

        let mut notification = Notification::new();
        notification.summary(title).body(message).appname(&self.app_name);

        // show() blocks on the session bus
        tokio::task::spawn_blocking(move || {
            notification.show().map(|_| ()).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| MonitorError::notification_error(format!("notification task failed: {}", e)))?
        .map_err(MonitorError::notification_error)
    }
}
