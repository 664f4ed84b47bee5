//! HTTP API over the running engine.
//!
//! Clients pull snapshots and push threshold updates; nothing here triggers
//! a fetch.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use handlers::AppState;
pub use router::create_app;

use std::future::Future;
use std::net::SocketAddr;
use tracing::info;

use crate::error::{MonitorError, Result};

/// Serve the API until `shutdown` resolves.
pub async fn start_web_server(
    state: AppState,
    config: WebConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_app(state, &config);

    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| MonitorError::config_error(format!("Invalid bind address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MonitorError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    info!("Battery Guardian API listening on http://{}", addr);
    info!("Snapshot endpoint: http://{}/api/snapshot", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| MonitorError::web_server_error(format!("Server error: {}", e)))?;

    info!("Web server stopped");
    Ok(())
}
