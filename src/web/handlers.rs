//! HTTP handlers for API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::error::MonitorError;
use crate::guardian::Guardian;
use crate::metrics::MetricCategory;
use crate::monitor::{SettingsUpdateRequest, Snapshot, SourceState, Thresholds};

/// Shared state handed to every handler.
pub type AppState = Arc<Guardian>;

/// JSON error body with a status code.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        let status = match err {
            MonitorError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            MonitorError::ParseError(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Current state of every category.
pub async fn get_snapshot(State(guardian): State<AppState>) -> Json<Snapshot> {
    Json(guardian.snapshot())
}

/// Current state of one category.
pub async fn get_source(
    State(guardian): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Arc<SourceState>>, ApiError> {
    let category: MetricCategory = name.parse()?;
    Ok(Json(guardian.source(category)))
}

pub async fn get_thresholds(State(guardian): State<AppState>) -> Json<Thresholds> {
    Json(guardian.thresholds())
}

/// Replace the battery limits.
pub async fn put_settings(
    State(guardian): State<AppState>,
    payload: Result<Json<SettingsUpdateRequest>, JsonRejection>,
) -> Result<Json<Thresholds>, ApiError> {
    let Json(request) = payload?;
    debug!("Settings update requested: {:?}", request);
    Ok(Json(guardian.update_settings(request)?))
}

/// Health check endpoint.
pub async fn health_check(State(guardian): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = guardian.snapshot();
    Json(json!({
        "status": "ok",
        "service": "battery-guardian",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "failing_sources": snapshot.failing().map(|s| s.category).collect::<Vec<_>>(),
        "alert_latch": guardian.notifier_state().last_fired_zone,
    }))
}
