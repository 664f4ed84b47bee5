//! Web application router and middleware setup.

use axum::{
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::web::config::WebConfig;
use crate::web::handlers::{self, AppState};

/// Create the axum application with all routes and middleware.
pub fn create_app(state: AppState, config: &WebConfig) -> Router {
    let mut app = Router::new()
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/snapshot/:category", get(handlers::get_source))
        .route("/api/thresholds", get(handlers::get_thresholds))
        .route("/api/settings", put(handlers::put_settings))
        .route("/api/health", get(handlers::health_check))
        .with_state(state);

    if config.enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::guardian::Guardian;
    use crate::metrics::MetricCategory;
    use crate::notify::LogNotifier;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let guardian = Guardian::builder(MonitorConfig::default())
            .sink(Arc::new(LogNotifier))
            .build()
            .unwrap();
        create_app(Arc::new(guardian), &WebConfig::default())
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn put_settings(body: &str) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri("/api/settings")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_lists_every_category() {
        let response = app()
            .oneshot(Request::get("/api/snapshot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let sources = body["sources"].as_object().unwrap();
        assert_eq!(sources.len(), MetricCategory::ALL.len());
        assert!(sources["systemOS"]["last_value"].is_null());
    }

    #[tokio::test]
    async fn test_single_source_and_unknown_category() {
        let response = app()
            .oneshot(Request::get("/api/snapshot/battery").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["category"], "battery");

        let response = app()
            .oneshot(Request::get("/api/snapshot/gpu").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_settings_update() {
        let app = app();

        let response = app
            .clone()
            .oneshot(put_settings(r#"{"min": 90, "max": 80}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .clone()
            .oneshot(put_settings(r#"{"min": 30, "max": 85}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/api/thresholds").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["min"], 30);
        assert_eq!(body["max"], 85);
    }

    #[tokio::test]
    async fn test_malformed_settings_get_json_error() {
        let app = app();

        let response = app
            .clone()
            .oneshot(put_settings(r#"{"min": 25.5, "max": 80}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(response).await["error"].is_string());

        let response = app.clone().oneshot(put_settings("{")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());

        let response = app
            .oneshot(Request::get("/api/thresholds").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await["min"], 25);
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "battery-guardian");
    }
}
