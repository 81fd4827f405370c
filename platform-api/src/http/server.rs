//! Axum server setup
//!
//! Server skeleton with:
//! - Permissive CORS (browser clients on any origin)
//! - Tracing middleware, one span per request
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use platform_core::shutdown_signal;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::routes;
use crate::state::AppState;

/// Header Cloud Run uses to propagate trace context: `TRACE_ID/SPAN_ID;o=1`
const TRACE_HEADER: &str = "x-cloud-trace-context";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:8080)
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::items::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

fn request_span(request: &Request<Body>) -> Span {
    let trace_id = request
        .headers()
        .get(TRACE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split('/').next())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        trace_id = %trace_id,
    )
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run_server(state: AppState, config: ServerConfig) -> std::io::Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, CredentialConfig, PoolSettings};
    use crate::db::{pool, ConnectionManager};
    use crate::http::routes::items::ItemResponse;
    use crate::secrets::tests::FakeStore;
    use crate::secrets::Credential;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::Response;
    use platform_core::ProcessEnv;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::time::Duration;
    use tower::ServiceExt;

    fn degraded() -> Router {
        build_router(AppState::new("test", ConnectionManager::uninitialized()))
    }

    /// Ready state over a pool whose database does not exist: any session
    /// acquisition fails, so a 4xx proves the pool was never touched.
    fn ready_without_database() -> Router {
        let env: HashMap<&str, &str> = [("DB_HOST", "127.0.0.1"), ("DB_PORT", "9")]
            .into_iter()
            .collect();
        let config = crate::config::DatabaseConfig::from_env(&env);
        let settings = PoolSettings {
            acquire_timeout: Duration::from_secs(1),
            ..PoolSettings::default()
        };
        let options = config.connect_options(&Credential::new("pw")).unwrap();
        let pool = pool::pool_options(&settings)
            .min_connections(0)
            .connect_lazy_with(options);

        build_router(AppState::new("test", ConnectionManager::ready(pool)))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[tokio::test]
    async fn health_ok_when_degraded() {
        let response = degraded().oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "web-api");
        assert_eq!(body["environment"], "test");
        assert_eq!(body["database"], "disconnected");
        assert!(body["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn health_reports_connected_when_ready() {
        let response = ready_without_database().oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["database"], "connected");
    }

    #[tokio::test]
    async fn list_items_unavailable_when_degraded() {
        let response = degraded().oneshot(get("/items")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["detail"], "Database not available");
    }

    #[tokio::test]
    async fn create_item_unavailable_before_body_is_inspected() {
        let app = degraded();

        let response = app
            .clone()
            .oneshot(post_json("/items", r#"{"name": "widget"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        // Even a malformed body gets 503, not a parse error
        let response = app.oneshot(post_json("/items", "{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn empty_name_rejected_before_repository() {
        let response = ready_without_database()
            .oneshot(post_json("/items", r#"{"name": "", "description": "x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "name cannot be empty");
    }

    #[tokio::test]
    async fn missing_name_is_client_error() {
        let response = ready_without_database()
            .oneshot(post_json("/items", r#"{"description": "x"}"#))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn store_failure_is_generic_500() {
        let response = ready_without_database().oneshot(get("/items")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["detail"], "Internal server error");
    }

    #[tokio::test]
    async fn no_credential_source_means_disconnected() {
        let env: HashMap<&str, &str> = HashMap::new();
        let config = AppConfig::from_env(&env).unwrap();
        assert!(config.credentials.secret_ref().is_none());

        let store = FakeStore::ok("unused");
        let state = AppState::bootstrap(&config, store.clone()).await;
        assert!(!state.db().is_ready());

        let response = build_router(state).oneshot(get("/health")).await.unwrap();
        assert_eq!(body_json(response).await["database"], "disconnected");
        assert_eq!(store.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_then_list_returns_new_item_first() {
        // Uses DB_HOST/DB_PORT/DB_NAME/DB_USER/DB_PASSWORD from the environment
        let config = AppConfig::from_env(&ProcessEnv).unwrap();
        assert!(CredentialConfig::from_env(&ProcessEnv).local_password.is_some());
        let state = AppState::bootstrap(&config, FakeStore::failing(404)).await;
        assert!(state.db().is_ready(), "database must be reachable");
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/items",
                r#"{"name": "widget", "description": "a test widget"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let created: ItemResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert!(created.id > 0);
        assert_eq!(created.name, "widget");
        assert_eq!(created.description.as_deref(), Some("a test widget"));
        assert!(created.created_at.is_some());

        let response = app.oneshot(get("/items")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed: Vec<ItemResponse> = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(listed[0].id, created.id);
    }
}
