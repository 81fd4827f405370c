//! Health check endpoint
//!
//! Reads only in-memory state, so it answers even when the database is
//! down (load balancer probes depend on that).

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::db::DbStatus;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub environment: String,
    pub database: DbStatus,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: state.service(),
        environment: state.environment().to_owned(),
        database: state.db().status(),
        timestamp: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
    })
}

/// Health routes
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConnectionManager;

    #[tokio::test]
    async fn reports_disconnected_when_uninitialized() {
        let state = AppState::new("test", ConnectionManager::uninitialized());
        let Json(body) = health(State(state)).await;

        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "web-api");
        assert_eq!(body.environment, "test");
        assert_eq!(body.database, DbStatus::Disconnected);
        assert!(body.timestamp > 1_600_000_000.0);
    }
}
