//! API error types with IntoResponse
//!
//! Errors are converted to `{"detail": ...}` JSON bodies. Store failures
//! are logged with full detail and answered with a generic message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::{AcquireError, DbError};
use crate::models::ValidationError;

const UNAVAILABLE_DETAIL: &str = "Database not available";
const INTERNAL_DETAIL: &str = "Internal server error";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Database never came up (503)
    Unavailable,

    /// Validation failed (400)
    Validation(ValidationError),

    /// Request body could not be read as JSON (status chosen by axum)
    Rejected { status: StatusCode, message: String },

    /// Database error (500, logged)
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Unavailable => {
                tracing::warn!("Database not available");
                (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_DETAIL.to_string())
            }
            Self::Validation(e) => {
                tracing::debug!(error = %e, "Rejected invalid request");
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            Self::Rejected { status, message } => {
                tracing::debug!(%status, error = %message, "Rejected malformed body");
                (status, message)
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_DETAIL.to_string())
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

impl From<AcquireError> for ApiError {
    fn from(e: AcquireError) -> Self {
        match e {
            AcquireError::Unavailable => Self::Unavailable,
            AcquireError::Pool(source) => Self::Database(DbError::Sqlx(source)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unavailable_is_503_with_detail() {
        let response = ApiError::Unavailable.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["detail"], "Database not available");
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let response = ApiError::Validation(ValidationError::Empty { field: "name" }).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "name cannot be empty");
    }

    #[tokio::test]
    async fn database_error_hides_detail() {
        let err = ApiError::from(DbError::Sqlx(sqlx::Error::Protocol(
            "relation \"items\" does not exist".into(),
        )));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Internal server error");
        assert!(!body.to_string().contains("relation"));
    }

    #[tokio::test]
    async fn acquire_errors_map_by_cause() {
        assert!(matches!(
            ApiError::from(AcquireError::Unavailable),
            ApiError::Unavailable
        ));
        assert!(matches!(
            ApiError::from(AcquireError::Pool(sqlx::Error::PoolTimedOut)),
            ApiError::Database(_)
        ));
    }
}
