//! Function error types with IntoResponse
//!
//! Bodies are `{"error": ...}`. Storage failures are logged with detail
//! and answered with a generic message.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use platform_gcp::GcpError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("Method not allowed. Use POST.")]
    MethodNotAllowed,

    #[error("No file provided. Include a 'file' field.")]
    NoFile,

    #[error("No file selected.")]
    EmptyFilename,

    #[error("could not read multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("upload failed: {0}")]
    Upload(#[from] GcpError),

    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

impl FunctionError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NoFile | Self::EmptyFilename | Self::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            Self::Multipart(e) => e.status(),
            Self::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Upload(e) => {
                tracing::error!(error = %e, "Error uploading file");
                "Internal server error".to_string()
            }
            Self::InvalidEvent(reason) => {
                tracing::error!(%reason, "Error processing file event");
                self.to_string()
            }
            Self::Multipart(e) => {
                tracing::warn!(error = %e, "Malformed multipart body");
                e.body_text()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
