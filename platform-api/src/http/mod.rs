//! HTTP layer
//!
//! Axum server with:
//! - Permissive CORS
//! - Request tracing (Cloud Trace id attached to the request span)
//! - Graceful shutdown
//! - JSON error bodies of the form `{"detail": "..."}`

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, ServerConfig};
