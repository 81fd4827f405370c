//! platform-api: the web API service
//!
//! Startup resolves the database password (Secret Manager, falling back to
//! `DB_PASSWORD`), builds a connection pool and makes sure the `items` table
//! exists. None of that is allowed to take the process down: on failure
//! the service keeps running in degraded mode, `/health` reports
//! `disconnected` and the data endpoints answer 503.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod secrets;
pub mod state;

pub use config::{AppConfig, CredentialConfig, DatabaseConfig, PoolSettings, SERVICE_NAME};
pub use db::{ConnectionManager, DbState, DbStatus};
pub use error::{ConfigError, StartupError};
pub use http::{build_router, run_server, ServerConfig};
pub use secrets::{Credential, SecretResolver, SecretStore};
pub use state::AppState;
