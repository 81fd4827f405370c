//! Startup error types for platform-api
//!
//! Neither of these ever reaches `main`: the connection manager logs them
//! and drops into degraded mode. Request-time errors live in `http::error`.

use platform_gcp::GcpError;
use thiserror::Error;

/// Missing or invalid credential configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no credential source configured: set DB_SECRET_NAME + GCP_PROJECT_ID or DB_PASSWORD")]
    NoCredentialSource,

    #[error("failed to read secret {name}: {source}")]
    SecretStore {
        name: String,
        #[source]
        source: GcpError,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Anything that can go wrong while bringing the database up
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Pool construction or schema verification failed
    #[error("database connectivity: {0}")]
    Connectivity(#[from] sqlx::Error),
}

impl StartupError {
    /// Short label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Connectivity(_) => "connectivity",
        }
    }
}
