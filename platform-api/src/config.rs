//! Service configuration, read from environment variables
//!
//! | Variable          | Default         |
//! |-------------------|-----------------|
//! | `ENVIRONMENT`     | `dev`           |
//! | `GCP_PROJECT_ID`  | unset           |
//! | `DB_HOST`         | `localhost`     |
//! | `DB_PORT`         | `5432`          |
//! | `DB_NAME`         | `platform_db`   |
//! | `DB_USER`         | `platform_user` |
//! | `DB_SECRET_NAME`  | unset           |
//! | `DB_PASSWORD`     | unset           |
//! | `PORT`            | `8080`          |

use std::net::SocketAddr;
use std::time::Duration;

use platform_core::{env_or, env_parse, env_var, EnvError, EnvSource};
use sqlx::postgres::PgConnectOptions;

use crate::error::ConfigError;
use crate::secrets::Credential;

/// Name reported by `/health`
pub const SERVICE_NAME: &str = "web-api";

/// Top-level configuration for the web API
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment label (dev, staging, prod)
    pub environment: String,
    pub database: DatabaseConfig,
    pub credentials: CredentialConfig,
    /// HTTP listen port
    pub port: u16,
}

/// Where the database password comes from
#[derive(Clone, Default)]
pub struct CredentialConfig {
    pub project_id: Option<String>,
    pub secret_name: Option<String>,
    /// Local development fallback (`DB_PASSWORD`)
    pub local_password: Option<String>,
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("project_id", &self.project_id)
            .field("secret_name", &self.secret_name)
            .field("local_password", &self.local_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Database location and pool tuning
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    /// Raw `DB_PORT`; validated when the pool is built so that a bad value
    /// degrades the service instead of aborting startup
    pub port: String,
    pub name: String,
    pub user: String,
    pub pool: PoolSettings,
}

/// Connection pool knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Connections kept open
    pub size: u32,
    /// Extra connections allowed under load, reaped once idle
    pub max_overflow: u32,
    /// Connections older than this are closed and replaced
    pub recycle: Duration,
    /// Ping a pooled connection before handing it out
    pub pre_ping: bool,
    /// Longest wait for a free connection before the acquisition fails
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            size: 5,
            max_overflow: 2,
            recycle: Duration::from_secs(1800),
            pre_ping: true,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    /// Read configuration from `source`.
    ///
    /// Only `PORT` can fail here; everything database-related is checked
    /// later by the connection manager.
    pub fn from_env(source: &impl EnvSource) -> Result<Self, EnvError> {
        Ok(Self {
            environment: env_or(source, "ENVIRONMENT", "dev"),
            database: DatabaseConfig::from_env(source),
            credentials: CredentialConfig::from_env(source),
            port: env_parse(source, "PORT", 8080)?,
        })
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

impl CredentialConfig {
    pub fn from_env(source: &impl EnvSource) -> Self {
        Self {
            project_id: env_var(source, "GCP_PROJECT_ID"),
            secret_name: env_var(source, "DB_SECRET_NAME"),
            local_password: env_var(source, "DB_PASSWORD"),
        }
    }

    /// Secret Manager coordinates, when both halves are configured
    pub fn secret_ref(&self) -> Option<(&str, &str)> {
        match (&self.project_id, &self.secret_name) {
            (Some(project), Some(secret)) => Some((project.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env(source: &impl EnvSource) -> Self {
        Self {
            host: env_or(source, "DB_HOST", "localhost"),
            port: env_or(source, "DB_PORT", "5432"),
            name: env_or(source, "DB_NAME", "platform_db"),
            user: env_or(source, "DB_USER", "platform_user"),
            pool: PoolSettings::default(),
        }
    }

    /// Connection options for this database, authenticated with `credential`.
    ///
    /// Built field by field rather than through a URL so passwords never
    /// need escaping.
    pub fn connect_options(&self, credential: &Credential) -> Result<PgConnectOptions, ConfigError> {
        let port: u16 = self
            .port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "DB_PORT",
                value: self.port.clone(),
            })?;

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(port)
            .database(&self.name)
            .username(&self.user)
            .password(credential.expose())
            .application_name(SERVICE_NAME))
    }
}
