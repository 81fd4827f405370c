//! Database lifecycle
//!
//! `initialize` runs once at startup and always returns a manager. It ends
//! in one of two states:
//!
//! - `Ready`: pool built and `items` table verified
//! - `Uninitialized`: credential, pool or schema step failed (logged)
//!
//! There is no way back from `Uninitialized` short of restarting the
//! process. Handlers branch on the state; they never see startup errors.

use serde::Serialize;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::db::{pool, schema};
use crate::error::StartupError;
use crate::secrets::SecretResolver;

/// A pooled connection, returned to the pool when dropped
pub type Session = PoolConnection<Postgres>;

/// Lifecycle state after the startup attempt
#[derive(Debug, Clone)]
pub enum DbState {
    Ready(PgPool),
    Uninitialized,
}

/// Database status as reported by `/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbStatus {
    Connected,
    Disconnected,
}

/// Why no session could be handed out
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Startup never reached Ready
    #[error("database not available")]
    Unavailable,

    /// Ready, but the pool could not supply a connection in time
    #[error("failed to acquire connection: {0}")]
    Pool(#[from] sqlx::Error),
}

/// Owns the pool for the lifetime of the process
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    state: DbState,
}

impl ConnectionManager {
    /// Resolve the credential, open the pool and verify the schema.
    ///
    /// Never fails: any error leaves the manager `Uninitialized`.
    pub async fn initialize(config: &DatabaseConfig, resolver: &SecretResolver) -> Self {
        match Self::try_initialize(config, resolver).await {
            Ok(pool) => {
                tracing::info!(
                    host = %config.host,
                    database = %config.name,
                    "Database connection established successfully"
                );
                Self::ready(pool)
            }
            Err(err) => {
                tracing::error!(
                    kind = err.kind(),
                    error = %err,
                    "Database initialization failed, serving in degraded mode"
                );
                Self::uninitialized()
            }
        }
    }

    async fn try_initialize(
        config: &DatabaseConfig,
        resolver: &SecretResolver,
    ) -> Result<PgPool, StartupError> {
        let credential = resolver.resolve().await?;
        let options = config.connect_options(&credential)?;
        let pool = pool::connect(&config.pool, options).await?;

        if let Err(err) = schema::ensure_schema(&pool).await {
            pool.close().await;
            return Err(err.into());
        }

        Ok(pool)
    }

    /// Manager over an already-built pool
    pub fn ready(pool: PgPool) -> Self {
        Self {
            state: DbState::Ready(pool),
        }
    }

    /// Manager with no usable pool
    pub fn uninitialized() -> Self {
        Self {
            state: DbState::Uninitialized,
        }
    }

    pub fn state(&self) -> &DbState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, DbState::Ready(_))
    }

    /// Status for health reporting; no I/O
    pub fn status(&self) -> DbStatus {
        if self.is_ready() {
            DbStatus::Connected
        } else {
            DbStatus::Disconnected
        }
    }

    /// Borrow a connection for one unit of work.
    ///
    /// `Unavailable` returns immediately. When Ready, waits at most the
    /// pool's acquire timeout.
    pub async fn acquire(&self) -> Result<Session, AcquireError> {
        match &self.state {
            DbState::Ready(pool) => Ok(pool.acquire().await?),
            DbState::Uninitialized => Err(AcquireError::Unavailable),
        }
    }

    /// Close the pool, waiting for checked-out sessions to come back.
    pub async fn close(&self) {
        if let DbState::Ready(pool) = &self.state {
            pool.close().await;
        }
    }
}
