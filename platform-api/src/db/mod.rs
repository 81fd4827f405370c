//! Database layer - lifecycle, pool, schema and repositories
//!
//! - `manager`: Ready/Uninitialized lifecycle and session acquisition
//! - `pool`: sqlx pool construction from [`PoolSettings`](crate::config::PoolSettings)
//! - `schema`: explicit table definitions, created if absent
//! - `repos`: one repository per table, operating on a borrowed session

pub mod manager;
pub mod pool;
pub mod repos;
pub mod schema;

pub use manager::{AcquireError, ConnectionManager, DbState, DbStatus, Session};
pub use pool::{connect, pool_options};
pub use repos::*;

/// Error from a repository operation
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}
