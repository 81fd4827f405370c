//! Service context shared across handlers
//!
//! Built once at startup and handed to the router; handlers only ever read
//! it, so no locking is needed.

use std::sync::Arc;

use crate::config::{AppConfig, SERVICE_NAME};
use crate::db::ConnectionManager;
use crate::secrets::{SecretResolver, SecretStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    environment: String,
    db: ConnectionManager,
}

impl AppState {
    pub fn new(environment: impl Into<String>, db: ConnectionManager) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                environment: environment.into(),
                db,
            }),
        }
    }

    /// Run the startup sequence: resolve the credential through `store`,
    /// then initialize the database. Always yields a usable state.
    pub async fn bootstrap(config: &AppConfig, store: Arc<dyn SecretStore>) -> Self {
        let resolver = SecretResolver::new(config.credentials.clone(), store);
        let db = ConnectionManager::initialize(&config.database, &resolver).await;
        Self::new(config.environment.clone(), db)
    }

    pub fn service(&self) -> &'static str {
        SERVICE_NAME
    }

    pub fn environment(&self) -> &str {
        &self.inner.environment
    }

    pub fn db(&self) -> &ConnectionManager {
        &self.inner.db
    }
}
