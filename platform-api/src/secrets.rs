//! Database credential resolution
//!
//! Order, first match wins:
//! 1. Secret Manager `projects/{GCP_PROJECT_ID}/secrets/{DB_SECRET_NAME}/versions/latest`,
//!    when both variables are set. On failure, fall back to `DB_PASSWORD`
//!    if present, otherwise fail.
//! 2. `DB_PASSWORD` (local development).
//! 3. Nothing configured: [`ConfigError::NoCredentialSource`].
//!
//! One attempt per startup; there is no retry here.

use std::sync::Arc;

use async_trait::async_trait;
use platform_gcp::{GcpError, SecretManagerClient};

use crate::config::CredentialConfig;
use crate::error::ConfigError;

/// A resolved database password. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Read access to a managed secret store
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Latest version of `secret` in `project`
    async fn latest(&self, project: &str, secret: &str) -> Result<String, GcpError>;
}

#[async_trait]
impl SecretStore for SecretManagerClient {
    async fn latest(&self, project: &str, secret: &str) -> Result<String, GcpError> {
        self.access_latest(project, secret).await
    }
}

/// Resolves the database credential from the configured sources
pub struct SecretResolver {
    config: CredentialConfig,
    store: Arc<dyn SecretStore>,
}

impl SecretResolver {
    pub fn new(config: CredentialConfig, store: Arc<dyn SecretStore>) -> Self {
        Self { config, store }
    }

    pub async fn resolve(&self) -> Result<Credential, ConfigError> {
        if let Some((project, secret)) = self.config.secret_ref() {
            match self.store.latest(project, secret).await {
                Ok(value) => {
                    tracing::info!(secret = %secret, "Database password fetched from Secret Manager");
                    return Ok(Credential::new(value));
                }
                Err(err) => {
                    tracing::error!(secret = %secret, error = %err, "Failed to fetch secret from Secret Manager");
                    return match &self.config.local_password {
                        Some(password) => {
                            tracing::warn!("Falling back to DB_PASSWORD environment variable");
                            Ok(Credential::new(password.clone()))
                        }
                        None => Err(ConfigError::SecretStore {
                            name: SecretManagerClient::version_name(project, secret, "latest"),
                            source: err,
                        }),
                    };
                }
            }
        }

        if let Some(password) = &self.config.local_password {
            tracing::info!("Using DB_PASSWORD environment variable (local dev mode)");
            return Ok(Credential::new(password.clone()));
        }

        Err(ConfigError::NoCredentialSource)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use platform_gcp::StaticToken;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that returns a fixed answer and counts calls
    pub(crate) struct FakeStore {
        answer: Result<String, u16>,
        pub calls: AtomicUsize,
    }

    impl FakeStore {
        pub(crate) fn ok(value: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(value.to_owned()),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(status),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SecretStore for FakeStore {
        async fn latest(&self, _project: &str, _secret: &str) -> Result<String, GcpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Ok(value) => Ok(value.clone()),
                Err(status) => Err(GcpError::Api {
                    service: "secretmanager",
                    status: *status,
                    body: "denied".into(),
                }),
            }
        }
    }

    fn creds(project: Option<&str>, secret: Option<&str>, local: Option<&str>) -> CredentialConfig {
        CredentialConfig {
            project_id: project.map(str::to_owned),
            secret_name: secret.map(str::to_owned),
            local_password: local.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn secret_store_wins_when_configured() {
        let store = FakeStore::ok("from-secret-manager");
        let resolver = SecretResolver::new(
            creds(Some("acme"), Some("db-password"), Some("local")),
            store.clone(),
        );

        let credential = resolver.resolve().await.unwrap();
        assert_eq!(credential.expose(), "from-secret-manager");
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_failure_falls_back_to_local() {
        let resolver = SecretResolver::new(
            creds(Some("acme"), Some("db-password"), Some("local")),
            FakeStore::failing(403),
        );

        assert_eq!(resolver.resolve().await.unwrap().expose(), "local");
    }

    #[tokio::test]
    async fn store_failure_without_fallback_propagates() {
        let resolver = SecretResolver::new(
            creds(Some("acme"), Some("db-password"), None),
            FakeStore::failing(404),
        );

        match resolver.resolve().await.unwrap_err() {
            ConfigError::SecretStore { name, source } => {
                assert_eq!(name, "projects/acme/secrets/db-password/versions/latest");
                assert_eq!(source.status(), Some(404));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn local_password_used_without_store() {
        let store = FakeStore::ok("unused");
        let resolver = SecretResolver::new(creds(None, Some("db-password"), Some("local")), store.clone());

        assert_eq!(resolver.resolve().await.unwrap().expose(), "local");
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nothing_configured_is_config_error() {
        let resolver = SecretResolver::new(creds(None, None, None), FakeStore::ok("unused"));
        assert!(matches!(
            resolver.resolve().await.unwrap_err(),
            ConfigError::NoCredentialSource
        ));
    }

    #[tokio::test]
    async fn unreachable_secret_manager_falls_back() {
        // Nothing listens on the discard port locally
        let client = SecretManagerClient::with_base_url(
            Arc::new(StaticToken::new("token")),
            "http://127.0.0.1:9",
        );
        let resolver = SecretResolver::new(
            creds(Some("acme"), Some("db-password"), Some("local-fallback")),
            Arc::new(client),
        );

        assert_eq!(resolver.resolve().await.unwrap().expose(), "local-fallback");
    }

    #[test]
    fn credential_debug_is_redacted() {
        assert_eq!(format!("{:?}", Credential::new("hunter2")), "Credential(<redacted>)");
    }
}
