//! OAuth access tokens for Google API calls
//!
//! On Cloud Run and Cloud Functions the metadata server hands out tokens
//! for the attached service account. For local development a token can be
//! supplied directly (e.g. `GCP_ACCESS_TOKEN=$(gcloud auth print-access-token)`).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use platform_core::{env_var, EnvSource};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{check_status, GcpError};

const SERVICE: &str = "metadata";
const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before they actually expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Supplies bearer tokens for Google API requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, GcpError>;
}

/// A fixed token, for local development and tests
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, GcpError> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Token source backed by the instance metadata server, with caching
pub struct MetadataServerToken {
    client: reqwest::Client,
    base_url: String,
    cache: Mutex<Option<CachedToken>>,
}

impl MetadataServerToken {
    pub fn new() -> Self {
        Self::with_base_url(format!("http://{}", DEFAULT_METADATA_HOST))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: crate::http_client(),
            base_url: base_url.into(),
            cache: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<TokenResponse, GcpError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, TOKEN_PATH))
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(GcpError::transport(SERVICE))?;

        check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|e| GcpError::invalid(SERVICE, e.to_string()))
    }
}

impl Default for MetadataServerToken {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenSource for MetadataServerToken {
    async fn access_token(&self) -> Result<String, GcpError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(EXPIRY_MARGIN);
        tracing::debug!(expires_in = fresh.expires_in, "Fetched access token from metadata server");

        *cache = Some(CachedToken {
            token: fresh.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(fresh.access_token)
    }
}

/// Pick a token source from the environment.
///
/// `GCP_ACCESS_TOKEN` wins; otherwise the metadata server, honouring
/// `GCE_METADATA_HOST` the way Google's own client libraries do.
pub fn token_source_from_env(source: &impl EnvSource) -> Arc<dyn TokenSource> {
    if let Some(token) = env_var(source, "GCP_ACCESS_TOKEN") {
        return Arc::new(StaticToken::new(token));
    }

    match env_var(source, "GCE_METADATA_HOST") {
        Some(host) => Arc::new(MetadataServerToken::with_base_url(format!("http://{}", host))),
        None => Arc::new(MetadataServerToken::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn;
    use axum::{http::HeaderMap, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn metadata_token_is_cached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            TOKEN_PATH,
            get(move |headers: HeaderMap| {
                let counter = counter.clone();
                async move {
                    assert_eq!(headers["metadata-flavor"], "Google");
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"access_token": "ya29.token", "expires_in": 3599, "token_type": "Bearer"}))
                }
            }),
        );
        let base = spawn(router).await;
        let source = MetadataServerToken::with_base_url(base);

        assert_eq!(source.access_token().await.unwrap(), "ya29.token");
        assert_eq!(source.access_token().await.unwrap(), "ya29.token");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn metadata_errors_surface_status() {
        let router = Router::new().route(
            TOKEN_PATH,
            get(|| async { (axum::http::StatusCode::NOT_FOUND, Json(Value::Null)) }),
        );
        let base = spawn(router).await;

        let err = MetadataServerToken::with_base_url(base)
            .access_token()
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn env_token_takes_priority() {
        let env: std::collections::HashMap<&str, &str> =
            [("GCP_ACCESS_TOKEN", "local-token")].into_iter().collect();
        let source = token_source_from_env(&env);
        assert_eq!(source.access_token().await.unwrap(), "local-token");
    }
}
