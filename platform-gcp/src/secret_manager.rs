//! Secret Manager client
//!
//! Only the read path is needed: `versions/{version}:access` returns the
//! payload base64-encoded, which we decode to a UTF-8 string.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::auth::TokenSource;
use crate::error::{check_status, GcpError};

const SERVICE: &str = "secretmanager";
pub const DEFAULT_BASE_URL: &str = "https://secretmanager.googleapis.com";

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: String,
}

/// Secret Manager REST client
#[derive(Clone)]
pub struct SecretManagerClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl SecretManagerClient {
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_base_url(tokens, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(tokens: Arc<dyn TokenSource>, base_url: impl Into<String>) -> Self {
        Self {
            client: crate::http_client(),
            base_url: base_url.into(),
            tokens,
        }
    }

    /// Resource name of a secret version
    pub fn version_name(project: &str, secret: &str, version: &str) -> String {
        format!("projects/{}/secrets/{}/versions/{}", project, secret, version)
    }

    /// Read the latest enabled version of `secret`.
    pub async fn access_latest(&self, project: &str, secret: &str) -> Result<String, GcpError> {
        self.access_version(project, secret, "latest").await
    }

    /// Read a specific version of `secret` as UTF-8 text.
    pub async fn access_version(
        &self,
        project: &str,
        secret: &str,
        version: &str,
    ) -> Result<String, GcpError> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/v1/{}:access",
            self.base_url,
            Self::version_name(project, secret, version)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(GcpError::transport(SERVICE))?;

        let body: AccessSecretVersionResponse = check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|e| GcpError::invalid(SERVICE, e.to_string()))?;

        let bytes = STANDARD
            .decode(body.payload.data.as_bytes())
            .map_err(|e| GcpError::invalid(SERVICE, format!("payload is not base64: {}", e)))?;

        String::from_utf8(bytes)
            .map_err(|_| GcpError::invalid(SERVICE, "payload is not valid UTF-8"))
    }
}
