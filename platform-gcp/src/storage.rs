//! Cloud Storage client - single-request media uploads

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::TokenSource;
use crate::error::{check_status, GcpError};

const SERVICE: &str = "storage";
pub const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

/// Object resource returned by the upload call (subset of fields)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub name: String,
    pub bucket: String,
    /// Decimal string, as the JSON API encodes uint64
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub time_created: Option<String>,
}

/// Cloud Storage JSON API client
#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl StorageClient {
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

    /// Upload `body` as object `name` in `bucket`, replacing any existing object.
    pub async fn upload(
        &self,
        bucket: &str,
        name: &str,
        content_type: &str,
        body: impl Into<reqwest::Body>,
    ) -> Result<ObjectMetadata, GcpError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/upload/storage/v1/b/{}/o", self.base_url, bucket);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .query(&[("uploadType", "media"), ("name", name)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use crate::test_support::spawn;
    use axum::{
        body::Bytes,
        extract::{Path, Query},
        http::HeaderMap,
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn uploads_with_media_type_and_name() {
        let router = Router::new().route(
            "/upload/storage/v1/b/{bucket}/o",
            post(
                |Path(bucket): Path<String>,
                 Query(query): Query<HashMap<String, String>>,
                 headers: HeaderMap,
                 body: Bytes| async move {
                    assert_eq!(query["uploadType"], "media");
                    assert_eq!(headers["content-type"], "text/plain");
                    Json(json!({
                        "name": query["name"],
                        "bucket": bucket,
                        "size": body.len().to_string(),
                        "contentType": "text/plain"
                    }))
                },
            ),
        );
        let base = spawn(router).await;
        let client = StorageClient::with_base_url(Arc::new(StaticToken::new("t")), base);

        let object = client
            .upload("uploads-dev", "notes/readme file.txt", "text/plain", "hello world")
            .await
            .unwrap();

        assert_eq!(object.name, "notes/readme file.txt");
        assert_eq!(object.bucket, "uploads-dev");
        assert_eq!(object.size.as_deref(), Some("11"));
    }
}
