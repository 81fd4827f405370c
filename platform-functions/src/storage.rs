//! Object storage port and its Cloud Storage implementation

use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use platform_gcp::{GcpError, StorageClient};
use serde::Serialize;

/// Object contents, delivered chunk by chunk
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Where an uploaded object ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    #[serde(rename = "filename")]
    pub name: String,
    pub bucket: String,
}

/// Write access to an object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` as `name`. The stream is consumed as it arrives.
    async fn put_object(
        &self,
        name: &str,
        content_type: &str,
        body: ByteStream,
    ) -> Result<StoredObject, GcpError>;
}

/// Cloud Storage bucket
#[derive(Clone)]
pub struct GcsObjectStore {
    client: StorageClient,
    bucket: String,
}

impl GcsObjectStore {
    pub fn new(client: StorageClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn put_object(
        &self,
        name: &str,
        content_type: &str,
        body: ByteStream,
    ) -> Result<StoredObject, GcpError> {
        let object = self
            .client
            .upload(
                &self.bucket,
                name,
                content_type,
                reqwest::Body::wrap_stream(body),
            )
            .await?;

        Ok(StoredObject {
            name: object.name,
            bucket: object.bucket,
        })
    }
}
