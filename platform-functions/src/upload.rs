//! Upload endpoint
//!
//! Reads the `file` part of a multipart form and streams it under its
//! filename into the configured bucket.

use std::io;

use axum::{
    body::Bytes,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tokio::sync::mpsc;

use crate::error::FunctionError;
use crate::state::FunctionsState;
use crate::storage::{ByteStream, StoredObject};

const FILE_FIELD: &str = "file";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Chunks buffered between the request body and the store
const CHUNK_BUFFER: usize = 4;

/// Largest accepted request body
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// POST /upload
async fn upload(
    State(state): State<FunctionsState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<StoredObject>), FunctionError> {
    // Not a multipart request at all, so there is no file part
    let mut multipart = multipart.map_err(|_| FunctionError::NoFile)?;

    while let Some(field) = multipart.next_field().await? {
        // A `file` part without a filename is a plain form value
        if field.name() != Some(FILE_FIELD) || field.file_name().is_none() {
            continue;
        }

        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => return Err(FunctionError::EmptyFilename),
        };
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();

        tracing::info!(%filename, %content_type, "Uploading file");
        let (tx, body) = channel_body();
        let (stored, forwarded) = tokio::join!(
            state.store().put_object(&filename, &content_type, body),
            forward_chunks(field, tx),
        );
        let size = forwarded?;
        let stored = stored?;
        tracing::info!(filename = %stored.name, bucket = %stored.bucket, size, "File uploaded successfully");

        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(FunctionError::NoFile)
}

type Chunk = Result<Bytes, io::Error>;

/// A bounded channel whose receiving half is the object body
fn channel_body() -> (mpsc::Sender<Chunk>, ByteStream) {
    let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
    let body = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });
    (tx, Box::pin(body))
}

/// Copy the field into `tx`, returning the number of bytes read.
///
/// Stops early without error if the store stops reading.
async fn forward_chunks(mut field: Field<'_>, tx: mpsc::Sender<Chunk>) -> Result<usize, MultipartError> {
    let mut size = 0;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                size += chunk.len();
                if tx.send(Ok(chunk)).await.is_err() {
                    return Ok(size);
                }
            }
            Ok(None) => return Ok(size),
            Err(err) => {
                let _ = tx.send(Err(io::Error::other(err.to_string()))).await;
                return Err(err);
            }
        }
    }
}

async fn method_not_allowed() -> FunctionError {
    FunctionError::MethodNotAllowed
}

/// Upload routes
pub fn router() -> Router<FunctionsState> {
    Router::new()
        .route("/upload", post(upload).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
