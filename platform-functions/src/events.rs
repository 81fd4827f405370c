//! Object-finalized CloudEvents
//!
//! Accepts both CloudEvents HTTP content modes:
//! - binary: `ce-*` headers, body is the storage object JSON
//! - structured: `application/cloudevents+json`, object under `data`

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use serde_json::{Map, Value};

use crate::error::FunctionError;
use crate::metrics::{increment_best_effort, MetricSink, FILES_PROCESSED_METRIC};
use crate::state::FunctionsState;

const UNKNOWN: &str = "unknown";
const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

/// Storage object fields carried by a finalize event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedObject {
    pub bucket: String,
    pub name: String,
    pub size: String,
    pub content_type: String,
    pub time_created: String,
    pub metageneration: String,
}

impl FinalizedObject {
    /// Read the object fields from the event data, `unknown` for any that are missing.
    pub fn from_data(data: &Map<String, Value>) -> Self {
        let field = |key: &str| match data.get(key) {
            None | Some(Value::Null) => UNKNOWN.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        Self {
            bucket: field("bucket"),
            name: field("name"),
            size: field("size"),
            content_type: field("contentType"),
            time_created: field("timeCreated"),
            metageneration: field("metageneration"),
        }
    }

    /// Parse an HTTP request body in either content mode.
    pub fn from_request(headers: &HeaderMap, body: &[u8]) -> Result<Self, FunctionError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| FunctionError::InvalidEvent(e.to_string()))?;

        let data = if is_structured(headers) {
            value.get("data").cloned().unwrap_or(Value::Null)
        } else {
            value
        };

        match data {
            Value::Object(map) => Ok(Self::from_data(&map)),
            _ => Err(FunctionError::InvalidEvent(
                "event data is not a JSON object".into(),
            )),
        }
    }
}

fn is_structured(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(STRUCTURED_CONTENT_TYPE))
}

/// Log the object and count it. A failed metric write does not fail processing.
pub async fn process_finalized(object: &FinalizedObject, metrics: &dyn MetricSink) {
    tracing::info!(
        file = %object.name,
        bucket = %object.bucket,
        size = %object.size,
        content_type = %object.content_type,
        created = %object.time_created,
        metageneration = %object.metageneration,
        "Processing file"
    );

    increment_best_effort(metrics, FILES_PROCESSED_METRIC).await;

    tracing::info!(file = %object.name, "File processing completed successfully");
}

/// POST /events/object-finalized
async fn object_finalized(
    State(state): State<FunctionsState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, FunctionError> {
    let event_id = headers
        .get("ce-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or(UNKNOWN);
    tracing::debug!(event_id, "Received finalize event");

    let object = FinalizedObject::from_request(&headers, &body)?;
    process_finalized(&object, state.metrics().as_ref()).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Event routes
pub fn router() -> Router<FunctionsState> {
    Router::new().route("/events/object-finalized", post(object_finalized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn reads_every_field() {
        let parsed = FinalizedObject::from_data(&object(json!({
            "bucket": "acme-uploads-dev",
            "name": "reports/q3.pdf",
            "size": "52113",
            "contentType": "application/pdf",
            "timeCreated": "2024-03-01T12:30:05.250Z",
            "metageneration": "1",
        })));

        assert_eq!(parsed.bucket, "acme-uploads-dev");
        assert_eq!(parsed.name, "reports/q3.pdf");
        assert_eq!(parsed.size, "52113");
        assert_eq!(parsed.content_type, "application/pdf");
        assert_eq!(parsed.time_created, "2024-03-01T12:30:05.250Z");
        assert_eq!(parsed.metageneration, "1");
    }

    #[test]
    fn missing_fields_are_unknown() {
        let parsed = FinalizedObject::from_data(&object(json!({ "name": "a.txt", "size": 12 })));

        assert_eq!(parsed.name, "a.txt");
        assert_eq!(parsed.size, "12");
        assert_eq!(parsed.bucket, "unknown");
        assert_eq!(parsed.content_type, "unknown");
        assert_eq!(parsed.metageneration, "unknown");
    }

    #[test]
    fn structured_mode_reads_data() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, STRUCTURED_CONTENT_TYPE.parse().unwrap());
        let body = json!({
            "specversion": "1.0",
            "type": "google.cloud.storage.object.v1.finalized",
            "data": { "bucket": "b", "name": "n" },
        });

        let parsed = FinalizedObject::from_request(&headers, body.to_string().as_bytes()).unwrap();
        assert_eq!(parsed.bucket, "b");
        assert_eq!(parsed.name, "n");
    }

    #[test]
    fn non_object_data_is_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            FinalizedObject::from_request(&headers, b"[1, 2]"),
            Err(FunctionError::InvalidEvent(_))
        ));
        assert!(matches!(
            FinalizedObject::from_request(&headers, b"not json"),
            Err(FunctionError::InvalidEvent(_))
        ));
    }
}
