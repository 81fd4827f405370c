//! platform-functions: the file functions service
//!
//! - `POST /upload`: multipart upload, stored in the uploads bucket
//! - `POST /events/object-finalized`: CloudEvent from the bucket's
//!   finalize trigger; logs the object and bumps a custom metric
//!
//! Metric writes are best-effort: a failed write is logged and never
//! affects the response.

pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod server;
pub mod state;
pub mod storage;
pub mod upload;

pub use config::{FunctionsConfig, SERVICE_NAME};
pub use error::FunctionError;
pub use events::{process_finalized, FinalizedObject};
pub use metrics::{increment_best_effort, CloudMonitoringSink, DisabledSink, MetricSink, FILES_PROCESSED_METRIC};
pub use server::{build_router, run_server};
pub use state::FunctionsState;
pub use storage::{ByteStream, GcsObjectStore, ObjectStore, StoredObject};
