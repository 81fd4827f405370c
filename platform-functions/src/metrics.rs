//! Best-effort metric emission
//!
//! `increment_best_effort` completes the write before returning, so it is
//! done before the response goes out. Failures are logged at error level
//! and otherwise ignored: no retry, no propagation.

use async_trait::async_trait;
use platform_gcp::{GcpError, MonitoringClient};

/// Counter bumped once per processed file
pub const FILES_PROCESSED_METRIC: &str = "files_processed_count";

/// Destination for counter increments
#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn increment(&self, metric: &str) -> Result<(), GcpError>;
}

/// Custom metrics in Cloud Monitoring
#[derive(Clone)]
pub struct CloudMonitoringSink {
    client: MonitoringClient,
    project_id: String,
}

impl CloudMonitoringSink {
    pub fn new(client: MonitoringClient, project_id: impl Into<String>) -> Self {
        Self {
            client,
            project_id: project_id.into(),
        }
    }
}

#[async_trait]
impl MetricSink for CloudMonitoringSink {
    async fn increment(&self, metric: &str) -> Result<(), GcpError> {
        self.client
            .write_int64_point(
                &self.project_id,
                &MonitoringClient::custom_metric_type(metric),
                1,
            )
            .await
    }
}

/// Sink used when no project is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSink;

#[async_trait]
impl MetricSink for DisabledSink {
    async fn increment(&self, metric: &str) -> Result<(), GcpError> {
        tracing::debug!(metric, "Metrics disabled, skipping increment");
        Ok(())
    }
}

/// Increment `metric`, logging and discarding any failure.
pub async fn increment_best_effort(sink: &dyn MetricSink, metric: &str) {
    match sink.increment(metric).await {
        Ok(()) => tracing::info!(metric, "Custom metric incremented successfully"),
        Err(err) => tracing::error!(metric, error = %err, "Failed to write custom metric"),
    }
}
