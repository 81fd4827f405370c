//! Shared handler state

use std::sync::Arc;

use platform_gcp::{MonitoringClient, StorageClient, TokenSource};

use crate::config::FunctionsConfig;
use crate::metrics::{CloudMonitoringSink, DisabledSink, MetricSink};
use crate::storage::{GcsObjectStore, ObjectStore};

/// Handles to the object store and metric sink, cloned into every handler
#[derive(Clone)]
pub struct FunctionsState {
    inner: Arc<FunctionsStateInner>,
}

struct FunctionsStateInner {
    store: Arc<dyn ObjectStore>,
    metrics: Arc<dyn MetricSink>,
}

impl FunctionsState {
    pub fn new(store: Arc<dyn ObjectStore>, metrics: Arc<dyn MetricSink>) -> Self {
        Self {
            inner: Arc::new(FunctionsStateInner { store, metrics }),
        }
    }

    /// Wire the Cloud Storage and Cloud Monitoring clients from config.
    ///
    /// Without a project id, metric increments are dropped.
    pub fn from_config(config: &FunctionsConfig, tokens: Arc<dyn TokenSource>) -> Self {
        let store = GcsObjectStore::new(StorageClient::new(tokens.clone()), &config.bucket);

        let metrics: Arc<dyn MetricSink> = match &config.project_id {
            Some(project) => Arc::new(CloudMonitoringSink::new(
                MonitoringClient::new(tokens),
                project,
            )),
            None => {
                tracing::warn!("GCP_PROJECT_ID not set, custom metrics disabled");
                Arc::new(DisabledSink)
            }
        };

        Self::new(Arc::new(store), metrics)
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.inner.store
    }

    pub fn metrics(&self) -> &Arc<dyn MetricSink> {
        &self.inner.metrics
    }
}
