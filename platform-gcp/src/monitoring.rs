//! Cloud Monitoring client - custom metric writes

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::auth::TokenSource;
use crate::error::{check_status, GcpError};

const SERVICE: &str = "monitoring";
pub const DEFAULT_BASE_URL: &str = "https://monitoring.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTimeSeriesRequest {
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Serialize)]
struct TimeSeries {
    metric: Metric,
    resource: MonitoredResource,
    points: Vec<Point>,
}

#[derive(Debug, Serialize)]
struct Metric {
    #[serde(rename = "type")]
    metric_type: String,
}

#[derive(Debug, Serialize)]
struct MonitoredResource {
    #[serde(rename = "type")]
    resource_type: &'static str,
    labels: HashMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
struct Point {
    interval: TimeInterval,
    value: TypedValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeInterval {
    end_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TypedValue {
    /// int64 travels as a decimal string in the JSON mapping
    int64_value: String,
}

/// Cloud Monitoring REST client
#[derive(Clone)]
pub struct MonitoringClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl MonitoringClient {
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

    /// Fully-qualified type for a custom metric name
    pub fn custom_metric_type(name: &str) -> String {
        format!("custom.googleapis.com/{}", name)
    }

    /// Write one INT64 point, stamped now, on the `global` resource.
    pub async fn write_int64_point(
        &self,
        project: &str,
        metric_type: &str,
        value: i64,
    ) -> Result<(), GcpError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/v3/projects/{}/timeSeries", self.base_url, project);
        let request = build_request(project, metric_type, value);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(GcpError::transport(SERVICE))?;

        check_status(SERVICE, response).await?;
        Ok(())
    }
}

fn build_request(project: &str, metric_type: &str, value: i64) -> CreateTimeSeriesRequest {
    let mut labels = HashMap::new();
    labels.insert("project_id", project.to_owned());

    CreateTimeSeriesRequest {
        time_series: vec![TimeSeries {
            metric: Metric {
                metric_type: metric_type.to_owned(),
            },
            resource: MonitoredResource {
                resource_type: "global",
                labels,
            },
            points: vec![Point {
                interval: TimeInterval {
                    end_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                },
                value: TypedValue {
                    int64_value: value.to_string(),
                },
            }],
        }],
    }
}
