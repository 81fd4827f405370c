//! Tracing setup shared by the platform binaries
//!
//! Environment variables:
//!   RUST_LOG        # Log filter (default: info)
//!   LOG_FORMAT      # json (default) | pretty | compact
//!   GCP_PROJECT_ID  # Prefix for `logging.googleapis.com/trace` in json output
//!
//! The json format writes Cloud Logging structured entries: `severity`,
//! `message`, `serviceContext`, plus event and span fields.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{JsonFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::env::{env_var, EnvSource};

/// Span field holding the Cloud Trace id of the current request
pub const TRACE_ID_FIELD: &str = "trace_id";
const TRACE_KEY: &str = "logging.googleapis.com/trace";

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One Cloud Logging JSON entry per line
    #[default]
    Json,
    /// Multi-line human output for local development
    Pretty,
    /// Single-line human output
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Reported as `serviceContext.service`
    pub service: String,
    pub format: LogFormat,
    /// Filter used when RUST_LOG is not set
    pub default_filter: String,
    pub project_id: Option<String>,
}

impl LoggingConfig {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            format: LogFormat::default(),
            default_filter: "info".to_string(),
            project_id: None,
        }
    }

    /// Read LOG_FORMAT and GCP_PROJECT_ID. Unknown formats fall back to JSON.
    pub fn from_env(service: impl Into<String>, source: &impl EnvSource) -> Self {
        let format = env_var(source, "LOG_FORMAT")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        Self {
            format,
            project_id: env_var(source, "GCP_PROJECT_ID"),
            ..Self::new(service)
        }
    }
}

/// Event formatter producing Cloud Logging structured entries.
///
/// Needs span fields recorded as JSON (`JsonFields`).
#[derive(Debug, Clone)]
pub struct CloudLoggingFormat {
    service: String,
    project_id: Option<String>,
}

impl CloudLoggingFormat {
    pub fn new(config: &LoggingConfig) -> Self {
        Self {
            service: config.service.clone(),
            project_id: config.project_id.clone(),
        }
    }

    /// Build the entry for one event; `spans` run outermost first.
    fn entry<'a>(
        &self,
        event: &Event<'_>,
        spans: impl Iterator<Item = &'a str>,
    ) -> Map<String, Value> {
        let mut entry = Map::new();

        // Inner spans override outer ones, event fields override both
        for fields in spans {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(fields) {
                entry.extend(map);
            }
        }
        event.record(&mut JsonVisitor(&mut entry));

        let metadata = event.metadata();
        entry.insert("severity".into(), severity(metadata.level()).into());
        entry.insert(
            "timestamp".into(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true).into(),
        );
        entry.insert("target".into(), metadata.target().into());
        entry.insert(
            "serviceContext".into(),
            serde_json::json!({ "service": self.service }),
        );

        let trace_id = entry
            .get(TRACE_ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_owned);
        if let (Some(project), Some(trace_id)) = (&self.project_id, trace_id) {
            entry.insert(
                TRACE_KEY.into(),
                format!("projects/{}/traces/{}", project, trace_id).into(),
            );
        }

        entry
    }
}

impl<S, N> FormatEvent<S, N> for CloudLoggingFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut span_fields = Vec::new();
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<FormattedFields<N>>() {
                    span_fields.push(fields.fields.clone());
                }
            }
        }

        let entry = self.entry(event, span_fields.iter().map(String::as_str));
        let line = serde_json::to_string(&entry).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

fn severity(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        _ => "DEBUG",
    }
}

struct JsonVisitor<'a>(&'a mut Map<String, Value>);

impl Visit for JsonVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().into(), value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().into(), value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().into(), value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().into(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().into(), value.into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0
            .insert(field.name().into(), format!("{:?}", value).into());
    }
}

/// Install the global tracing subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match config.format {
        LogFormat::Json => builder
            .fmt_fields(JsonFields::new())
            .event_format(CloudLoggingFormat::new(config))
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
    };

    result.map_err(|err| anyhow!(err))
}
