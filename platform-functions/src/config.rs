//! Configuration from environment variables
//!
//! - `GCS_BUCKET_NAME`: bucket uploads land in
//! - `GCP_PROJECT_ID`: project metrics are written to (metrics off if unset)
//! - `PORT`: HTTP listen port (default 8080)

use std::net::SocketAddr;

use platform_core::{env_or, env_parse, env_var, EnvError, EnvSource};

/// Reported in log entries as `serviceContext.service`
pub const SERVICE_NAME: &str = "file-functions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionsConfig {
    pub bucket: String,
    pub project_id: Option<String>,
    pub port: u16,
}

impl FunctionsConfig {
    pub fn from_env(source: &impl EnvSource) -> Result<Self, EnvError> {
        Ok(Self {
            bucket: env_or(source, "GCS_BUCKET_NAME", ""),
            project_id: env_var(source, "GCP_PROJECT_ID"),
            port: env_parse(source, "PORT", 8080)?,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn reads_bucket_and_project() {
        let env: HashMap<&str, &str> = [
            ("GCS_BUCKET_NAME", "acme-uploads-dev"),
            ("GCP_PROJECT_ID", "acme-dev"),
        ]
        .into_iter()
        .collect();
        let config = FunctionsConfig::from_env(&env).unwrap();

        assert_eq!(config.bucket, "acme-uploads-dev");
        assert_eq!(config.project_id.as_deref(), Some("acme-dev"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn project_is_optional() {
        let env: HashMap<&str, &str> = HashMap::new();
        let config = FunctionsConfig::from_env(&env).unwrap();
        assert!(config.project_id.is_none());
        assert!(config.bucket.is_empty());
    }
}
