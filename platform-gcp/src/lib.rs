//! platform-gcp: thin REST clients for the Google Cloud APIs the platform uses
//!
//! Direct HTTP integration (no generated SDK):
//! - Secret Manager: read the latest version of a secret
//! - Cloud Storage: media upload of a single object
//! - Cloud Monitoring: write a custom metric point
//!
//! Every client takes a [`TokenSource`] for OAuth access tokens and an
//! overridable base URL, so tests can point them at a local fake.

pub mod auth;
pub mod error;
pub mod monitoring;
pub mod secret_manager;
pub mod storage;

use std::time::Duration;

pub use auth::{token_source_from_env, MetadataServerToken, StaticToken, TokenSource};
pub use error::GcpError;
pub use monitoring::MonitoringClient;
pub use secret_manager::SecretManagerClient;
pub use storage::{ObjectMetadata, StorageClient};

/// Upper bound for any single API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Shared HTTP client configuration for all Google API calls
pub(crate) fn http_client() -> reqwest::Client {
    build_client(
        reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT),
    )
}

/// Build `builder`, falling back to a default client when it is rejected.
fn build_client(builder: reqwest::ClientBuilder) -> reqwest::Client {
    match builder.build() {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(
                error = %err,
                "HTTP client configuration rejected, using defaults without timeouts"
            );
            reqwest::Client::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_configuration_still_yields_a_client() {
        // A newline is not a valid header value, so build() fails
        let builder = reqwest::Client::builder().user_agent("platform\nagent");
        let client = build_client(builder);

        assert!(client.get("http://127.0.0.1:9/").build().is_ok());
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral local port, returning its base URL.
    pub async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
