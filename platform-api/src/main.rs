//! web-api entry point

use std::sync::Arc;

use anyhow::Context;
use platform_api::{run_server, AppConfig, AppState, ServerConfig, SERVICE_NAME};
use platform_core::{init_logging, load_dotenv, LoggingConfig, ProcessEnv};
use platform_gcp::{token_source_from_env, SecretManagerClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = load_dotenv();
    init_logging(&LoggingConfig::from_env(SERVICE_NAME, &ProcessEnv))?;
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let config = AppConfig::from_env(&ProcessEnv).context("invalid configuration")?;
    tracing::info!(environment = %config.environment, "Starting web-api service");

    let secrets = SecretManagerClient::new(token_source_from_env(&ProcessEnv));
    let state = AppState::bootstrap(&config, Arc::new(secrets)).await;

    let server = ServerConfig {
        bind_addr: config.bind_addr(),
    };
    run_server(state.clone(), server)
        .await
        .context("server error")?;

    tracing::info!("Shutting down web-api service");
    state.db().close().await;
    Ok(())
}
