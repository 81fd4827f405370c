//! file-functions entry point

use anyhow::Context;
use platform_core::{init_logging, load_dotenv, LoggingConfig, ProcessEnv};
use platform_functions::{run_server, FunctionsConfig, FunctionsState, SERVICE_NAME};
use platform_gcp::token_source_from_env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = load_dotenv();
    init_logging(&LoggingConfig::from_env(SERVICE_NAME, &ProcessEnv))?;
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let config = FunctionsConfig::from_env(&ProcessEnv).context("invalid configuration")?;
    if config.bucket.is_empty() {
        tracing::warn!("GCS_BUCKET_NAME not set, uploads will fail");
    }
    tracing::info!(bucket = %config.bucket, "Starting file functions");

    let state = FunctionsState::from_config(&config, token_source_from_env(&ProcessEnv));
    run_server(state, config.bind_addr())
        .await
        .context("server error")?;

    Ok(())
}
