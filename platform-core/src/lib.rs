//! platform-core: ambient plumbing shared by the platform services
//!
//! - `env`: `.env` loading and typed environment lookups
//! - `logging`: tracing subscriber setup (JSON for log ingestion, pretty for local dev)
//! - `shutdown`: Ctrl+C / SIGTERM future for graceful server shutdown

pub mod env;
pub mod logging;
pub mod shutdown;

pub use env::{env_or, env_parse, env_var, load_dotenv, EnvError, EnvSource, ProcessEnv};
pub use logging::{init_logging, CloudLoggingFormat, LogFormat, LoggingConfig, TRACE_ID_FIELD};
pub use shutdown::shutdown_signal;
