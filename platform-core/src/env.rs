//! Environment configuration helpers
//!
//! All service configuration comes from environment variables. A variable
//! that is set but empty is treated the same as an unset one, so
//! `DB_SECRET_NAME=` in a deployment manifest disables the secret store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Error raised when an environment variable holds an unparseable value
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid value for {key}: '{value}' ({reason})")]
pub struct EnvError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Source of configuration values.
///
/// `ProcessEnv` reads the real environment; tests use a `HashMap`.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|v| (*v).to_owned())
    }
}

/// Look up a variable, treating empty values as unset.
pub fn env_var(source: &impl EnvSource, key: &str) -> Option<String> {
    source.get(key).filter(|v| !v.is_empty())
}

/// Look up a variable, falling back to `default` when unset or empty.
pub fn env_or(source: &impl EnvSource, key: &str, default: &str) -> String {
    env_var(source, key).unwrap_or_else(|| default.to_owned())
}

/// Parse a variable, falling back to `default` when unset or empty.
pub fn env_parse<T>(source: &impl EnvSource, key: &str, default: T) -> Result<T, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(source, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| EnvError {
            key: key.to_owned(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Load `./.env` into the process environment.
///
/// Existing variables are never overwritten, so real deployment settings
/// always win over a stray local file. Called before logging is set up,
/// so the caller reports the returned path once tracing is live.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}
