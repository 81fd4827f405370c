//! Error type for Google API calls

use thiserror::Error;

/// Longest response body kept in an error, to avoid dumping payloads into logs
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Error)]
pub enum GcpError {
    /// Connection, timeout or body read failure
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response from the API
    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// 2xx response that could not be interpreted
    #[error("invalid {service} response: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },
}

impl GcpError {
    pub(crate) fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Transport { service, source }
    }

    pub(crate) fn invalid(service: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            reason: reason.into(),
        }
    }

    /// HTTP status of an API error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            Self::InvalidResponse { .. } => None,
        }
    }
}

/// Turn a non-2xx response into [`GcpError::Api`], passing successes through.
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, GcpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GcpError::Api {
        service,
        status: status.as_u16(),
        body: truncate(body, MAX_ERROR_BODY),
    })
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() <= max {
        return text;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("...");
    text
}
