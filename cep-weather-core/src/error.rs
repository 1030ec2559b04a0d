use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong while resolving a CEP to a temperature.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The CEP is not exactly eight ASCII digits. No provider was called.
    #[error("invalid zipcode")]
    InvalidZipCode,

    /// The CEP is well-formed but the location provider does not know it.
    #[error("can not find zipcode")]
    ZipCodeNotFound,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// A failure talking to one of the third-party services.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{service} response is malformed: {reason}")]
    Malformed {
        service: &'static str,
        reason: &'static str,
    },
}

impl UpstreamError {
    pub fn service(&self) -> &'static str {
        match self {
            UpstreamError::Transport { service, .. }
            | UpstreamError::Status { service, .. }
            | UpstreamError::Decode { service, .. }
            | UpstreamError::Malformed { service, .. } => *service,
        }
    }

    /// Whether the same request could plausibly succeed later.
    ///
    /// Nothing retries today; callers only use this to pick a log level.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Transport { source, .. } => {
                source.is_timeout() || source.is_connect()
            }
            UpstreamError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            UpstreamError::Decode { .. } | UpstreamError::Malformed { .. } => false,
        }
    }
}

/// Keep upstream bodies short enough to be useful in a log line.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
