use std::time::Duration;
use thiserror::Error;

/// Why a URL was rejected before any connection was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    /// Not a URL at all
    ParseError,
    /// No host to connect to
    MissingAuthority,
    /// Relative URL; the agent address must be absolute
    MissingScheme,
}

/// Errors raised while talking to the agent over HTTP
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    #[error("failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// No response within the client or per-call deadline
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, reset, DNS failure and the like
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Decompressed body went past `max_body_size`
    #[error("response body exceeds {limit} bytes (read {actual})")]
    BodyTooLarge { limit: usize, actual: usize },

    /// Agent answered with a non-2xx status. The preview is truncated and
    /// meant for logs; Consul puts its reason in plain text here.
    #[error("HTTP {status}: {body_preview}")]
    HttpStatus {
        status: http::StatusCode,
        body_preview: String,
        content_type: Option<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Concurrency limit reached; the request was shed without queueing
    #[error("client overloaded: too many requests in flight")]
    Overloaded,

    /// The buffer worker is gone
    #[error("client service closed")]
    ServiceClosed,

    /// Match on `kind`; `reason` is for humans.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUri {
        url: String,
        kind: InvalidUriKind,
        reason: String,
    },

    /// Scheme refused by the configured [`TransportSecurity`](crate::TransportSecurity)
    #[error("URL scheme '{scheme}' rejected: {reason}")]
    InvalidScheme { scheme: String, reason: String },
}

impl HttpError {
    /// HTTP status of a non-2xx response, if this error carries one.
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}
