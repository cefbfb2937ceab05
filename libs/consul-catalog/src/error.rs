use crate::request::RequestDescriptor;
use consul_http::HttpError;
use thiserror::Error;

/// Errors returned by catalog operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConsulError {
    /// The call was rejected before reaching the transport.
    ///
    /// `request` is the descriptor as far as it was built when validation failed.
    #[error("{message}")]
    Validation {
        message: String,
        /// Option that failed validation, when a single one is to blame
        field: Option<&'static str>,
        request: Box<RequestDescriptor>,
    },

    /// Failure reported by the HTTP transport, passed through unchanged
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// The configured agent address does not form a valid URL
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A response body could not be decoded as JSON
    #[error("failed to decode response for {operation}: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ConsulError {
    /// Build a validation error carrying the attempted request
    #[must_use]
    pub fn validation(
        message: impl Into<String>,
        field: Option<&'static str>,
        request: RequestDescriptor,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field,
            request: Box::new(request),
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// The request attached to a validation error
    #[must_use]
    pub fn request(&self) -> Option<&RequestDescriptor> {
        match self {
            Self::Validation { request, .. } => Some(request),
            _ => None,
        }
    }

    /// HTTP status of a non-2xx agent response
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
