//! HTTP security utilities.

/// Maximum body preview size for error messages (8KB).
///
/// Consul answers most failures with a short plain-text explanation
/// (`Missing node registration`, `Permission denied`). The preview keeps that
/// text in [`HttpError::HttpStatus`](crate::HttpError::HttpStatus) without
/// buffering arbitrarily large error bodies.
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;
