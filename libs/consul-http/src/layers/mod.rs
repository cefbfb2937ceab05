//! Tower layers for the HTTP client middleware stack
//!
//! - [`DefaultHeadersLayer`] - Adds User-Agent and other default headers to requests
//!   that do not already carry them

mod default_headers;

pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
