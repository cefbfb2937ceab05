#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP client used by the Consul catalog binding
//!
//! This crate provides a hyper-based HTTP client with:
//! - TLS via rustls, with plain HTTP available for local agents
//! - Connection pooling
//! - A default request timeout plus per-request overrides
//! - User-Agent header injection
//! - Concurrency limiting
//! - Transparent response decompression (gzip, brotli, deflate)
//! - Response body size limits applied to decompressed bytes
//!
//! # Example
//!
//! ```ignore
//! use consul_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .allow_insecure_http()
//!     .build()?;
//!
//! let services: serde_json::Value = client
//!     .get("http://127.0.0.1:8500/v1/catalog/services")
//!     .header("x-consul-token", "secret")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod layers;
mod request;
mod response;
pub mod security;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{DEFAULT_USER_AGENT, HttpClientConfig, RateLimitConfig, TlsRootConfig, TransportSecurity};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{DefaultHeadersLayer, DefaultHeadersService};
pub use request::RequestBuilder;
pub use response::{HttpResponse, ResponseBody};

pub use http::{Method, StatusCode};
