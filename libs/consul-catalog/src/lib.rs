#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Client binding for the Consul catalog API.
//!
//! Every catalog operation goes through the same steps before anything is
//! sent: the caller's options (absent, a scalar shorthand or a mapping) are
//! expanded, their keys canonicalized (`Service_ID` -> `serviceid`), the
//! client defaults merged underneath, a [`RequestDescriptor`] assembled and
//! validated, and the shared transport options (`token`, `dc`, `stale`, ...)
//! overlaid. Only then is the descriptor handed to a [`Transport`].
//!
//! ```ignore
//! use consul_catalog::{Consul, ConsulConfig};
//! use serde_json::json;
//!
//! let consul = Consul::from_config(&ConsulConfig::default())?;
//! let services = consul.catalog().service().list(()).await?;
//! let nodes = consul
//!     .catalog()
//!     .service()
//!     .nodes(json!({"service": "web", "tag": "v1", "stale": true}))
//!     .await?;
//! consul.catalog().service().deregister("node-1").await?;
//! ```

pub mod catalog;
pub mod check;
mod client;
mod config;
mod error;
mod http;
pub mod humantime_serde;
pub mod options;
mod request;
mod transport;

pub use catalog::{Catalog, CatalogService};
pub use check::{CheckError, create_service_check};
pub use client::Consul;
pub use config::ConsulConfig;
pub use error::ConsulError;
pub use http::{HttpTransport, INDEX_HEADER};
pub use options::{CallOptions, Options};
pub use request::{BodyFormat, RequestDescriptor, TOKEN_HEADER, TRANSPORT_KEYS};
pub use transport::{Extractor, Transport, TransportResponse, extract};
