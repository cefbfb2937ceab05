//! Catalog endpoints (`/v1/catalog/...`)

mod service;

pub use service::CatalogService;

use crate::client::Consul;

/// Entry point to the catalog endpoints of a [`Consul`] client
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    consul: &'a Consul,
}

impl<'a> Catalog<'a> {
    pub(crate) fn new(consul: &'a Consul) -> Self {
        Self { consul }
    }

    /// Service registration, discovery and deregistration
    #[must_use]
    pub fn service(&self) -> CatalogService<'a> {
        CatalogService::new(self.consul)
    }
}
