use crate::catalog::Catalog;
use crate::config::ConsulConfig;
use crate::error::ConsulError;
use crate::http::HttpTransport;
use crate::options::{CallOptions, Options, merge_defaults, normalize_keys};
use crate::request::RequestDescriptor;
use crate::transport::{Extractor, Transport};
use std::sync::Arc;

/// Consul API client.
///
/// Holds the transport and the option defaults applied underneath every call.
/// `Consul` is `Clone + Send + Sync`; clones share both.
///
/// ```ignore
/// let consul = Consul::from_config(&ConsulConfig::default())?;
/// let nodes = consul.catalog().service().nodes("web").await?;
/// ```
#[derive(Clone)]
pub struct Consul {
    transport: Arc<dyn Transport>,
    defaults: Arc<Options>,
}

impl std::fmt::Debug for Consul {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consul")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Consul {
    /// Create a client over `transport` with no defaults
    #[must_use]
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    /// Create a client over a shared transport with no defaults
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            defaults: Arc::new(Options::new()),
        }
    }

    /// Create a client for the agent described by `config`, with its defaults.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the base URL is invalid.
    pub fn from_config(config: &ConsulConfig) -> Result<Self, ConsulError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(transport).with_defaults(config.default_options()))
    }

    /// Replace the defaults; keys are canonicalized.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Options) -> Self {
        self.defaults = Arc::new(normalize_keys(defaults));
        self
    }

    #[must_use]
    pub fn defaults(&self) -> &Options {
        &self.defaults
    }

    /// Catalog endpoints
    #[must_use]
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }

    /// Expand, canonicalize and merge defaults for one call
    pub(crate) fn prepare(&self, opts: CallOptions, shorthand_key: &str) -> Options {
        merge_defaults(opts.into_options(shorthand_key), &self.defaults)
    }

    /// Build the validation error for a rejected call
    pub(crate) fn invalid(
        message: impl Into<String>,
        field: Option<&'static str>,
        request: RequestDescriptor,
    ) -> ConsulError {
        let message = message.into();
        tracing::debug!(operation = request.name, error = %message, "request rejected");
        ConsulError::validation(message, field, request)
    }

    pub(crate) async fn get<T>(
        &self,
        request: RequestDescriptor,
        extract: Extractor<T>,
    ) -> Result<T, ConsulError> {
        tracing::debug!(operation = request.name, "dispatching read");
        let response = self.transport.get(&request).await?;
        Ok(extract(response))
    }

    pub(crate) async fn put<T>(
        &self,
        request: RequestDescriptor,
        extract: Extractor<T>,
    ) -> Result<T, ConsulError> {
        tracing::debug!(operation = request.name, "dispatching write");
        let response = self.transport.put(&request).await?;
        Ok(extract(response))
    }
}
