use crate::config::ConsulConfig;
use crate::error::ConsulError;
use crate::request::RequestDescriptor;
use crate::transport::{Transport, TransportResponse};
use async_trait::async_trait;
use consul_http::{HttpClient, HttpClientBuilder, Method};
use serde_json::Value;
use tracing::instrument;
use url::Url;

/// Response header carrying the blocking-query index
pub const INDEX_HEADER: &str = "x-consul-index";

/// [`Transport`] over the agent's HTTP API.
///
/// `HttpClient` is `Clone + Send + Sync`, so no external locking is needed.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: HttpClient,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url` (for example
    /// `http://127.0.0.1:8500/v1`).
    ///
    /// # Errors
    /// Returns `ConsulError::InvalidBaseUrl` if `base_url` cannot carry a path.
    pub fn new(client: HttpClient, base_url: &str) -> Result<Self, ConsulError> {
        let invalid = |reason: String| ConsulError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason,
        };
        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base".to_owned()));
        }
        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Build the HTTP client and transport described by `config`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the base URL is invalid.
    pub fn from_config(config: &ConsulConfig) -> Result<Self, ConsulError> {
        let client = HttpClientBuilder::with_config(config.http_client_config()).build()?;
        Self::new(client, &config.base_url())
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a descriptor: base path + rendered path + query
    fn url_for(&self, request: &RequestDescriptor) -> Url {
        let mut url = self.base_url.clone();
        let base_path = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{base_path}{}", request.render_path()));
        url.set_query(None);
        if !request.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        request: &RequestDescriptor,
    ) -> Result<TransportResponse, ConsulError> {
        let url = self.url_for(request);
        tracing::debug!(operation = request.name, %method, url = %url, "sending request");

        let mut builder = self
            .client
            .request(method, url.as_str())
            .headers(request.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body)?;
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let index = response
            .header_str(INDEX_HEADER)
            .and_then(|v| v.parse::<u64>().ok());
        let bytes = response.checked_bytes().await?;

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|source| ConsulError::Decode {
                operation: request.name,
                source,
            })?
        };

        Ok(TransportResponse {
            status,
            body,
            index,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip_all, fields(operation = request.name, base_url = %self.base_url))]
    async fn get(&self, request: &RequestDescriptor) -> Result<TransportResponse, ConsulError> {
        self.send(Method::GET, request).await
    }

    #[instrument(skip_all, fields(operation = request.name, base_url = %self.base_url))]
    async fn put(&self, request: &RequestDescriptor) -> Result<TransportResponse, ConsulError> {
        self.send(Method::PUT, request).await
    }
}
