use std::time::Duration;

/// Default User-Agent string for HTTP requests
pub const DEFAULT_USER_AGENT: &str = concat!("consul-http/", env!("CARGO_PKG_VERSION"));

/// Concurrency limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum concurrent requests (default: 100)
    pub max_concurrent_requests: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 100,
        }
    }
}

impl RateLimitConfig {
    /// Create config with unlimited concurrency
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_concurrent_requests: usize::MAX,
        }
    }
}

/// Which URL schemes the client accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportSecurity {
    /// Only `https://` URLs are accepted
    #[default]
    TlsOnly,
    /// Both `http://` and `https://` URLs are accepted.
    ///
    /// A Consul agent listening on loopback speaks plain HTTP on port 8500,
    /// so this is the mode used for local agents.
    AllowInsecureHttp,
}

/// Source of TLS root certificates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsRootConfig {
    /// Mozilla roots bundled through `webpki-roots`
    #[default]
    WebPki,
    /// Roots loaded from the operating system certificate store
    Native,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Default per-request timeout (default: 30s)
    ///
    /// A request may override this with [`RequestBuilder::timeout`](crate::RequestBuilder::timeout).
    pub request_timeout: Duration,

    /// Maximum response body size in bytes (default: 10 MB)
    ///
    /// Applied to decompressed bytes.
    pub max_body_size: usize,

    /// User-Agent header value
    pub user_agent: String,

    /// Headers added to every request that does not already carry them
    /// (for example a default `X-Consul-Token`)
    pub default_headers: Vec<(String, String)>,

    /// Concurrency limit; `None` disables limiting
    pub rate_limit: Option<RateLimitConfig>,

    /// Accepted URL schemes
    pub transport: TransportSecurity,

    /// TLS root certificate source
    pub tls_roots: TlsRootConfig,

    /// Capacity of the request buffer in front of the service stack (default: 1024)
    pub buffer_capacity: usize,

    /// Idle connection timeout for the pool; `None` keeps connections indefinitely
    pub pool_idle_timeout: Option<Duration>,

    /// Maximum number of idle connections per host (default: 32)
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            default_headers: Vec::new(),
            rate_limit: Some(RateLimitConfig::default()),
            transport: TransportSecurity::TlsOnly,
            tls_roots: TlsRootConfig::default(),
            buffer_capacity: 1024,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }
}

impl HttpClientConfig {
    /// Configuration for a Consul agent on the local host.
    ///
    /// Allows plain HTTP and keeps a small pool; blocking queries may hold a
    /// connection for up to the Consul maximum wait of 10 minutes, so the
    /// request timeout is set just above it.
    #[must_use]
    pub fn local_agent() -> Self {
        Self {
            request_timeout: Duration::from_secs(11 * 60),
            transport: TransportSecurity::AllowInsecureHttp,
            pool_idle_timeout: Some(Duration::from_secs(60)),
            pool_max_idle_per_host: 8,
            ..Self::default()
        }
    }

    /// Configuration for tests against mock servers (plain HTTP, no limits)
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_body_size: 1024 * 1024,
            rate_limit: None,
            transport: TransportSecurity::AllowInsecureHttp,
            buffer_capacity: 256,
            pool_idle_timeout: Some(Duration::from_secs(10)),
            pool_max_idle_per_host: 4,
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_config_defaults() {
        let config = HttpClientConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_body_size, 10 * 1024 * 1024);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.transport, TransportSecurity::TlsOnly);
        assert_eq!(config.tls_roots, TlsRootConfig::WebPki);
        assert_eq!(
            config.rate_limit.map(|r| r.max_concurrent_requests),
            Some(100)
        );
    }

    #[test]
    fn test_local_agent_allows_http_and_outlives_blocking_wait() {
        let config = HttpClientConfig::local_agent();
        assert_eq!(config.transport, TransportSecurity::AllowInsecureHttp);
        assert!(config.request_timeout > Duration::from_secs(600));
    }

    #[test]
    fn test_for_testing_disables_rate_limit() {
        let config = HttpClientConfig::for_testing();
        assert!(config.rate_limit.is_none());
        assert_eq!(config.transport, TransportSecurity::AllowInsecureHttp);
    }

    #[test]
    fn test_user_agent_has_crate_prefix() {
        assert!(DEFAULT_USER_AGENT.starts_with("consul-http/"));
    }
}
