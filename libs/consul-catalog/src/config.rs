use crate::options::{Options, canonical_key};
use consul_http::{HttpClientConfig, TlsRootConfig, TransportSecurity};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for a Consul agent.
///
/// Every field has a default, so an empty document deserializes to a client
/// for the local agent at `http://127.0.0.1:8500/v1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsulConfig {
    pub host: String,
    pub port: u16,
    /// Use `https://`
    pub secure: bool,
    /// API root on the agent
    pub base_path: String,
    /// ACL token sent with every request unless a call passes its own
    pub token: Option<String>,
    /// Datacenter used when a call does not name one
    pub datacenter: Option<String>,
    /// Extra option defaults applied underneath every call
    pub defaults: Options,
    #[serde(with = "crate::humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: Option<String>,
    /// Response body limit in bytes
    pub max_body_size: usize,
    /// Trust the operating system's root store instead of the bundled roots
    pub native_roots: bool,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8500,
            secure: false,
            base_path: "/v1".to_owned(),
            token: None,
            datacenter: None,
            defaults: Options::new(),
            request_timeout: Duration::from_secs(11 * 60),
            user_agent: None,
            max_body_size: 10 * 1024 * 1024,
            native_roots: false,
        }
    }
}

impl ConsulConfig {
    /// Agent API root, e.g. `http://127.0.0.1:8500/v1`
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        let path = self.base_path.trim_end_matches('/');
        let sep = if path.is_empty() || path.starts_with('/') {
            ""
        } else {
            "/"
        };
        format!("{scheme}://{}:{}{sep}{path}", self.host, self.port)
    }

    /// Option defaults for the client: `defaults` plus `dc` from `datacenter`.
    ///
    /// Keys are canonicalized; an explicit `dc` in `defaults` wins.
    #[must_use]
    pub fn default_options(&self) -> Options {
        let mut opts: Options = self
            .defaults
            .iter()
            .map(|(k, v)| (canonical_key(k), v.clone()))
            .collect();
        if let Some(dc) = &self.datacenter {
            opts.entry("dc")
                .or_insert_with(|| serde_json::Value::String(dc.clone()));
        }
        opts
    }

    /// HTTP client settings for this agent
    #[must_use]
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::local_agent();
        config.request_timeout = self.request_timeout;
        config.max_body_size = self.max_body_size;
        config.transport = if self.secure {
            TransportSecurity::TlsOnly
        } else {
            TransportSecurity::AllowInsecureHttp
        };
        config.tls_roots = if self.native_roots {
            TlsRootConfig::Native
        } else {
            TlsRootConfig::WebPki
        };
        if let Some(ua) = &self.user_agent {
            config.user_agent.clone_from(ua);
        }
        if let Some(token) = &self.token {
            config
                .default_headers
                .push((crate::request::TOKEN_HEADER.to_owned(), token.clone()));
        }
        config
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_gives_local_agent() {
        let config: ConsulConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, ConsulConfig::default());
        assert_eq!(config.base_url(), "http://127.0.0.1:8500/v1");
    }

    #[test]
    fn base_url_variants() {
        let config = ConsulConfig {
            host: "consul.internal".to_owned(),
            port: 8501,
            secure: true,
            base_path: "v1/".to_owned(),
            ..ConsulConfig::default()
        };
        assert_eq!(config.base_url(), "https://consul.internal:8501/v1");
    }

    #[test]
    fn durations_are_humantime() {
        let config: ConsulConfig =
            serde_json::from_value(json!({"request_timeout": "45s"})).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(45));

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["request_timeout"], "45s");
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(serde_json::from_value::<ConsulConfig>(json!({"hots": "x"})).is_err());
    }

    #[test]
    fn default_options_merge_datacenter() {
        let config = ConsulConfig {
            datacenter: Some("dc1".to_owned()),
            defaults: serde_json::from_value(json!({"Stale": true})).unwrap(),
            ..ConsulConfig::default()
        };
        assert_eq!(
            serde_json::Value::Object(config.default_options()),
            json!({"dc": "dc1", "stale": true})
        );

        let explicit = ConsulConfig {
            datacenter: Some("dc1".to_owned()),
            defaults: serde_json::from_value(json!({"DC": "dc2"})).unwrap(),
            ..ConsulConfig::default()
        };
        assert_eq!(explicit.default_options()["dc"], "dc2");
    }

    #[test]
    fn http_config_carries_token_and_transport() {
        let config = ConsulConfig {
            token: Some("secret".to_owned()),
            request_timeout: Duration::from_secs(5),
            ..ConsulConfig::default()
        };
        let http = config.http_client_config();
        assert_eq!(http.request_timeout, Duration::from_secs(5));
        assert_eq!(http.transport, TransportSecurity::AllowInsecureHttp);
        assert_eq!(
            http.default_headers,
            vec![("x-consul-token".to_owned(), "secret".to_owned())]
        );

        let secure = ConsulConfig {
            secure: true,
            native_roots: true,
            ..ConsulConfig::default()
        };
        let http = secure.http_client_config();
        assert_eq!(http.transport, TransportSecurity::TlsOnly);
        assert_eq!(http.tls_roots, TlsRootConfig::Native);
    }
}
