use anyhow::{Context, Result};
use consul_catalog::ConsulConfig;
use consul_catalog::options::canonical_key;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment overrides, e.g. `CONSUL_CATALOG__CONSUL__TOKEN`
pub const ENV_PREFIX: &str = "CONSUL_CATALOG__";

const REDACTED: &str = "***REDACTED***";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset and no `-v` is given
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: LogFormat::Text,
        }
    }
}

/// Effective CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub consul: ConsulConfig,
    pub logging: LoggingConfig,
}

/// Flags that override the loaded configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secure: bool,
    pub token: Option<String>,
    pub datacenter: Option<String>,
}

impl AppConfig {
    /// Layered load: defaults -> YAML file (if given) -> `CONSUL_CATALOG__*` env.
    ///
    /// # Errors
    /// Fails when the file is missing or any layer does not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .context("failed to load configuration")
    }

    /// Apply command-line overrides; flags win over every other layer.
    pub fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(host) = overrides.host {
            self.consul.host = host;
        }
        if let Some(port) = overrides.port {
            self.consul.port = port;
        }
        if overrides.secure {
            self.consul.secure = true;
        }
        if let Some(token) = overrides.token {
            self.consul.token = Some(token);
        }
        if let Some(dc) = overrides.datacenter {
            self.consul.datacenter = Some(dc);
        }
    }

    /// YAML rendering with the ACL token redacted
    ///
    /// # Errors
    /// Fails if serialization fails.
    pub fn to_redacted_yaml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.consul.token.is_some() {
            shown.consul.token = Some(REDACTED.to_owned());
        }
        // Defaults keys are matched canonically, so `Token` is the token too
        for (key, value) in &mut shown.consul.defaults {
            if canonical_key(key) == "token" {
                *value = REDACTED.into();
            }
        }
        serde_saphyr::to_string(&shown).context("failed to render configuration")
    }
}
