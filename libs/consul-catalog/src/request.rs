use crate::options::{Options, truthy, value_to_string};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Header carrying the ACL token
pub const TOKEN_HEADER: &str = "x-consul-token";

/// Option keys consumed by [`RequestDescriptor::apply_options`].
///
/// These never end up in a request body.
pub const TRANSPORT_KEYS: &[&str] = &[
    "token",
    "dc",
    "wan",
    "consistent",
    "stale",
    "index",
    "wait",
    "near",
    "node-meta",
    "filter",
    "timeout",
];

/// Option keys passed through as query parameters of the same name when set
const PASSTHROUGH_QUERY_KEYS: &[&str] = &["index", "wait", "near", "node-meta", "filter"];

/// Encoding of a request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    Json,
}

/// A fully normalized request, ready for a [`Transport`](crate::Transport).
///
/// Built fresh for each call and dropped once the call completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDescriptor {
    /// Operation name, e.g. `catalog.service.nodes`
    pub name: &'static str,
    /// Path template relative to the API root, with `{slot}` placeholders
    pub path: &'static str,
    pub params: BTreeMap<String, String>,
    /// Query pairs in insertion order; a key may repeat
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<BodyFormat>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::humantime_serde::option"
    )]
    pub timeout: Option<Duration>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(name: &'static str, path: &'static str) -> Self {
        Self {
            name,
            path,
            params: BTreeMap::new(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
            format: None,
            timeout: None,
        }
    }

    /// Set a JSON body
    #[must_use]
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self.format = Some(BodyFormat::Json);
        self
    }

    /// Set a query parameter, replacing any earlier value for `key`
    pub fn set_query(&mut self, key: &str, value: impl Into<String>) {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_owned(), value.into()));
    }

    /// First value of a query parameter
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path with every `{slot}` replaced by its percent-encoded parameter.
    ///
    /// A slot without a parameter is left as is.
    #[must_use]
    pub fn render_path(&self) -> String {
        let mut out = String::with_capacity(self.path.len());
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let slot = &rest[start + 1..start + len];
            out.push_str(&rest[..start]);
            match self.params.get(slot) {
                Some(value) => out.push_str(&urlencoding::encode(value)),
                None => out.push_str(&rest[start..=start + len]),
            }
            rest = &rest[start + len + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Overlay the transport-level options shared by every operation.
    ///
    /// Only inserts into the descriptor; fields set by the operation are kept
    /// unless an overlay key of the same name replaces them.
    ///
    /// # Errors
    /// Returns a message when `timeout` is neither a duration string nor a
    /// non-negative integer number of milliseconds.
    pub fn apply_options(&mut self, opts: &Options) -> Result<(), String> {
        if let Some(token) = present(opts, "token") {
            self.headers
                .insert(TOKEN_HEADER.to_owned(), value_to_string(token));
        }

        if let Some(dc) = truthy(opts, "dc") {
            self.set_query("dc", value_to_string(dc));
        }
        if truthy(opts, "wan").is_some() {
            self.set_query("wan", "1");
        }
        if truthy(opts, "consistent").is_some() {
            self.set_query("consistent", "1");
        } else if truthy(opts, "stale").is_some() {
            self.set_query("stale", "1");
        }

        for key in PASSTHROUGH_QUERY_KEYS {
            match present(opts, key) {
                Some(Value::Array(values)) => {
                    self.query.retain(|(k, _)| k != key);
                    for value in values.iter().filter(|v| !v.is_null()) {
                        self.query.push(((*key).to_owned(), value_to_string(value)));
                    }
                }
                Some(value) => self.set_query(key, value_to_string(value)),
                None => {}
            }
        }

        if let Some(timeout) = opts.get("timeout") {
            self.timeout = parse_timeout(timeout)?;
        }

        Ok(())
    }
}

/// Value of `key` unless it is missing or `null`
fn present<'a>(opts: &'a Options, key: &str) -> Option<&'a Value> {
    opts.get(key).filter(|v| !v.is_null())
}

/// Strings are humantime durations; integers are milliseconds; `null` means none.
fn parse_timeout(value: &Value) -> Result<Option<Duration>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => humantime::parse_duration(s)
            .map(Some)
            .map_err(|e| format!("invalid timeout '{s}': {e}")),
        Value::Number(n) => n
            .as_u64()
            .map(|ms| Some(Duration::from_millis(ms)))
            .ok_or_else(|| format!("invalid timeout {n}: expected milliseconds")),
        other => Err(format!("invalid timeout {other}")),
    }
}
