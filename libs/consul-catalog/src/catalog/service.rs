use crate::check::create_service_check;
use crate::client::Consul;
use crate::error::ConsulError;
use crate::options::{CallOptions, Options, truthy, value_to_string};
use crate::request::{RequestDescriptor, TRANSPORT_KEYS};
use crate::transport::extract;
use serde_json::Value;

/// Registration keys renamed to the catalog's wire casing
const REGISTER_WIRE_KEYS: &[(&str, &str)] = &[
    ("id", "ID"),
    ("node", "Node"),
    ("address", "Address"),
    ("datacenter", "Datacenter"),
    ("taggedaddresses", "TaggedAddresses"),
    ("nodemeta", "NodeMeta"),
    ("service", "Service"),
    ("skipnodeupdate", "SkipNodeUpdate"),
    ("name", "Name"),
    ("tags", "Tags"),
    ("port", "Port"),
    ("meta", "Meta"),
];

/// Catalog service operations.
///
/// Each operation takes its options as [`CallOptions`]: nothing, a scalar
/// shorthand for the operation's primary option, or a mapping with keys in
/// any casing. Transport-level options (`token`, `dc`, `consistent`,
/// `stale`, `index`, `wait`, `timeout`, ...) are accepted by all of them.
#[derive(Debug, Clone, Copy)]
pub struct CatalogService<'a> {
    consul: &'a Consul,
}

impl<'a> CatalogService<'a> {
    pub(crate) fn new(consul: &'a Consul) -> Self {
        Self { consul }
    }

    /// List the services of a datacenter: `GET /catalog/services`.
    ///
    /// Shorthand: the datacenter. Returns the agent's JSON body verbatim, a
    /// mapping of service name to tags.
    ///
    /// # Errors
    /// Returns `ConsulError::Validation` for an unparsable `timeout`, or the
    /// transport error.
    pub async fn list(&self, opts: impl Into<CallOptions>) -> Result<Value, ConsulError> {
        let opts = self.consul.prepare(opts.into(), "dc");
        let mut req = RequestDescriptor::new("catalog.service.list", "/catalog/services");

        overlay(&mut req, &opts)?;

        self.consul.get(req, extract::body).await
    }

    /// List the nodes providing a service: `GET /catalog/service/{service}`.
    ///
    /// Shorthand: the service name. A truthy `tag` filters by tag.
    ///
    /// # Errors
    /// Returns `ConsulError::Validation` (`service required`) without calling
    /// the transport when no service is given, or the transport error.
    pub async fn nodes(&self, opts: impl Into<CallOptions>) -> Result<Value, ConsulError> {
        let opts = self.consul.prepare(opts.into(), "service");
        let mut req = RequestDescriptor::new("catalog.service.nodes", "/catalog/service/{service}");
        if let Some(service) = opts.get("service").filter(|v| !v.is_null()) {
            req.params
                .insert("service".to_owned(), value_to_string(service));
        }

        if truthy(&opts, "service").is_none() {
            return Err(Consul::invalid("service required", Some("service"), req));
        }
        if let Some(tag) = truthy(&opts, "tag") {
            req.set_query("tag", value_to_string(tag));
        }

        overlay(&mut req, &opts)?;

        self.consul.get(req, extract::body).await
    }

    /// Register a node, service and checks: `PUT /catalog/register`.
    ///
    /// Shorthand: the service name. The body is built from the options with
    /// known keys renamed to wire casing; a `checks` array becomes `Checks`,
    /// otherwise a truthy `check` becomes `Check`.
    ///
    /// # Errors
    /// Returns `ConsulError::Validation` without calling the transport when a
    /// check definition is invalid, or the transport error.
    pub async fn register(&self, opts: impl Into<CallOptions>) -> Result<(), ConsulError> {
        let opts = self.consul.prepare(opts.into(), "name");
        let mut req = RequestDescriptor::new("catalog.service.register", "/catalog/register")
            .with_json_body(Value::Object(registration_body(&opts)));

        let checks = match opts.get("checks") {
            Some(Value::Array(checks)) => checks
                .iter()
                .map(create_service_check)
                .collect::<Result<Vec<_>, _>>()
                .map(|checks| Some(("Checks", Value::Array(checks)))),
            _ => truthy(&opts, "check")
                .map(|check| create_service_check(check).map(|c| ("Check", c)))
                .transpose(),
        };
        match checks {
            Ok(Some((key, value))) => {
                if let Some(Value::Object(body)) = req.body.as_mut() {
                    body.insert(key.to_owned(), value);
                }
            }
            Ok(None) => {}
            Err(e) => {
                return Err(Consul::invalid(e.to_string(), Some("check"), req));
            }
        }

        overlay(&mut req, &opts)?;

        self.consul.put(req, extract::empty).await
    }

    /// Remove a node, service or check: `PUT /catalog/deregister`.
    ///
    /// Shorthand: the node id. The body is `{"Node": <node>}`.
    ///
    /// # Errors
    /// Returns `ConsulError::Validation` (`node id required`) without calling
    /// the transport when no node is given, or the transport error.
    pub async fn deregister(&self, opts: impl Into<CallOptions>) -> Result<(), ConsulError> {
        let opts = self.consul.prepare(opts.into(), "node");
        let mut req = RequestDescriptor::new("catalog.service.deregister", "/catalog/deregister")
            .with_json_body(Value::Object(Options::new()));

        let Some(node) = truthy(&opts, "node") else {
            return Err(Consul::invalid("node id required", Some("node"), req));
        };
        if let Some(Value::Object(body)) = req.body.as_mut() {
            body.insert("Node".to_owned(), node.clone());
        }

        overlay(&mut req, &opts)?;

        self.consul.put(req, extract::empty).await
    }
}

/// Apply the shared transport options, turning a bad value into a validation error
fn overlay(req: &mut RequestDescriptor, opts: &Options) -> Result<(), ConsulError> {
    req.apply_options(opts)
        .map_err(|message| Consul::invalid(message, Some("timeout"), req.clone()))
}

/// Options minus transport keys and raw checks, known keys in wire casing
fn registration_body(opts: &Options) -> Options {
    opts.iter()
        .filter(|(key, _)| {
            !TRANSPORT_KEYS.contains(&key.as_str()) && key.as_str() != "checks" && key.as_str() != "check"
        })
        .map(|(key, value)| {
            let wire = REGISTER_WIRE_KEYS
                .iter()
                .find(|(from, _)| from == key)
                .map_or_else(|| key.clone(), |(_, to)| (*to).to_owned());
            (wire, value.clone())
        })
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(value: Value) -> Options {
        match value {
            Value::Object(m) => m,
            _ => unreachable!("test helper expects an object"),
        }
    }

    #[test]
    fn registration_body_renames_known_keys() {
        let body = registration_body(&opts(json!({
            "node": "n1",
            "address": "10.0.0.1",
            "service": {"Service": "web", "Port": 80},
            "skipnodeupdate": true,
            "custom": 1
        })));
        assert_eq!(
            Value::Object(body),
            json!({
                "Node": "n1",
                "Address": "10.0.0.1",
                "Service": {"Service": "web", "Port": 80},
                "SkipNodeUpdate": true,
                "custom": 1
            })
        );
    }

    #[test]
    fn registration_body_drops_transport_keys_and_raw_checks() {
        let body = registration_body(&opts(json!({
            "name": "web",
            "token": "t",
            "dc": "dc1",
            "timeout": "5s",
            "checks": [],
            "check": {"ttl": "10s"}
        })));
        assert_eq!(Value::Object(body), json!({"Name": "web"}));
    }
}
