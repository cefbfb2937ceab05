//! Caller options and their normalization.
//!
//! Every catalog operation accepts its options in one of three shapes (see
//! [`CallOptions`]). Before an operation looks at them they are expanded to a
//! mapping, their keys are canonicalized and the client defaults are merged
//! underneath.

use serde_json::{Map, Value};

/// Option mapping keyed by canonical option name.
pub type Options = Map<String, Value>;

/// Options as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CallOptions {
    /// No options at all
    #[default]
    Absent,
    /// A single scalar standing for the operation's primary option
    /// (`dc` for list, `service` for nodes, `name` for register, `node` for deregister)
    Shorthand(Value),
    /// A mapping with arbitrarily cased keys
    Options(Options),
}

impl CallOptions {
    /// Expand into a mapping with canonical keys.
    ///
    /// `shorthand_key` is the option a scalar shorthand stands for.
    #[must_use]
    pub fn into_options(self, shorthand_key: &str) -> Options {
        match self {
            Self::Absent => Options::new(),
            Self::Shorthand(value) => {
                let mut opts = Options::new();
                opts.insert(canonical_key(shorthand_key), value);
                opts
            }
            Self::Options(opts) => normalize_keys(opts),
        }
    }
}

impl From<()> for CallOptions {
    fn from((): ()) -> Self {
        Self::Absent
    }
}

impl From<&str> for CallOptions {
    fn from(value: &str) -> Self {
        Self::Shorthand(Value::String(value.to_owned()))
    }
}

impl From<String> for CallOptions {
    fn from(value: String) -> Self {
        Self::Shorthand(Value::String(value))
    }
}

impl From<&String> for CallOptions {
    fn from(value: &String) -> Self {
        Self::Shorthand(Value::String(value.clone()))
    }
}

impl From<Options> for CallOptions {
    fn from(value: Options) -> Self {
        Self::Options(value)
    }
}

impl From<Value> for CallOptions {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::Object(map) => Self::Options(map),
            scalar => Self::Shorthand(scalar),
        }
    }
}

impl<T: Into<CallOptions>> From<Option<T>> for CallOptions {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Canonical form of an option key: underscores removed, lowercased.
///
/// `Service_ID`, `serviceId` and `ServiceID` all become `serviceid`.
/// Hyphens are kept, so `node-meta` stays as is.
#[must_use]
pub fn canonical_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonicalize every top-level key; nested values are left untouched.
///
/// When two keys collapse onto the same canonical key the later one wins.
#[must_use]
pub fn normalize_keys(opts: Options) -> Options {
    opts.into_iter()
        .map(|(key, value)| (canonical_key(&key), value))
        .collect()
}

/// Merge `defaults` underneath `opts`.
///
/// A default is copied only when the caller key is missing or `null`; caller
/// values are never overwritten. Applying the same defaults twice gives the
/// same result as applying them once.
#[must_use]
pub fn merge_defaults(mut opts: Options, defaults: &Options) -> Options {
    for (key, value) in defaults {
        let missing = opts.get(key).is_none_or(Value::is_null);
        if missing {
            opts.insert(key.clone(), value.clone());
        }
    }
    opts
}

/// Whether a value counts as set: not `null`, `false`, `0` or `""`.
///
/// Arrays and objects are truthy even when empty.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The value under `key` if it is truthy.
pub(crate) fn truthy<'a>(opts: &'a Options, key: &str) -> Option<&'a Value> {
    opts.get(key).filter(|v| is_truthy(v))
}

/// Render a scalar option as it appears in a path or query string.
///
/// Strings are used verbatim; anything else is rendered as JSON.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Options {
        match value {
            Value::Object(m) => m,
            _ => unreachable!("test helper expects an object"),
        }
    }

    #[test]
    fn canonical_key_strips_underscores_and_lowercases() {
        assert_eq!(canonical_key("Service_ID"), "serviceid");
        assert_eq!(canonical_key("serviceId"), "serviceid");
        assert_eq!(canonical_key("ServiceID"), "serviceid");
        assert_eq!(canonical_key("node-meta"), "node-meta");
        assert_eq!(canonical_key("DC"), "dc");
    }

    #[test]
    fn shorthand_and_mapping_normalize_identically() {
        let scalar = CallOptions::from("dc1").into_options("dc");
        let mapping = CallOptions::from(json!({"DC": "dc1"})).into_options("dc");
        assert_eq!(scalar, mapping);
        assert_eq!(scalar, map(json!({"dc": "dc1"})));
    }

    #[test]
    fn absent_and_null_are_empty() {
        assert!(CallOptions::Absent.into_options("dc").is_empty());
        assert!(CallOptions::from(Value::Null).into_options("dc").is_empty());
        assert!(CallOptions::from(None::<&str>).into_options("dc").is_empty());
    }

    #[test]
    fn non_string_scalar_is_shorthand() {
        let opts = CallOptions::from(json!(42)).into_options("node");
        assert_eq!(opts.get("node"), Some(&json!(42)));
    }

    #[test]
    fn merge_defaults_caller_wins() {
        let defaults = map(json!({"dc": "dc-default", "token": "t"}));
        let merged = merge_defaults(map(json!({"dc": "dc1"})), &defaults);
        assert_eq!(merged.get("dc"), Some(&json!("dc1")));
        assert_eq!(merged.get("token"), Some(&json!("t")));
    }

    #[test]
    fn merge_defaults_fills_null() {
        let defaults = map(json!({"dc": "dc-default"}));
        let merged = merge_defaults(map(json!({"dc": null})), &defaults);
        assert_eq!(merged.get("dc"), Some(&json!("dc-default")));
    }

    #[test]
    fn merge_defaults_is_idempotent() {
        let defaults = map(json!({"dc": "dc-default", "stale": true}));
        let once = merge_defaults(map(json!({"service": "web"})), &defaults);
        let twice = merge_defaults(once.clone(), &defaults);
        assert_eq!(once, twice);
    }

    #[test]
    fn truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!("x"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn value_rendering() {
        assert_eq!(value_to_string(&json!("web")), "web");
        assert_eq!(value_to_string(&json!(10)), "10");
        assert_eq!(value_to_string(&json!(true)), "true");
    }
}
