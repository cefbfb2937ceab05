//! Serde support for `Duration` as humantime strings (`"10s"`, `"5m 30s"`).
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Settings {
//!     #[serde(with = "consul_catalog::humantime_serde")]
//!     timeout: Duration,
//!     #[serde(default, with = "consul_catalog::humantime_serde::option")]
//!     idle: Option<Duration>,
//! }
//! ```

use serde::{Deserialize, Deserializer, Serializer, de};
use std::time::Duration;

/// Serialize a `Duration` as a humantime string.
///
/// # Errors
/// Propagates the serializer's error.
pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&humantime::format_duration(*d))
}

/// Deserialize a `Duration` from a humantime string.
///
/// # Errors
/// Fails when the input is not a string humantime can parse.
pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(d)?;
    humantime::parse_duration(&raw)
        .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&raw), &"a duration"))
}

pub mod option {
    //! The same mapping for `Option<Duration>`; `null` maps to `None`.

    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize an `Option<Duration>`.
    ///
    /// # Errors
    /// Propagates the serializer's error.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.collect_str(&humantime::format_duration(*d)),
            None => s.serialize_none(),
        }
    }

    /// Deserialize an `Option<Duration>`.
    ///
    /// # Errors
    /// Fails when a present value is not a parsable duration string.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|raw| {
            humantime::parse_duration(&raw).map_err(|_| {
                serde::de::Error::invalid_value(serde::de::Unexpected::Str(&raw), &"a duration")
            })
        })
        .transpose()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Serialize, Deserialize)]
    struct Plain {
        #[serde(with = "super")]
        time: Duration,
    }

    #[derive(Serialize, Deserialize)]
    struct Optional {
        #[serde(default, with = "super::option")]
        time: Option<Duration>,
    }

    #[test]
    fn plain_round_trip() {
        let foo: Plain = serde_json::from_str(r#"{"time": "10m 10s"}"#).unwrap();
        assert_eq!(foo.time, Duration::from_secs(610));
        assert_eq!(serde_json::to_string(&foo).unwrap(), r#"{"time":"10m 10s"}"#);
    }

    #[test]
    fn optional_accepts_null_and_missing() {
        let some: Optional = serde_json::from_str(r#"{"time": "250ms"}"#).unwrap();
        assert_eq!(some.time, Some(Duration::from_millis(250)));

        let null: Optional = serde_json::from_str(r#"{"time": null}"#).unwrap();
        assert_eq!(null.time, None);

        let missing: Optional = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.time, None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Plain>(r#"{"time": "soon"}"#).is_err());
    }
}
