//! Health-check definitions attached to a service registration.

use crate::options::{Options, normalize_keys, truthy};
use serde_json::Value;
use thiserror::Error;

/// Why a check definition could not be turned into its wire form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("check must be an object")]
    NotAnObject,
    #[error("http/tcp/script and interval, or ttl required")]
    MissingProbe,
}

/// Probe keys that need an `interval`, in precedence order
const INTERVAL_PROBES: &[&str] = &["grpc", "http", "tcp", "args", "script"];

/// Optional fields copied when present, as (option key, wire key)
const COMMON_FIELDS: &[(&str, &str)] = &[
    ("notes", "Notes"),
    ("status", "Status"),
    (
        "deregistercriticalserviceafter",
        "DeregisterCriticalServiceAfter",
    ),
    ("failuresbeforecritical", "FailuresBeforeCritical"),
    ("successbeforepassing", "SuccessBeforePassing"),
];

/// Transform a caller check definition into the catalog's wire `Check` object.
///
/// Keys are canonicalized first, so `HTTP`, `Http` and `http` are the same
/// option. Exactly one probe kind is emitted:
///
/// - an interval probe (`grpc`, `http`, `tcp`, `args` or `script`, first
///   truthy one wins) when `interval` is also set;
/// - otherwise a `ttl` check;
/// - otherwise an alias check (`aliasnode` / `aliasservice`).
///
/// # Errors
/// [`CheckError::NotAnObject`] for a non-object input and
/// [`CheckError::MissingProbe`] when no probe kind applies.
pub fn create_service_check(check: &Value) -> Result<Value, CheckError> {
    let Value::Object(src) = check else {
        return Err(CheckError::NotAnObject);
    };
    let src = normalize_keys(src.clone());
    let mut dst = Options::new();

    let probe = INTERVAL_PROBES.iter().find(|k| truthy(&src, k).is_some());
    let interval = truthy(&src, "interval");

    if let (Some(probe), Some(interval)) = (probe, interval) {
        match *probe {
            "grpc" => {
                copy(&src, &mut dst, "grpc", "GRPC");
                copy(&src, &mut dst, "grpcusetls", "GRPCUseTLS");
            }
            "http" => {
                copy(&src, &mut dst, "http", "HTTP");
                copy(&src, &mut dst, "tlsskipverify", "TLSSkipVerify");
                copy(&src, &mut dst, "method", "Method");
                copy(&src, &mut dst, "header", "Header");
            }
            "tcp" => copy(&src, &mut dst, "tcp", "TCP"),
            _ => {
                if truthy(&src, "args").is_some() {
                    copy(&src, &mut dst, "args", "Args");
                } else {
                    copy(&src, &mut dst, "script", "Script");
                }
                copy(&src, &mut dst, "dockercontainerid", "DockerContainerID");
                copy(&src, &mut dst, "shell", "Shell");
            }
        }
        dst.insert("Interval".to_owned(), interval.clone());
        copy(&src, &mut dst, "timeout", "Timeout");
    } else if let Some(ttl) = truthy(&src, "ttl") {
        dst.insert("TTL".to_owned(), ttl.clone());
    } else if truthy(&src, "aliasnode").is_some() || truthy(&src, "aliasservice").is_some() {
        copy(&src, &mut dst, "aliasnode", "AliasNode");
        copy(&src, &mut dst, "aliasservice", "AliasService");
    } else {
        return Err(CheckError::MissingProbe);
    }

    if src.contains_key("checkid") {
        copy(&src, &mut dst, "checkid", "CheckID");
    } else {
        copy(&src, &mut dst, "id", "CheckID");
    }
    copy(&src, &mut dst, "name", "Name");
    for (from, to) in COMMON_FIELDS {
        copy(&src, &mut dst, from, to);
    }

    Ok(Value::Object(dst))
}

fn copy(src: &Options, dst: &mut Options, from: &str, to: &str) {
    if let Some(value) = src.get(from) {
        dst.insert(to.to_owned(), value.clone());
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn http_check() {
        let check = create_service_check(&json!({
            "HTTP": "http://127.0.0.1:8080/health",
            "Interval": "10s",
            "timeout": "1s",
            "TLS_Skip_Verify": true,
            "method": "HEAD",
            "notes": "web health"
        }))
        .unwrap();

        assert_eq!(
            check,
            json!({
                "HTTP": "http://127.0.0.1:8080/health",
                "TLSSkipVerify": true,
                "Method": "HEAD",
                "Interval": "10s",
                "Timeout": "1s",
                "Notes": "web health"
            })
        );
    }

    #[test]
    fn grpc_wins_over_http() {
        let check = create_service_check(&json!({
            "grpc": "127.0.0.1:9000",
            "grpcUseTls": false,
            "http": "http://x",
            "interval": "5s"
        }))
        .unwrap();

        assert_eq!(check["GRPC"], "127.0.0.1:9000");
        assert_eq!(check["GRPCUseTLS"], false);
        assert!(check.get("HTTP").is_none());
    }

    #[test]
    fn tcp_check() {
        let check = create_service_check(&json!({"tcp": "127.0.0.1:22", "interval": "30s"})).unwrap();
        assert_eq!(check, json!({"TCP": "127.0.0.1:22", "Interval": "30s"}));
    }

    #[test]
    fn args_preferred_over_script() {
        let check = create_service_check(&json!({
            "args": ["/bin/check", "-q"],
            "script": "/bin/legacy",
            "docker_container_id": "abc",
            "shell": "/bin/sh",
            "interval": "1m"
        }))
        .unwrap();

        assert_eq!(check["Args"], json!(["/bin/check", "-q"]));
        assert!(check.get("Script").is_none());
        assert_eq!(check["DockerContainerID"], "abc");
        assert_eq!(check["Shell"], "/bin/sh");
    }

    #[test]
    fn script_check() {
        let check = create_service_check(&json!({"script": "/bin/check", "interval": "1m"})).unwrap();
        assert_eq!(check, json!({"Script": "/bin/check", "Interval": "1m"}));
    }

    #[test]
    fn probe_without_interval_falls_back_to_ttl() {
        let check = create_service_check(&json!({"http": "http://x", "ttl": "15s"})).unwrap();
        assert_eq!(check, json!({"TTL": "15s"}));
    }

    #[test]
    fn alias_check() {
        let check = create_service_check(&json!({"alias_service": "db"})).unwrap();
        assert_eq!(check, json!({"AliasService": "db"}));
    }

    #[test]
    fn id_and_common_fields() {
        let check = create_service_check(&json!({
            "ttl": "15s",
            "id": "web-ttl",
            "name": "Web TTL",
            "status": "passing",
            "DeregisterCriticalServiceAfter": "90m",
            "failures_before_critical": 3,
            "SuccessBeforePassing": 2
        }))
        .unwrap();

        assert_eq!(
            check,
            json!({
                "TTL": "15s",
                "CheckID": "web-ttl",
                "Name": "Web TTL",
                "Status": "passing",
                "DeregisterCriticalServiceAfter": "90m",
                "FailuresBeforeCritical": 3,
                "SuccessBeforePassing": 2
            })
        );
    }

    #[test]
    fn checkid_wins_over_id() {
        let check =
            create_service_check(&json!({"ttl": "15s", "id": "a", "CheckID": "b"})).unwrap();
        assert_eq!(check["CheckID"], "b");
    }

    #[test]
    fn missing_probe_fails() {
        assert_eq!(
            create_service_check(&json!({"http": "http://x"})),
            Err(CheckError::MissingProbe)
        );
        assert_eq!(
            create_service_check(&json!({"interval": "10s"})),
            Err(CheckError::MissingProbe)
        );
        assert_eq!(
            CheckError::MissingProbe.to_string(),
            "http/tcp/script and interval, or ttl required"
        );
    }

    #[test]
    fn non_object_fails() {
        assert_eq!(
            create_service_check(&json!("http://x")),
            Err(CheckError::NotAnObject)
        );
    }
}
