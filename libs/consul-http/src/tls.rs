//! Trust roots for HTTPS agents.
//!
//! Agents with `verify_incoming` usually present a certificate from a private
//! CA that operators add to the OS store, so `Native` is the usual choice for
//! `secure: true`. The store is read once per process.

use rustls_pki_types::CertificateDer;
use std::sync::{Arc, OnceLock};

static NATIVE_ROOTS: OnceLock<Vec<CertificateDer<'static>>> = OnceLock::new();

fn read_os_store() -> Vec<CertificateDer<'static>> {
    let loaded = rustls_native_certs::load_native_certs();
    for err in &loaded.errors {
        tracing::warn!(error = %err, "skipping unreadable OS certificate");
    }
    match loaded.certs.len() {
        0 => tracing::warn!("OS certificate store is empty; HTTPS agents cannot be verified"),
        count => tracing::debug!(count, "read OS certificate store"),
    }
    loaded.certs
}

/// OS store certificates, read on first use
pub fn native_root_certs() -> &'static [CertificateDer<'static>] {
    NATIVE_ROOTS.get_or_init(read_os_store).as_slice()
}

/// The installed process-wide provider, or a private aws-lc-rs one.
pub fn crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

/// rustls config trusting the OS store.
///
/// # Errors
///
/// Fails when no OS certificate is usable; a client that could never verify
/// the agent is refused at build time rather than on the first call.
pub fn native_roots_client_config() -> Result<rustls::ClientConfig, String> {
    let certs = native_root_certs();
    if certs.is_empty() {
        return Err("OS certificate store is empty".to_owned());
    }

    let mut roots = rustls::RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs.iter().cloned());
    if ignored > 0 {
        tracing::warn!(added, ignored, "OS certificates rejected by rustls");
    }
    if added == 0 {
        return Err(format!("none of the {} OS certificates are usable", certs.len()));
    }

    rustls::ClientConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .map(|builder| builder.with_root_certificates(roots).with_no_client_auth())
        .map_err(|e| format!("TLS protocol setup failed: {e}"))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_os_store_read_once() {
        assert!(std::ptr::eq(native_root_certs(), native_root_certs()));
    }

    #[test]
    fn test_native_roots_config_builds_or_explains() {
        // CI containers often ship without CA bundles
        if let Err(e) = native_roots_client_config() {
            tracing::debug!(error = %e, "native roots unavailable");
        }
    }
}
