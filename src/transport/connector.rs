//! HTTPS connector setup for the default transport.
//!
//! The connector is fixed: rustls with the ring provider and the system's
//! native root certificates, HTTP/1.1, plain `http://` allowed. TLS
//! configuration surface is intentionally absent.

use std::sync::Arc;

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use rustls::ClientConfig;

use super::TransportError;

/// Build the default HTTPS connector.
pub(crate) fn build_https_connector() -> Result<HttpsConnector<HttpConnector>, TransportError> {
    let config = default_tls_config()?;
    Ok(HttpsConnectorBuilder::new()
        .with_tls_config(config)
        .https_or_http()
        .enable_http1()
        .build())
}

fn default_tls_config() -> Result<ClientConfig, TransportError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut roots = rustls::RootCertStore::empty();
    let native_certs = rustls_native_certs::load_native_certs();
    if !native_certs.errors.is_empty() {
        // Some certificates may still have loaded; keep going.
        tracing::debug!(errors = ?native_certs.errors, "errors loading native certs");
    }
    roots.add_parsable_certificates(native_certs.certs);
    if roots.is_empty() {
        return Err(TransportError::new(
            "no usable native root certificates found",
        ));
    }

    ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::new(format!("TLS protocol setup failed: {e}")))
        .map(|builder| builder.with_root_certificates(roots).with_no_client_auth())
}
