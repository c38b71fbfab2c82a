//! Hyper-based default transport.
//!
//! [`HyperTransport`] performs HTTP exchanges with hyper_util's legacy
//! client: connection pooling, HTTPS through rustls, HTTP/1.1. It is the
//! transport a client gets when none is injected.

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use http::Request;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};

use super::{Transport, TransportError, TransportResponse, connector::build_https_connector};
use crate::request::NormalizedRequest;

/// Type alias for the pooled hyper client.
type PoolClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Default transport over hyper_util's legacy client.
///
/// # Example
///
/// ```ignore
/// use unifetch::transport::HyperTransport;
///
/// let transport = HyperTransport::builder()
///     .pool_idle_timeout(std::time::Duration::from_secs(60))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    client: PoolClient,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a new transport builder.
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a transport with default settings.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }
}

impl Transport for HyperTransport {
    fn fetch(
        &self,
        request: NormalizedRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, TransportError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let url = request.url.clone();
            let uri: http::Uri = request
                .url
                .parse()
                .map_err(|e| TransportError::new(format!("invalid request URL {url:?}: {e}")))?;

            let mut builder = Request::builder()
                .method(http::Method::from(request.method))
                .uri(uri);
            for (name, value) in request.headers.iter() {
                builder = builder.header(name, value);
            }
            let req = builder
                .body(Full::new(request.body.unwrap_or_default()))
                .map_err(|e| TransportError::new(format!("failed to build request: {e}")))?;

            let response = client
                .request(req)
                .await
                .map_err(|e| TransportError::new(format!("request failed: {e}")))?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| TransportError::new(format!("failed to read response body: {e}")))?
                .to_bytes();

            Ok(TransportResponse {
                status,
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                url,
                headers,
                body,
            })
        })
    }
}

/// Builder for [`HyperTransport`].
pub struct HyperTransportBuilder {
    /// Connection pool idle timeout.
    pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host.
    pool_max_idle_per_host: usize,
}

impl Default for HyperTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransportBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }

    /// Set the connection pool idle timeout.
    ///
    /// Connections idle for longer than this are closed and removed from
    /// the pool. Default: 90 seconds.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the maximum number of idle connections per host.
    ///
    /// Default: 32.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HyperTransport, TransportError> {
        let https_connector = build_https_connector()?;

        let mut builder = Client::builder(TokioExecutor::new());
        // The pool timer is required for pool_idle_timeout to take effect.
        builder.pool_timer(TokioTimer::new());
        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }
        builder.pool_max_idle_per_host(self.pool_max_idle_per_host);

        Ok(HyperTransport {
            client: builder.build(https_connector),
        })
    }
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = HyperTransportBuilder::new();
        assert_eq!(builder.pool_idle_timeout, Some(Duration::from_secs(90)));
        assert_eq!(builder.pool_max_idle_per_host, 32);
    }

    #[test]
    fn test_builder_overrides() {
        let builder = HyperTransportBuilder::new()
            .pool_idle_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(4);
        assert_eq!(builder.pool_idle_timeout, Some(Duration::from_secs(5)));
        assert_eq!(builder.pool_max_idle_per_host, 4);
    }
}
