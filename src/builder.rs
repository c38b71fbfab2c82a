//! Client construction.
//!
//! [`ClientBuilder`] assembles the environment descriptor a client runs
//! with: which transport performs the I/O, which base URL anchors
//! root-relative routes, and which cookie header is forwarded on every
//! request.

use std::sync::Arc;

use http::{HeaderMap, HeaderValue, StatusCode, header::COOKIE};

use crate::client::FetchClient;
use crate::env::BaseUrl;
use crate::transport::{HyperTransport, Transport};

/// Builder for [`FetchClient`].
///
/// # Example
///
/// ```ignore
/// use unifetch::FetchClient;
///
/// let client = FetchClient::builder()
///     .base_url("http://localhost:8080")
///     .build()?;
/// ```
pub struct ClientBuilder {
    /// Base URL; resolved from the environment when unset.
    base_url: Option<BaseUrl>,
    /// Injected transport; the hyper transport when unset.
    transport: Option<Arc<dyn Transport>>,
    /// Cookie header forwarded on every request.
    cookie: Option<HeaderValue>,
    /// Status synthesized for transport-level failures.
    fallback_status: StatusCode,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.is_some())
            .field("has_cookie", &self.cookie.is_some())
            .field("fallback_status", &self.fallback_status)
            .finish()
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            transport: None,
            cookie: None,
            fallback_status: StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// Set an explicit base URL. A trailing slash is dropped.
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(BaseUrl::new(base_url));
        self
    }

    /// Run without a base URL.
    ///
    /// Root-relative routes then reach the transport untouched, for
    /// transports that resolve relative URLs against their own origin.
    pub fn without_base_url(mut self) -> Self {
        self.base_url = Some(BaseUrl::detached());
        self
    }

    /// Inject a transport. The default is [`HyperTransport`].
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Inject an already-shared transport.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Forward the `cookie` header from an incoming request's headers, so
    /// server-side dispatches carry the caller's session.
    pub fn forward_cookies(mut self, incoming: &HeaderMap) -> Self {
        self.cookie = incoming.get(COOKIE).cloned();
        self
    }

    /// Forward an explicit cookie header value.
    pub fn cookie(mut self, cookie: HeaderValue) -> Self {
        self.cookie = Some(cookie);
        self
    }

    /// Status used when synthesizing a record for a transport-level
    /// failure.
    pub(crate) fn fallback_status(mut self, status: StatusCode) -> Self {
        self.fallback_status = status;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Fails when no transport was injected and the default transport
    /// cannot be constructed.
    pub fn build(self) -> Result<FetchClient, ClientBuildError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                HyperTransport::new()
                    .map_err(|e| ClientBuildError::Transport(e.to_string()))?,
            ),
        };
        let base_url = self.base_url.unwrap_or_default();

        Ok(FetchClient::from_parts(
            transport,
            base_url,
            self.cookie,
            self.fallback_status,
        ))
    }
}

/// Error type for client building failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// Failed to create the default HTTP transport.
    #[error("failed to create HTTP transport: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::NormalizedRequest;
    use crate::transport::{TransportError, TransportResponse};
    use futures::future::BoxFuture;

    struct NullTransport;

    impl Transport for NullTransport {
        fn fetch(
            &self,
            _request: NormalizedRequest,
        ) -> BoxFuture<'static, Result<TransportResponse, TransportError>> {
            Box::pin(futures::future::ready(Err(TransportError::new("null"))))
        }
    }

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::new();
        assert!(builder.base_url.is_none());
        assert!(builder.transport.is_none());
        assert!(builder.cookie.is_none());
        assert_eq!(builder.fallback_status, StatusCode::NOT_IMPLEMENTED);
    }

    #[test]
    fn test_builder_normalizes_base_url() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000/")
            .transport(NullTransport)
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_builder_without_base_url() {
        let client = ClientBuilder::new()
            .without_base_url()
            .transport(NullTransport)
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "");
    }

    #[test]
    fn test_forward_cookies_picks_cookie_header() {
        let mut incoming = HeaderMap::new();
        incoming.insert(COOKIE, HeaderValue::from_static("session=abc"));
        incoming.insert("x-other", HeaderValue::from_static("ignored"));

        let builder = ClientBuilder::new().forward_cookies(&incoming);
        assert_eq!(builder.cookie.unwrap(), "session=abc");
    }

    #[test]
    fn test_forward_cookies_without_cookie_header() {
        let builder = ClientBuilder::new().forward_cookies(&HeaderMap::new());
        assert!(builder.cookie.is_none());
    }
}
