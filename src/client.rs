//! Request dispatch and the public client.
//!
//! This module provides [`FetchClient`], the main entry point: shorthand
//! methods per HTTP verb, [`make_request`](FetchClient::make_request) for
//! full descriptors, channel bindings, and base URL control.

use std::sync::{Arc, Mutex, PoisonError};

use http::{HeaderValue, StatusCode};

use crate::ClientError;
use crate::bindings::{self, BoundFn, Channel, SharedBindings, Unbind};
use crate::builder::ClientBuilder;
use crate::env::BaseUrl;
use crate::request::normalize::normalize;
use crate::request::{Method, RequestDescriptor};
use crate::response::parse::parse_body;
use crate::response::ResponseRecord;
use crate::transport::Transport;

/// Uniform HTTP request client.
///
/// A client owns its bindings container and base URL configuration for its
/// whole lifetime; clones share both, independent instances built separately
/// do not. The transport is injected at construction (see [`ClientBuilder`]),
/// which is how the same dispatch pipeline serves different host
/// environments.
///
/// # Example
///
/// ```ignore
/// use unifetch::{FetchClient, Method, RequestDescriptor};
/// use serde_json::json;
///
/// let client = FetchClient::new()?;
///
/// let unbind = client.bind_to_error(|record| {
///     eprintln!("request failed: {} {}", record.method, record.url);
/// });
///
/// let record = client
///     .post(RequestDescriptor::from("/api/posts").body(json!({"title": "hi"})))
///     .await?;
/// println!("created: {:?}", record.body);
///
/// unbind.unbind();
/// ```
#[derive(Clone)]
pub struct FetchClient {
    /// Injected transport performing the actual network calls.
    transport: Arc<dyn Transport>,
    /// Owned base URL configuration; shared across clones.
    base_url: Arc<Mutex<BaseUrl>>,
    /// Ambient cookie header forwarded on every request (server-side
    /// session forwarding), captured at construction.
    cookie: Option<HeaderValue>,
    /// Subscriber channels; shared across clones and with the store bridge.
    bindings: SharedBindings,
    /// Status used when synthesizing a record for a transport-level failure.
    fallback_status: StatusCode,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("base_url", &self.base_url())
            .field("has_cookie", &self.cookie.is_some())
            .field("fallback_status", &self.fallback_status)
            .finish_non_exhaustive()
    }
}

impl FetchClient {
    /// Create a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with default settings: the hyper transport and the
    /// base URL resolved from the process environment.
    pub fn new() -> Result<Self, crate::builder::ClientBuildError> {
        Self::builder().build()
    }

    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        base_url: BaseUrl,
        cookie: Option<HeaderValue>,
        fallback_status: StatusCode,
    ) -> Self {
        Self {
            transport,
            base_url: Arc::new(Mutex::new(base_url)),
            cookie,
            bindings: SharedBindings::default(),
            fallback_status,
        }
    }

    /// The current base URL; empty for detached configurations.
    pub fn base_url(&self) -> String {
        self.lock_base().as_str().to_string()
    }

    /// Replace the base URL. See [`BaseUrl::set`] for the resolution rules.
    /// Returns the new value.
    pub fn set_base_url(&self, host: Option<&str>, port: Option<u16>) -> String {
        self.lock_base().set(host, port).to_string()
    }

    fn lock_base(&self) -> std::sync::MutexGuard<'_, BaseUrl> {
        self.base_url.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The client's live bindings handle, shared with the store bridge.
    pub fn bindings_handle(&self) -> SharedBindings {
        self.bindings.clone()
    }

    /// Bind a handler to the error channel.
    pub fn bind_to_error<F>(&self, func: F) -> Unbind
    where
        F: Fn(&ResponseRecord) + Send + Sync + 'static,
    {
        self.bind(Channel::Error, BoundFn::new(func))
    }

    /// Bind a handler to the success channel.
    pub fn bind_to_success<F>(&self, func: F) -> Unbind
    where
        F: Fn(&ResponseRecord) + Send + Sync + 'static,
    {
        self.bind(Channel::Success, BoundFn::new(func))
    }

    /// Bind a handler to the all-responses channel.
    pub fn bind_to_response<F>(&self, func: F) -> Unbind
    where
        F: Fn(&ResponseRecord) + Send + Sync + 'static,
    {
        self.bind(Channel::Response, BoundFn::new(func))
    }

    /// Bind a prepared handler (named or anonymous) to a channel.
    pub fn bind(&self, channel: Channel, func: BoundFn) -> Unbind {
        bindings::bind(&self.bindings, channel, func)
    }

    /// Dispatch a GET request.
    pub async fn get<D: Into<RequestDescriptor>>(
        &self,
        descriptor: D,
    ) -> Result<ResponseRecord, ClientError> {
        self.request_with_method(Method::Get, descriptor.into()).await
    }

    /// Dispatch a PUT request.
    pub async fn put<D: Into<RequestDescriptor>>(
        &self,
        descriptor: D,
    ) -> Result<ResponseRecord, ClientError> {
        self.request_with_method(Method::Put, descriptor.into()).await
    }

    /// Dispatch a POST request.
    pub async fn post<D: Into<RequestDescriptor>>(
        &self,
        descriptor: D,
    ) -> Result<ResponseRecord, ClientError> {
        self.request_with_method(Method::Post, descriptor.into()).await
    }

    /// Dispatch a DELETE request.
    pub async fn del<D: Into<RequestDescriptor>>(
        &self,
        descriptor: D,
    ) -> Result<ResponseRecord, ClientError> {
        self.request_with_method(Method::Delete, descriptor.into())
            .await
    }

    /// Dispatch a PATCH request.
    pub async fn patch<D: Into<RequestDescriptor>>(
        &self,
        descriptor: D,
    ) -> Result<ResponseRecord, ClientError> {
        self.request_with_method(Method::Patch, descriptor.into())
            .await
    }

    async fn request_with_method(
        &self,
        method: Method,
        mut descriptor: RequestDescriptor,
    ) -> Result<ResponseRecord, ClientError> {
        // A method already named on the descriptor wins over the shorthand.
        descriptor.method.get_or_insert(method);
        self.make_request(descriptor).await
    }

    /// Dispatch a request described by a descriptor (or a bare route
    /// string).
    ///
    /// # Errors
    ///
    /// All failures are [`ClientError`]s: usage errors abort before
    /// dispatch, HTTP and transport failures carry the full
    /// [`ResponseRecord`]. Error and all-responses subscribers are notified
    /// before the error is returned, so global handlers observe every
    /// failure exactly once.
    pub async fn make_request<D: Into<RequestDescriptor>>(
        &self,
        descriptor: D,
    ) -> Result<ResponseRecord, ClientError> {
        self.dispatch(descriptor.into()).await
    }

    async fn dispatch(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<ResponseRecord, ClientError> {
        // 1. Normalize the descriptor into a transport request.
        let base_url = self.base_url();
        let normalized = normalize(descriptor, &base_url, self.cookie.as_ref())?;
        let url = normalized.url.clone();
        let response_type = normalized.response_type;

        // 2. Pre-populate the record so even a transport failure identifies
        // the request.
        let mut record = ResponseRecord::pending(normalized.method);

        tracing::debug!(method = %record.method, url = %url, "dispatching request");

        // 3. Perform the exchange.
        match self.transport.fetch(normalized).await {
            Ok(response) => {
                // 4. Merge transport metadata before parsing, so a parse
                // failure still rejects with a fully-described record.
                record.merge_transport(&response);

                let content_type = response
                    .headers
                    .get(http::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                match parse_body(content_type.as_deref(), response_type, response.body) {
                    Ok(body) => record.body = Some(body),
                    Err(message) => {
                        bindings::notify(&self.bindings, Channel::Error, &record);
                        return Err(ClientError::Decode { record, message });
                    }
                }

                // 5. Classify by the transport's ok flag and notify:
                // all-responses first, then the outcome channel.
                if record.ok {
                    bindings::notify(&self.bindings, Channel::Success, &record);
                    Ok(record)
                } else {
                    record.status_text = format!(
                        "{} \n {} \n {} ({})",
                        record.method,
                        url,
                        response.status.as_u16(),
                        response.status_text
                    );
                    bindings::notify(&self.bindings, Channel::Error, &record);
                    Err(ClientError::Http { record })
                }
            }
            Err(err) => {
                // 6. No response ever arrived: synthesize a response-shaped
                // record so downstream handlers treat transport failures
                // uniformly with HTTP-level failures.
                if record.is_unfulfilled() {
                    record.url = url.clone();
                    record.status = Some(self.fallback_status);
                    record.ok = false;
                    record.status_text = format!(
                        "{} \n {} \n {} ({})",
                        record.method,
                        url,
                        self.fallback_status.as_u16(),
                        err
                    );
                }
                bindings::notify(&self.bindings, Channel::Error, &record);
                Err(ClientError::Transport {
                    record,
                    message: err.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{NormalizedRequest, RequestDescriptor};
    use crate::transport::{TransportError, TransportResponse};
    use bytes::Bytes;
    use futures::future::BoxFuture;
    use http::HeaderMap;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport that answers every request with a canned result and
    /// records what it was asked to send.
    struct MockTransport {
        result: Box<dyn Fn() -> Result<TransportResponse, TransportError> + Send + Sync>,
        seen: Arc<Mutex<Vec<NormalizedRequest>>>,
    }

    impl MockTransport {
        fn returning(
            result: impl Fn() -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
        ) -> (Self, Arc<Mutex<Vec<NormalizedRequest>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    result: Box::new(result),
                    seen: seen.clone(),
                },
                seen,
            )
        }
    }

    impl Transport for MockTransport {
        fn fetch(
            &self,
            request: NormalizedRequest,
        ) -> BoxFuture<'static, Result<TransportResponse, TransportError>> {
            self.seen.lock().unwrap().push(request);
            let result = (self.result)();
            Box::pin(futures::future::ready(result))
        }
    }

    fn json_response(status: StatusCode, body: &str) -> TransportResponse {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );
        TransportResponse {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            url: "http://localhost:3000/api".to_string(),
            headers,
            body: Bytes::from(body.to_string()),
        }
    }

    fn client_with(
        transport: impl Transport + 'static,
    ) -> FetchClient {
        FetchClient::from_parts(
            Arc::new(transport),
            BaseUrl::new("http://localhost:3000"),
            None,
            StatusCode::NOT_IMPLEMENTED,
        )
    }

    #[tokio::test]
    async fn test_successful_get_resolves_with_parsed_body() {
        let (transport, seen) =
            MockTransport::returning(|| Ok(json_response(StatusCode::OK, r#"{"id":7}"#)));
        let client = client_with(transport);

        let record = client.get("/api/posts").await.unwrap();
        assert_eq!(record.method, "GET");
        assert!(record.ok);
        assert_eq!(record.status_u16(), Some(200));
        assert_eq!(record.body.unwrap().as_json(), Some(&json!({"id": 7})));

        let sent = seen.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://localhost:3000/api/posts");
        assert_eq!(sent[0].method, Method::Get);
    }

    #[tokio::test]
    async fn test_http_failure_rejects_with_record() {
        let (transport, _) = MockTransport::returning(|| {
            Ok(json_response(StatusCode::NOT_FOUND, r#"{"error":"gone"}"#))
        });
        let client = client_with(transport);

        let err = client.get("/missing").await.unwrap_err();
        let ClientError::Http { record } = &err else {
            panic!("expected an HTTP error, got {err:?}");
        };
        assert_eq!(record.status_u16(), Some(404));
        assert!(record.status_text.contains("GET"));
        assert!(record.status_text.contains("http://localhost:3000/missing"));
        assert!(record.status_text.contains("404"));
        assert_eq!(
            record.body.as_ref().unwrap().as_json(),
            Some(&json!({"error": "gone"}))
        );
    }

    #[tokio::test]
    async fn test_failure_notifies_response_then_error_exactly_once() {
        let (transport, _) = MockTransport::returning(|| {
            Ok(json_response(StatusCode::NOT_FOUND, r#"{}"#))
        });
        let client = client_with(transport);

        let order = Arc::new(Mutex::new(Vec::new()));
        let seen = order.clone();
        client.bind_to_response(move |record| {
            seen.lock().unwrap().push(("response", record.status_u16()));
        });
        let seen = order.clone();
        client.bind_to_error(move |record| {
            seen.lock().unwrap().push(("error", record.status_u16()));
        });
        let success_calls = Arc::new(AtomicUsize::new(0));
        let counter = success_calls.clone();
        client.bind_to_success(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let _ = client.get("/missing").await;

        assert_eq!(
            *order.lock().unwrap(),
            [("response", Some(404)), ("error", Some(404))]
        );
        assert_eq!(success_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_notifies_response_then_success() {
        let (transport, _) =
            MockTransport::returning(|| Ok(json_response(StatusCode::OK, r#"{}"#)));
        let client = client_with(transport);

        let order = Arc::new(Mutex::new(Vec::new()));
        let seen = order.clone();
        client.bind_to_response(move |_| seen.lock().unwrap().push("response"));
        let seen = order.clone();
        client.bind_to_success(move |_| seen.lock().unwrap().push("success"));

        client.get("/api").await.unwrap();
        assert_eq!(*order.lock().unwrap(), ["response", "success"]);
    }

    #[tokio::test]
    async fn test_transport_failure_synthesizes_record() {
        let (transport, _) =
            MockTransport::returning(|| Err(TransportError::new("connection refused")));
        let client = client_with(transport);

        let err = client.post("/api").await.unwrap_err();
        let ClientError::Transport { record, message } = &err else {
            panic!("expected a transport error, got {err:?}");
        };
        assert_eq!(record.status_u16(), Some(501));
        assert_eq!(record.method, "POST");
        assert_eq!(record.url, "http://localhost:3000/api");
        assert!(record.status_text.contains("connection refused"));
        assert!(!record.ok);
        assert_eq!(message, "connection refused");
    }

    #[tokio::test]
    async fn test_transport_failure_notifies_error_channel() {
        let (transport, _) =
            MockTransport::returning(|| Err(TransportError::new("dns failure")));
        let client = client_with(transport);

        let order = Arc::new(Mutex::new(Vec::new()));
        let seen = order.clone();
        client.bind_to_response(move |record| {
            seen.lock().unwrap().push(("response", record.status_u16()));
        });
        let seen = order.clone();
        client.bind_to_error(move |record| {
            seen.lock().unwrap().push(("error", record.status_u16()));
        });

        let _ = client.get("/api").await;
        assert_eq!(
            *order.lock().unwrap(),
            [("response", Some(501)), ("error", Some(501))]
        );
    }

    #[tokio::test]
    async fn test_missing_route_aborts_before_transport() {
        let (transport, seen) =
            MockTransport::returning(|| Ok(json_response(StatusCode::OK, "{}")));
        let client = client_with(transport);

        let err = client.make_request(RequestDescriptor::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingRoute));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_strips_body_before_transport() {
        let (transport, seen) =
            MockTransport::returning(|| Ok(json_response(StatusCode::OK, "{}")));
        let client = client_with(transport);

        client
            .get(RequestDescriptor::from("/api").body(json!({"a": 1})))
            .await
            .unwrap();

        let sent = seen.lock().unwrap();
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn test_shorthand_methods_set_method() {
        let (transport, seen) =
            MockTransport::returning(|| Ok(json_response(StatusCode::OK, "{}")));
        let client = client_with(transport);

        client.put("/a").await.unwrap();
        client.post("/b").await.unwrap();
        client.del("/c").await.unwrap();
        client.patch("/d").await.unwrap();

        let sent = seen.lock().unwrap();
        let methods: Vec<_> = sent.iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            [Method::Put, Method::Post, Method::Delete, Method::Patch]
        );
    }

    #[tokio::test]
    async fn test_descriptor_method_wins_over_shorthand() {
        let (transport, seen) =
            MockTransport::returning(|| Ok(json_response(StatusCode::OK, "{}")));
        let client = client_with(transport);

        client
            .get(RequestDescriptor::from("/api").method(Method::Post))
            .await
            .unwrap();
        assert_eq!(seen.lock().unwrap()[0].method, Method::Post);
    }

    #[tokio::test]
    async fn test_decode_failure_keeps_metadata_and_notifies() {
        let (transport, _) =
            MockTransport::returning(|| Ok(json_response(StatusCode::OK, "not json")));
        let client = client_with(transport);

        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        client.bind_to_error(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let err = client.get("/api").await.unwrap_err();
        let ClientError::Decode { record, .. } = &err else {
            panic!("expected a decode error, got {err:?}");
        };
        assert_eq!(record.status_u16(), Some(200));
        assert!(record.body.is_none());
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_set_base_url_affects_subsequent_requests() {
        let (transport, seen) =
            MockTransport::returning(|| Ok(json_response(StatusCode::OK, "{}")));
        let client = client_with(transport);

        client.set_base_url(Some("http://example.test"), Some(8080));
        assert_eq!(client.base_url(), "http://example.test:8080");

        client.get("/api").await.unwrap();
        assert_eq!(seen.lock().unwrap()[0].url, "http://example.test:8080/api");
    }

    #[tokio::test]
    async fn test_clones_share_bindings_and_base_url() {
        let (transport, _) =
            MockTransport::returning(|| Ok(json_response(StatusCode::OK, "{}")));
        let client = client_with(transport);
        let clone = client.clone();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        clone.bind_to_success(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client.get("/api").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clone.set_base_url(Some("http://shared.test"), None);
        assert_eq!(client.base_url(), "http://shared.test");
    }

    #[tokio::test]
    async fn test_cookie_is_forwarded() {
        let (transport, seen) =
            MockTransport::returning(|| Ok(json_response(StatusCode::OK, "{}")));
        let client = FetchClient::from_parts(
            Arc::new(transport),
            BaseUrl::new("http://localhost:3000"),
            Some(HeaderValue::from_static("session=abc")),
            StatusCode::NOT_IMPLEMENTED,
        );

        client.get("/api").await.unwrap();
        let sent = seen.lock().unwrap();
        assert_eq!(
            sent[0].headers.get(http::header::COOKIE).unwrap(),
            "session=abc"
        );
    }
}
