//! Process-wide shared client.
//!
//! A static mirror of the instance API for callers that want one client per
//! process: the same shorthand methods, bindings, and base URL control,
//! backed by a single lazily-initialized [`FetchClient`]. The shared client
//! synthesizes `404` records for transport-level failures where instance
//! clients use `501`.
//!
//! The shared client owns one process-wide bindings container with the same
//! semantics as an instance's.

use std::sync::LazyLock;

use http::StatusCode;

use crate::ClientError;
use crate::client::FetchClient;
use crate::bindings::Unbind;
use crate::request::RequestDescriptor;
use crate::response::ResponseRecord;

static SHARED: LazyLock<FetchClient> = LazyLock::new(|| {
    FetchClient::builder()
        .fallback_status(StatusCode::NOT_FOUND)
        .build()
        .expect("failed to initialize the shared fetch client")
});

/// The shared client instance.
pub fn client() -> &'static FetchClient {
    &SHARED
}

/// Dispatch a request through the shared client.
pub async fn make_request<D: Into<RequestDescriptor>>(
    descriptor: D,
) -> Result<ResponseRecord, ClientError> {
    client().make_request(descriptor).await
}

/// Dispatch a GET request through the shared client.
pub async fn get<D: Into<RequestDescriptor>>(descriptor: D) -> Result<ResponseRecord, ClientError> {
    client().get(descriptor).await
}

/// Dispatch a PUT request through the shared client.
pub async fn put<D: Into<RequestDescriptor>>(descriptor: D) -> Result<ResponseRecord, ClientError> {
    client().put(descriptor).await
}

/// Dispatch a POST request through the shared client.
pub async fn post<D: Into<RequestDescriptor>>(
    descriptor: D,
) -> Result<ResponseRecord, ClientError> {
    client().post(descriptor).await
}

/// Dispatch a DELETE request through the shared client.
pub async fn del<D: Into<RequestDescriptor>>(descriptor: D) -> Result<ResponseRecord, ClientError> {
    client().del(descriptor).await
}

/// Dispatch a PATCH request through the shared client.
pub async fn patch<D: Into<RequestDescriptor>>(
    descriptor: D,
) -> Result<ResponseRecord, ClientError> {
    client().patch(descriptor).await
}

/// Bind a handler to the shared client's error channel.
pub fn bind_to_error<F>(func: F) -> Unbind
where
    F: Fn(&ResponseRecord) + Send + Sync + 'static,
{
    client().bind_to_error(func)
}

/// Bind a handler to the shared client's success channel.
pub fn bind_to_success<F>(func: F) -> Unbind
where
    F: Fn(&ResponseRecord) + Send + Sync + 'static,
{
    client().bind_to_success(func)
}

/// Bind a handler to the shared client's all-responses channel.
pub fn bind_to_response<F>(func: F) -> Unbind
where
    F: Fn(&ResponseRecord) + Send + Sync + 'static,
{
    client().bind_to_response(func)
}

/// Replace the shared client's base URL. See
/// [`BaseUrl::set`](crate::env::BaseUrl::set) for the resolution rules.
/// Returns the new value.
pub fn set_base_url(host: Option<&str>, port: Option<u16>) -> String {
    client().set_base_url(host, port)
}

/// The shared client's current base URL.
pub fn base_url() -> String {
    client().base_url()
}

#[cfg(test)]
mod tests {
    use crate::builder::ClientBuilder;
    use crate::request::NormalizedRequest;
    use crate::transport::{Transport, TransportError, TransportResponse};
    use futures::future::BoxFuture;
    use http::StatusCode;

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn fetch(
            &self,
            _request: NormalizedRequest,
        ) -> BoxFuture<'static, Result<TransportResponse, TransportError>> {
            Box::pin(futures::future::ready(Err(TransportError::new(
                "connection refused",
            ))))
        }
    }

    #[tokio::test]
    async fn test_shared_variant_synthesizes_404() {
        // The shared client is built with a 404 fallback; exercise that
        // configuration without touching the process-wide instance.
        let client = ClientBuilder::new()
            .base_url("http://localhost:3000")
            .transport(FailingTransport)
            .fallback_status(StatusCode::NOT_FOUND)
            .build()
            .unwrap();

        let err = client.get("/api").await.unwrap_err();
        let record = err.record().unwrap();
        assert_eq!(record.status_u16(), Some(404));
        assert!(record.status_text.contains("connection refused"));
    }
}
