//! The transport boundary.
//!
//! A [`Transport`] is the injected fetch-like primitive performing the actual
//! network call: it receives a fully-specified [`NormalizedRequest`] and
//! resolves to a [`TransportResponse`] or a [`TransportError`]. The default
//! implementation is [`HyperTransport`]; tests and alternative environments
//! inject their own.

mod connector;
mod hyper;

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, StatusCode};

use crate::request::NormalizedRequest;

pub use hyper::{HyperTransport, HyperTransportBuilder};

/// Failure at the transport level: no HTTP response was produced.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create a transport error with a description of the failure.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A completed HTTP exchange.
///
/// Streaming bodies are out of scope, so the body arrives fully collected;
/// the dispatcher performs content-type-driven parsing from these bytes.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Reason phrase for the status.
    pub status_text: String,
    /// Final URL of the exchange.
    pub url: String,
    /// Response headers.
    pub headers: HeaderMap,
    /// Collected response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Whether the status is in the success range.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }
}

/// The fetch-like contract a host environment supplies.
///
/// Implementations receive the full normalized request, including the
/// fetch-style policy triple (`credentials`, `redirect`, `mode`); how much
/// of that policy an implementation can honor is its own business — the
/// default hyper transport acts on method, URL, headers, and body.
pub trait Transport: Send + Sync {
    /// Perform the exchange.
    fn fetch(
        &self,
        request: NormalizedRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, TransportError>>;
}
