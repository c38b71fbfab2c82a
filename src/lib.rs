//! Uniform HTTP request client for Rust.
//!
//! This crate presents one request API across host environments that differ
//! in how network I/O is performed: the transport is an injected, fetch-like
//! primitive, and everything around it — URL assembly, header merging,
//! query serialization, body encoding, content-type-driven response parsing,
//! success/error classification — is normalized by the client.
//!
//! ## Features
//!
//! - Shorthand methods per HTTP verb plus full request descriptors
//! - Root-relative route resolution against a configurable base URL
//!   (`BASE_URL`/`PORT` environment defaults, per-instance overrides)
//! - Content-type computation from the body shape (text, JSON, binary,
//!   multipart form)
//! - Query serialization with JSON-encoded structured values
//! - Response bindings: subscribe to errors, successes, or all responses
//! - Optional store bridge: drive bindings through a reducer/action
//!   protocol instead of direct subscription
//! - Injectable transports; a pooled hyper/rustls transport by default
//!
//! ## Example
//!
//! ```ignore
//! use unifetch::{FetchClient, RequestDescriptor};
//! use serde_json::json;
//!
//! let client = FetchClient::builder()
//!     .base_url("http://localhost:3000")
//!     .build()?;
//!
//! // Watch every failed request.
//! let unbind = client.bind_to_error(|record| {
//!     eprintln!("{} {} failed: {:?}", record.method, record.url, record.status);
//! });
//!
//! // Bare route strings work wherever a descriptor does.
//! let posts = client.get("/api/posts").await?;
//!
//! // Full descriptors for everything else.
//! let created = client
//!     .post(
//!         RequestDescriptor::from("/api/posts")
//!             .query("notify", true)
//!             .body(json!({"title": "hello"})),
//!     )
//!     .await?;
//!
//! unbind.unbind();
//! ```
//!
//! ## Response records
//!
//! Every dispatch resolves (or rejects) with a [`ResponseRecord`]: the
//! uppercased method, the transport's response metadata, and a body parsed
//! by content type. Failures carry the same record — an HTTP failure, a
//! body that would not parse, and a transport that never produced a
//! response all reject with a record describing what happened, so one
//! error handler covers all three.
//!
//! ## Bindings and the store bridge
//!
//! Handlers bound with [`FetchClient::bind_to_error`] (and friends) are
//! notified synchronously, in registration order, all-responses channel
//! first. The same channels can be driven through an external
//! unidirectional-state-update store: mount
//! [`store::bindings_reducer`], run [`store::sync_bindings_with_store`],
//! and dispatch the [`store`] module's action creators. Handlers that will
//! be unbound through the store should be registered with
//! [`BoundFn::named`], since a dispatched copy may not be pointer-identical
//! to the original.
//!
//! ## Environments
//!
//! Server-style processes resolve root-relative routes against a base URL
//! ([`BaseUrl::from_env`] reads `BASE_URL`, then `PORT`). Environments
//! whose transport resolves relative URLs natively build with
//! [`ClientBuilder::without_base_url`]. A process-wide client with the
//! same surface lives in [`shared`].

mod builder;
mod client;
mod error;

pub mod bindings;
pub mod env;
pub mod form;
pub mod path;
pub mod request;
pub mod response;
pub mod shared;
pub mod store;
pub mod transport;

pub use builder::{ClientBuildError, ClientBuilder};
pub use client::FetchClient;
pub use error::ClientError;

// Re-export from the bindings module
pub use bindings::{BindingsContainer, BoundFn, Channel, SharedBindings, Unbind};

// Re-export from the env module
pub use env::BaseUrl;

// Re-export from the form module
pub use form::{FormData, Part};

// Re-export from the request module
pub use request::{
    Body, CredentialsPolicy, Method, NormalizedRequest, RedirectPolicy, RequestDescriptor,
    RequestMode, ResponseType,
};

// Re-export from the response module
pub use response::{ResponseBody, ResponseRecord};

// Re-export from the store module
pub use store::{
    BindingsAction, BindingsState, BindingsStore, Dispatchable, StoreError,
    bind_to_error_action, bind_to_response_action, bind_to_success_action, bindings_reducer,
    sync_bindings_with_store, thunk_middleware, unbind_from_error_action,
    unbind_from_response_action, unbind_from_success_action,
};

// Re-export transport types at the top level for convenience
pub use transport::{
    HyperTransport, HyperTransportBuilder, Transport, TransportError, TransportResponse,
};

// Re-export from the path module
pub use path::PathSegment;

// Re-export core payload type that users need
pub use bytes::Bytes;
