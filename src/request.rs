//! Request descriptors and normalization.
//!
//! A [`RequestDescriptor`] is the loosely-specified, caller-facing shape of a
//! request: every field optional, partial descriptors mergeable, a bare route
//! string accepted everywhere a descriptor is. Normalization (see
//! [`normalize`](crate::request::normalize)) turns a descriptor into a fully
//! specified [`NormalizedRequest`] for the transport.

pub(crate) mod normalize;
pub(crate) mod query;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::form::FormData;
use crate::path::PathSegment;

pub use normalize::NormalizedRequest;

/// HTTP methods supported by the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET (the default when a descriptor names no method).
    #[default]
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
}

impl Method {
    /// Parse a method name case-insensitively; `del` is accepted as an alias
    /// for DELETE.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "get" => Some(Method::Get),
            "put" => Some(Method::Put),
            "post" => Some(Method::Post),
            "del" | "delete" => Some(Method::Delete),
            "patch" => Some(Method::Patch),
            _ => None,
        }
    }

    /// Uppercase name, as it appears in response records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }

    /// GET and DELETE requests never carry a body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, Method::Get | Method::Delete)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Put => http::Method::PUT,
            Method::Post => http::Method::POST,
            Method::Delete => http::Method::DELETE,
            Method::Patch => http::Method::PATCH,
        }
    }
}

/// Request body variants.
#[derive(Clone, Debug)]
pub enum Body {
    /// Plain text; sent as-is with a `text/plain` default content type.
    Text(String),
    /// Raw bytes with a declared media type (the Blob/Buffer case).
    Binary {
        /// The payload.
        bytes: Bytes,
        /// The payload's declared media type.
        content_type: String,
    },
    /// A structured value, JSON-encoded with an `application/json` default.
    Json(Value),
    /// A multipart form, encoded with its own boundary.
    Form(FormData),
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<FormData> for Body {
    fn from(value: FormData) -> Self {
        Body::Form(value)
    }
}

/// Credential-inclusion policy forwarded to the transport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialsPolicy {
    /// Never send credentials.
    Omit,
    /// Send credentials to same-origin targets only (the default).
    #[default]
    SameOrigin,
    /// Always send credentials.
    Include,
}

impl CredentialsPolicy {
    /// Wire name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialsPolicy::Omit => "omit",
            CredentialsPolicy::SameOrigin => "same-origin",
            CredentialsPolicy::Include => "include",
        }
    }
}

/// Redirect-handling policy forwarded to the transport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectPolicy {
    /// Follow redirects (the default).
    #[default]
    Follow,
    /// Treat a redirect as an error.
    Error,
    /// Surface redirects to the caller untouched.
    Manual,
}

impl RedirectPolicy {
    /// Wire name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectPolicy::Follow => "follow",
            RedirectPolicy::Error => "error",
            RedirectPolicy::Manual => "manual",
        }
    }
}

/// Cross-origin request mode forwarded to the transport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Same-origin requests only.
    #[default]
    SameOrigin,
    /// Cross-origin requests allowed. Cookies cannot be set from the
    /// response on cross-origin requests.
    Cors,
    /// Cross-origin without CORS guarantees.
    NoCors,
}

impl RequestMode {
    /// Wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::SameOrigin => "same-origin",
            RequestMode::Cors => "cors",
            RequestMode::NoCors => "no-cors",
        }
    }
}

/// Hint for binary response bodies whose content type is neither text, JSON,
/// nor form-typed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseType {
    /// Yield raw bytes.
    ArrayBuffer,
    /// Yield bytes with their declared media type (the default).
    #[default]
    Blob,
}

/// A loosely-specified request.
///
/// All fields are optional so descriptors can be merged; a bare route string
/// converts into a descriptor with only `route` set.
///
/// # Example
///
/// ```
/// use unifetch::{Method, RequestDescriptor};
/// use serde_json::json;
///
/// let descriptor = RequestDescriptor::new()
///     .route("/api/posts")
///     .method(Method::Post)
///     .query("page", 2)
///     .body(json!({"title": "hello"}));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestDescriptor {
    /// Target route: absolute, root-relative, or relative.
    pub route: Option<String>,
    /// HTTP method; GET when unset.
    pub method: Option<Method>,
    /// Path segments appended to the route.
    pub params: Vec<PathSegment>,
    /// Query mapping; object and array values are JSON-encoded before
    /// serialization.
    pub query: Option<serde_json::Map<String, Value>>,
    /// Caller headers, merged over the computed defaults (caller wins).
    pub headers: Option<HeaderMap>,
    /// Request body; dropped with a diagnostic on GET and DELETE.
    pub body: Option<Body>,
    /// Credential policy override.
    pub credentials: Option<CredentialsPolicy>,
    /// Redirect policy override.
    pub redirect: Option<RedirectPolicy>,
    /// Request mode override.
    pub mode: Option<RequestMode>,
    /// Binary response hint.
    pub response_type: Option<ResponseType>,
    /// Legacy credentials toggle, superseded by `credentials` but still
    /// honored: `true` maps to `Include`, `false` to `SameOrigin`.
    pub include_creds: Option<bool>,
}

impl RequestDescriptor {
    /// An empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the route.
    pub fn route<S: Into<String>>(mut self, route: S) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Set the method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Append one path segment.
    pub fn param<S: Into<PathSegment>>(mut self, segment: S) -> Self {
        self.params.push(segment.into());
        self
    }

    /// Append several path segments.
    pub fn params<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.params.extend(segments.into_iter().map(Into::into));
        self
    }

    /// Add one query entry.
    pub fn query<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.query
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add one header.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: std::fmt::Debug,
        V: TryInto<HeaderValue>,
        V::Error: std::fmt::Debug,
    {
        let name = name.try_into().expect("invalid header name");
        let value = value.try_into().expect("invalid header value");
        self.headers.get_or_insert_with(HeaderMap::new).insert(name, value);
        self
    }

    /// Set the body.
    pub fn body<B: Into<Body>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Override the credentials policy.
    pub fn credentials(mut self, credentials: CredentialsPolicy) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the redirect policy.
    pub fn redirect(mut self, redirect: RedirectPolicy) -> Self {
        self.redirect = Some(redirect);
        self
    }

    /// Override the request mode.
    pub fn mode(mut self, mode: RequestMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the binary response hint.
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Set the legacy credentials toggle.
    pub fn include_creds(mut self, include: bool) -> Self {
        self.include_creds = Some(include);
        self
    }

    /// Merge this descriptor over a defaults descriptor.
    ///
    /// Fields present here win; absent fields fall back to `defaults`.
    /// `params` counts as present when non-empty.
    pub fn merged_over(self, defaults: RequestDescriptor) -> Self {
        Self {
            route: self.route.or(defaults.route),
            method: self.method.or(defaults.method),
            params: if self.params.is_empty() {
                defaults.params
            } else {
                self.params
            },
            query: self.query.or(defaults.query),
            headers: self.headers.or(defaults.headers),
            body: self.body.or(defaults.body),
            credentials: self.credentials.or(defaults.credentials),
            redirect: self.redirect.or(defaults.redirect),
            mode: self.mode.or(defaults.mode),
            response_type: self.response_type.or(defaults.response_type),
            include_creds: self.include_creds.or(defaults.include_creds),
        }
    }
}

impl From<&str> for RequestDescriptor {
    fn from(route: &str) -> Self {
        RequestDescriptor::new().route(route)
    }
}

impl From<String> for RequestDescriptor {
    fn from(route: String) -> Self {
        RequestDescriptor::new().route(route)
    }
}
