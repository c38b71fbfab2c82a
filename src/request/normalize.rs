//! Descriptor normalization.
//!
//! Turns a loosely-specified [`RequestDescriptor`] into a fully-specified
//! [`NormalizedRequest`]: absolute URL, merged headers with a computed
//! content type, encoded body, serialized query string, and resolved
//! transport policies.

use bytes::Bytes;
use http::header::{ACCEPT, ACCEPT_ENCODING, CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderValue};

use crate::error::ClientError;
use crate::path;
use crate::request::query::serialize_query;
use crate::request::{
    Body, CredentialsPolicy, Method, RedirectPolicy, RequestDescriptor, RequestMode, ResponseType,
};

/// Default `Accept-Encoding` advertised on every request.
const DEFAULT_ACCEPT_ENCODING: &str = "gzip, deflate, sdch, br";

/// A fully-specified request, ready for the transport.
///
/// Carries the complete fetch-style policy triple (`credentials`,
/// `redirect`, `mode`) so transports that can act on them receive them;
/// transports that cannot simply read `method`/`url`/`headers`/`body`.
#[derive(Clone, Debug)]
pub struct NormalizedRequest {
    /// Absolute (or transport-resolvable) URL: route + params path + query.
    pub url: String,
    /// Resolved method.
    pub method: Method,
    /// Merged headers, caller entries last.
    pub headers: HeaderMap,
    /// Encoded body, if the method allows one.
    pub body: Option<Bytes>,
    /// Resolved credentials policy.
    pub credentials: CredentialsPolicy,
    /// Resolved redirect policy.
    pub redirect: RedirectPolicy,
    /// Resolved request mode.
    pub mode: RequestMode,
    /// Binary response hint, forwarded to response parsing.
    pub response_type: ResponseType,
}

/// Normalize a descriptor against a base URL and an ambient cookie header.
///
/// # Errors
///
/// Returns [`ClientError::MissingRoute`] when the descriptor names no route,
/// and [`ClientError::Encode`] when a structured body or query value cannot
/// be serialized.
pub(crate) fn normalize(
    descriptor: RequestDescriptor,
    base_url: &str,
    cookie: Option<&HeaderValue>,
) -> Result<NormalizedRequest, ClientError> {
    // 1. A request without a route cannot be dispatched.
    let Some(route) = descriptor.route.filter(|route| !route.is_empty()) else {
        tracing::error!("no route specified on request");
        return Err(ClientError::MissingRoute);
    };

    let method = descriptor.method.unwrap_or_default();

    // 2. Root-relative routes need the base URL prefix; an empty base means
    // the transport resolves relative URLs itself.
    let root_relative = route.starts_with('/');
    let route = if root_relative && !base_url.is_empty() {
        format!("{base_url}{route}")
    } else {
        route
    };

    // 3./4. GET and DELETE requests never carry a body.
    let mut body = descriptor.body;
    if body.is_some() && !method.allows_body() {
        tracing::error!(
            method = %method,
            "request body can not be sent on GET or DELETE requests, body has been dropped"
        );
        body = None;
    }

    // 5. Default headers, then the ambient cookie, then caller headers.
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        ACCEPT_ENCODING,
        HeaderValue::from_static(DEFAULT_ACCEPT_ENCODING),
    );
    if let Some(content_type) = computed_content_type(body.as_ref()) {
        headers.insert(CONTENT_TYPE, content_type);
    }
    if let Some(cookie) = cookie {
        headers.insert(COOKIE, cookie.clone());
    }
    if let Some(caller_headers) = &descriptor.headers {
        for (name, value) in caller_headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
    }

    // 7. Query string.
    let query_string = serialize_query(descriptor.query.as_ref())?;

    // 8. Full URL.
    let params_path = path::join(&descriptor.params);
    let url = format!("{}{query_string}", path::join_url(&route, &params_path));

    // 9. Transport policies.
    let credentials = descriptor.credentials.unwrap_or_else(|| {
        match descriptor.include_creds {
            Some(true) => CredentialsPolicy::Include,
            _ => CredentialsPolicy::SameOrigin,
        }
    });
    let redirect = descriptor.redirect.unwrap_or_default();
    let mode = descriptor.mode.unwrap_or_else(|| {
        let same_origin =
            root_relative || (!base_url.is_empty() && route.starts_with(base_url));
        if same_origin {
            RequestMode::SameOrigin
        } else {
            RequestMode::Cors
        }
    });

    // 10. Encode whatever body survived step 4.
    let body = body.map(|body| encode_body(body, &headers)).transpose()?;

    Ok(NormalizedRequest {
        url,
        method,
        headers,
        body,
        credentials,
        redirect,
        mode,
        response_type: descriptor.response_type.unwrap_or_default(),
    })
}

/// Content type derived from the body shape. Callers can still override it
/// through their own headers.
fn computed_content_type(body: Option<&Body>) -> Option<HeaderValue> {
    let value = match body {
        None | Some(Body::Text(_)) => HeaderValue::from_static("text/plain"),
        Some(Body::Binary { content_type, .. }) => HeaderValue::from_str(content_type).ok()?,
        Some(Body::Form(form)) => HeaderValue::from_str(&form.content_type()).ok()?,
        Some(Body::Json(_)) => HeaderValue::from_static("application/json"),
    };
    Some(value)
}

/// Encode the body into transport bytes.
///
/// Structured values become JSON when the merged content type is still
/// `application/json`; text, binary, and form bodies pass through in their
/// natural encodings.
fn encode_body(body: Body, headers: &HeaderMap) -> Result<Bytes, ClientError> {
    match body {
        Body::Text(text) => Ok(Bytes::from(text)),
        Body::Binary { bytes, .. } => Ok(bytes),
        Body::Form(form) => Ok(form.encode()),
        Body::Json(value) => {
            let is_json = headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with("application/json"));
            if is_json {
                serde_json::to_vec(&value)
                    .map(Bytes::from)
                    .map_err(|e| ClientError::Encode(format!("JSON body encoding failed: {e}")))
            } else {
                // The caller overrode the content type; send the value's
                // textual form untouched.
                Ok(Bytes::from(value.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormData;
    use crate::path::PathSegment;
    use serde_json::json;

    fn normalize_ok(descriptor: RequestDescriptor, base: &str) -> NormalizedRequest {
        normalize(descriptor, base, None).unwrap()
    }

    #[test]
    fn test_missing_route_is_a_usage_error() {
        let result = normalize(RequestDescriptor::new(), "", None);
        assert!(matches!(result, Err(ClientError::MissingRoute)));
    }

    #[test]
    fn test_root_relative_route_gets_base_prefix() {
        let normalized = normalize_ok(
            RequestDescriptor::from("/api/posts"),
            "http://localhost:3000",
        );
        assert_eq!(normalized.url, "http://localhost:3000/api/posts");
    }

    #[test]
    fn test_empty_base_leaves_relative_routes_alone() {
        let normalized = normalize_ok(RequestDescriptor::from("/api/posts"), "");
        assert_eq!(normalized.url, "/api/posts");
    }

    #[test]
    fn test_absolute_route_ignores_base() {
        let normalized = normalize_ok(
            RequestDescriptor::from("https://api.example.com/v1"),
            "http://localhost:3000",
        );
        assert_eq!(normalized.url, "https://api.example.com/v1");
    }

    #[test]
    fn test_body_is_dropped_on_get_and_delete() {
        for method in [Method::Get, Method::Delete] {
            let normalized = normalize_ok(
                RequestDescriptor::from("/api")
                    .method(method)
                    .body(json!({"a": 1})),
                "",
            );
            assert!(normalized.body.is_none());
        }
    }

    #[test]
    fn test_body_survives_on_post() {
        let normalized = normalize_ok(
            RequestDescriptor::from("/api")
                .method(Method::Post)
                .body(json!({"a": 1})),
            "",
        );
        assert_eq!(normalized.body.unwrap(), Bytes::from(r#"{"a":1}"#));
    }

    #[test]
    fn test_default_headers() {
        let normalized = normalize_ok(RequestDescriptor::from("/api"), "");
        assert_eq!(normalized.headers.get(ACCEPT).unwrap(), "*/*");
        assert_eq!(
            normalized.headers.get(ACCEPT_ENCODING).unwrap(),
            "gzip, deflate, sdch, br"
        );
        assert_eq!(normalized.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_content_type_follows_body_shape() {
        let normalized = normalize_ok(
            RequestDescriptor::from("/api").method(Method::Post).body(json!({})),
            "",
        );
        assert_eq!(
            normalized.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let normalized = normalize_ok(
            RequestDescriptor::from("/api")
                .method(Method::Post)
                .body(Body::Binary {
                    bytes: Bytes::from_static(b"\x00\x01"),
                    content_type: "application/octet-stream".to_string(),
                }),
            "",
        );
        assert_eq!(
            normalized.headers.get(CONTENT_TYPE).unwrap(),
            "application/octet-stream"
        );

        let form = FormData::new().text("a", "1");
        let expected = form.content_type();
        let normalized = normalize_ok(
            RequestDescriptor::from("/api").method(Method::Post).body(form),
            "",
        );
        assert_eq!(
            normalized.headers.get(CONTENT_TYPE).unwrap().to_str().unwrap(),
            expected
        );
    }

    #[test]
    fn test_caller_headers_win_over_defaults() {
        let normalized = normalize_ok(
            RequestDescriptor::from("/api").header("accept", "application/json"),
            "",
        );
        assert_eq!(normalized.headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn test_ambient_cookie_is_forwarded_but_caller_can_override() {
        let cookie = HeaderValue::from_static("session=abc");
        let normalized =
            normalize(RequestDescriptor::from("/api"), "", Some(&cookie)).unwrap();
        assert_eq!(normalized.headers.get(COOKIE).unwrap(), "session=abc");

        let normalized = normalize(
            RequestDescriptor::from("/api").header("cookie", "session=xyz"),
            "",
            Some(&cookie),
        )
        .unwrap();
        assert_eq!(normalized.headers.get(COOKIE).unwrap(), "session=xyz");
    }

    #[test]
    fn test_params_and_query_are_appended() {
        let normalized = normalize_ok(
            RequestDescriptor::from("/api/users")
                .param("42")
                .param(PathSegment::group(["posts", "recent"]))
                .query("page", 2),
            "http://localhost:3000",
        );
        assert_eq!(
            normalized.url,
            "http://localhost:3000/api/users/42/posts/recent?page=2"
        );
    }

    #[test]
    fn test_mode_defaults() {
        let base = "http://localhost:3000";

        let normalized = normalize_ok(RequestDescriptor::from("/api"), base);
        assert_eq!(normalized.mode, RequestMode::SameOrigin);

        let normalized =
            normalize_ok(RequestDescriptor::from("http://localhost:3000/api"), base);
        assert_eq!(normalized.mode, RequestMode::SameOrigin);

        let normalized =
            normalize_ok(RequestDescriptor::from("https://elsewhere.example/api"), base);
        assert_eq!(normalized.mode, RequestMode::Cors);

        let normalized = normalize_ok(
            RequestDescriptor::from("https://elsewhere.example/api").mode(RequestMode::NoCors),
            base,
        );
        assert_eq!(normalized.mode, RequestMode::NoCors);
    }

    #[test]
    fn test_credentials_defaults_and_legacy_toggle() {
        let normalized = normalize_ok(RequestDescriptor::from("/api"), "");
        assert_eq!(normalized.credentials, CredentialsPolicy::SameOrigin);

        let normalized = normalize_ok(RequestDescriptor::from("/api").include_creds(true), "");
        assert_eq!(normalized.credentials, CredentialsPolicy::Include);

        let normalized = normalize_ok(
            RequestDescriptor::from("/api")
                .include_creds(true)
                .credentials(CredentialsPolicy::Omit),
            "",
        );
        assert_eq!(normalized.credentials, CredentialsPolicy::Omit);
    }

    #[test]
    fn test_redirect_defaults_to_follow() {
        let normalized = normalize_ok(RequestDescriptor::from("/api"), "");
        assert_eq!(normalized.redirect, RedirectPolicy::Follow);
    }

    #[test]
    fn test_string_body_passes_through_untouched() {
        let normalized = normalize_ok(
            RequestDescriptor::from("/api").method(Method::Post).body("raw text"),
            "",
        );
        assert_eq!(normalized.body.unwrap(), Bytes::from("raw text"));
        assert_eq!(normalized.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    }
}
