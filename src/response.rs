//! Uniform response records.
//!
//! Every dispatch produces one [`ResponseRecord`], whether the transport
//! succeeded, returned an HTTP failure, or never produced a response at all.
//! The `method` field is populated before dispatch, so even a synthesized
//! failure record identifies the request it belongs to.

pub(crate) mod parse;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::Value;

use crate::form::FormData;
use crate::request::Method;
use crate::transport::TransportResponse;

/// Parsed response payload, classified by content type.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    /// Text-typed (or untyped) bodies.
    Text(String),
    /// JSON-typed bodies, parsed into a structured value.
    Json(Value),
    /// Form-typed bodies (multipart or urlencoded).
    Form(FormData),
    /// Raw bytes, produced under the `ArrayBuffer` hint.
    Bytes(Bytes),
    /// Raw bytes with their declared media type (the default for binary
    /// responses).
    Blob {
        /// The payload.
        bytes: Bytes,
        /// Declared media type, when the response had one.
        content_type: Option<String>,
    },
}

impl ResponseBody {
    /// The body as text, when it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The body as a JSON value, when it is JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The body as a form, when it is form-typed.
    pub fn as_form(&self) -> Option<&FormData> {
        match self {
            ResponseBody::Form(form) => Some(form),
            _ => None,
        }
    }

    /// The raw bytes of a binary body.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Bytes(bytes) => Some(bytes),
            ResponseBody::Blob { bytes, .. } => Some(bytes),
            _ => None,
        }
    }
}

/// The uniform output of a dispatch.
///
/// Transport metadata merges in verbatim once a response is received;
/// `status` stays `None` when the transport never produced one (before the
/// failure record is synthesized).
#[derive(Clone, Debug)]
pub struct ResponseRecord {
    /// Uppercased request method. Always present.
    pub method: String,
    /// Final request URL.
    pub url: String,
    /// HTTP status, once a response was received or synthesized.
    pub status: Option<StatusCode>,
    /// Status text; enriched with method/URL/status on failures.
    pub status_text: String,
    /// Whether the response was a success.
    pub ok: bool,
    /// Response headers.
    pub headers: HeaderMap,
    /// Parsed body, when one was received and parsed.
    pub body: Option<ResponseBody>,
}

impl ResponseRecord {
    /// A record carrying only the request method, created before dispatch.
    pub(crate) fn pending(method: Method) -> Self {
        Self {
            method: method.as_str().to_string(),
            url: String::new(),
            status: None,
            status_text: String::new(),
            ok: false,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Merge transport metadata (everything but the body) into the record.
    pub(crate) fn merge_transport(&mut self, response: &TransportResponse) {
        self.url = response.url.clone();
        self.status = Some(response.status);
        self.status_text = response.status_text.clone();
        self.ok = response.ok();
        self.headers = response.headers.clone();
    }

    /// Whether no transport response was ever merged or synthesized.
    pub(crate) fn is_unfulfilled(&self) -> bool {
        self.status.is_none()
    }

    /// The status as a plain number, when present.
    pub fn status_u16(&self) -> Option<u16> {
        self.status.map(|status| status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_record_has_method_only() {
        let record = ResponseRecord::pending(Method::Patch);
        assert_eq!(record.method, "PATCH");
        assert!(record.is_unfulfilled());
        assert!(!record.ok);
        assert!(record.body.is_none());
    }

    #[test]
    fn test_merge_transport_fills_metadata() {
        let mut record = ResponseRecord::pending(Method::Get);
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "abc".parse().unwrap());
        let response = TransportResponse {
            status: StatusCode::OK,
            status_text: "OK".to_string(),
            url: "http://localhost:3000/api".to_string(),
            headers,
            body: Bytes::new(),
        };

        record.merge_transport(&response);
        assert!(!record.is_unfulfilled());
        assert_eq!(record.status_u16(), Some(200));
        assert!(record.ok);
        assert_eq!(record.url, "http://localhost:3000/api");
        assert_eq!(record.headers.get("x-request-id").unwrap(), "abc");
        assert_eq!(record.method, "GET");
    }
}
