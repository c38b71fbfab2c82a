//! Client error types.
//!
//! Every per-request failure surfaces as a [`ClientError`] so callers have a
//! single catch point; subscriber channels are always notified before the
//! error is returned. Store-integration failures are a separate, fatal
//! class ([`StoreError`](crate::store::StoreError)) because they indicate a
//! wiring mistake rather than a failed request.

use http::StatusCode;

use crate::response::ResponseRecord;

/// Errors produced by request dispatch.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClientError {
    /// The descriptor named no route; nothing was dispatched.
    #[error("no route specified on request")]
    MissingRoute,

    /// The transport completed but the response was not a success.
    /// The record's status text is enriched with method, URL, and status.
    #[error("{}", record.status_text)]
    Http {
        /// The full response record, body included when it parsed.
        record: ResponseRecord,
    },

    /// The transport never produced a response (connection failure, DNS
    /// error, …). The record carries a synthesized status so downstream
    /// handlers can treat transport failures uniformly with HTTP failures.
    #[error("transport error: {message}")]
    Transport {
        /// The synthesized (or partially filled) response record.
        record: ResponseRecord,
        /// The transport's own description of the failure.
        message: String,
    },

    /// A response was received but its body could not be parsed.
    #[error("decode error: {message}")]
    Decode {
        /// The record with transport metadata merged, body absent.
        record: ResponseRecord,
        /// What failed to parse.
        message: String,
    },

    /// A request body or query value could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
}

impl ClientError {
    /// The response record attached to this error, when dispatch got far
    /// enough to produce one.
    pub fn record(&self) -> Option<&ResponseRecord> {
        match self {
            ClientError::Http { record }
            | ClientError::Transport { record, .. }
            | ClientError::Decode { record, .. } => Some(record),
            ClientError::MissingRoute | ClientError::Encode(_) => None,
        }
    }

    /// The HTTP status attached to this error, when one exists.
    pub fn status(&self) -> Option<StatusCode> {
        self.record().and_then(|record| record.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;

    #[test]
    fn test_missing_route_has_no_record() {
        let err = ClientError::MissingRoute;
        assert!(err.record().is_none());
        assert!(err.status().is_none());
        assert_eq!(err.to_string(), "no route specified on request");
    }

    #[test]
    fn test_http_error_displays_enriched_status_text() {
        let mut record = ResponseRecord::pending(Method::Get);
        record.status = Some(StatusCode::NOT_FOUND);
        record.status_text = "GET \n /missing \n 404 (Not Found)".to_string();
        let err = ClientError::Http { record };
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_transport_error_carries_record_and_message() {
        let mut record = ResponseRecord::pending(Method::Post);
        record.status = Some(StatusCode::NOT_IMPLEMENTED);
        let err = ClientError::Transport {
            record,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::NOT_IMPLEMENTED));
        assert!(err.to_string().contains("connection refused"));
    }
}
