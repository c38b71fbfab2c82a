//! Content-type-driven response body parsing.

use bytes::Bytes;

use crate::form::FormData;
use crate::request::ResponseType;
use crate::response::ResponseBody;

/// Parse a response body according to its content type.
///
/// Classification mirrors content negotiation on the request side: a content
/// type containing `text` (or no content type at all) parses as text, `json`
/// as a structured value, `form` as form data; anything else is binary,
/// shaped by the caller's [`ResponseType`] hint.
pub(crate) fn parse_body(
    content_type: Option<&str>,
    hint: ResponseType,
    body: Bytes,
) -> Result<ResponseBody, String> {
    let Some(content_type) = content_type.filter(|ct| !ct.is_empty()) else {
        return Ok(text_body(&body));
    };

    if content_type.contains("text") {
        Ok(text_body(&body))
    } else if content_type.contains("json") {
        serde_json::from_slice(&body)
            .map(ResponseBody::Json)
            .map_err(|e| format!("JSON response parsing failed: {e}"))
    } else if content_type.contains("form") {
        let form = if content_type.contains("multipart") {
            FormData::parse_multipart(content_type, &body)?
        } else {
            FormData::parse_urlencoded(&body)?
        };
        Ok(ResponseBody::Form(form))
    } else {
        match hint {
            ResponseType::ArrayBuffer => Ok(ResponseBody::Bytes(body)),
            ResponseType::Blob => Ok(ResponseBody::Blob {
                bytes: body,
                content_type: Some(content_type.to_string()),
            }),
        }
    }
}

fn text_body(body: &Bytes) -> ResponseBody {
    ResponseBody::Text(String::from_utf8_lossy(body).into_owned())
}
