//! Multipart form payloads.
//!
//! [`FormData`] is used in both directions: as a request body (encoded as
//! `multipart/form-data` with a generated boundary) and as the parsed shape
//! of form-typed response bodies (multipart or urlencoded).

use bytes::Bytes;
use rand::Rng;

/// One field of a form payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    value: Bytes,
}

impl Part {
    /// Create a part with a field name and raw value.
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<Bytes>,
    {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            value: value.into(),
        }
    }

    /// Attach a filename to this part.
    pub fn filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Declare a media type for this part.
    pub fn content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attached filename, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Declared media type, if any.
    pub fn media_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Raw field value.
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Field value decoded as UTF-8 (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

/// A multipart form payload.
///
/// # Example
///
/// ```
/// use unifetch::{FormData, Part};
///
/// let form = FormData::new()
///     .text("name", "unifetch")
///     .part(Part::new("logo", &b"\x89PNG"[..])
///         .filename("logo.png")
///         .content_type("image/png"));
///
/// assert_eq!(form.parts().len(), 2);
/// assert!(form.content_type().starts_with("multipart/form-data; boundary="));
/// ```
#[derive(Clone, Debug)]
pub struct FormData {
    boundary: String,
    parts: Vec<Part>,
}

impl FormData {
    /// Create an empty form with a fresh random boundary.
    pub fn new() -> Self {
        Self {
            boundary: generate_boundary(),
            parts: Vec::new(),
        }
    }

    /// Append a part.
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Append a plain text field.
    pub fn text<N, V>(self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.part(Part::new(name, value.into().into_bytes()))
    }

    /// The boundary used when encoding this form.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// All parts, in insertion order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// First part with the given field name.
    pub fn get(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.name == name)
    }

    /// The `multipart/form-data` content type carrying this form's boundary.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode the form as a multipart body.
    pub(crate) fn encode(&self) -> Bytes {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(b"--");
            out.extend_from_slice(self.boundary.as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(b"Content-Disposition: form-data; name=\"");
            out.extend_from_slice(part.name.as_bytes());
            out.extend_from_slice(b"\"");
            if let Some(filename) = &part.filename {
                out.extend_from_slice(b"; filename=\"");
                out.extend_from_slice(filename.as_bytes());
                out.extend_from_slice(b"\"");
            }
            out.extend_from_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                out.extend_from_slice(b"Content-Type: ");
                out.extend_from_slice(content_type.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.value);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"--");
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(b"--\r\n");
        Bytes::from(out)
    }

    /// Parse a multipart body using the boundary declared in `content_type`.
    pub(crate) fn parse_multipart(content_type: &str, body: &[u8]) -> Result<Self, String> {
        let boundary = header_param(content_type, "boundary")
            .ok_or_else(|| "multipart response without a boundary parameter".to_string())?;

        let text = String::from_utf8_lossy(body);
        let delimiter = format!("--{boundary}");
        let mut form = FormData::new();

        for segment in text.split(delimiter.as_str()).skip(1) {
            // The terminator segment starts with the closing "--".
            if segment.starts_with("--") {
                break;
            }
            let segment = segment
                .trim_start_matches("\r\n")
                .trim_end_matches("\r\n");
            let Some((raw_headers, value)) = segment.split_once("\r\n\r\n") else {
                return Err("malformed multipart segment: missing header terminator".to_string());
            };

            let mut part: Option<Part> = None;
            let mut media_type: Option<String> = None;
            for line in raw_headers.split("\r\n") {
                let Some((name, rest)) = line.split_once(':') else {
                    continue;
                };
                if name.eq_ignore_ascii_case("content-disposition") {
                    let field = header_param(rest, "name")
                        .ok_or_else(|| "multipart segment without a field name".to_string())?;
                    let mut built = Part::new(field, value.as_bytes().to_vec());
                    if let Some(filename) = header_param(rest, "filename") {
                        built = built.filename(filename);
                    }
                    part = Some(built);
                } else if name.eq_ignore_ascii_case("content-type") {
                    media_type = Some(rest.trim().to_string());
                }
            }

            let mut part =
                part.ok_or_else(|| "multipart segment without content-disposition".to_string())?;
            if let Some(media_type) = media_type {
                part = part.content_type(media_type);
            }
            form.parts.push(part);
        }

        Ok(form)
    }

    /// Parse an `application/x-www-form-urlencoded` body into flat parts.
    pub(crate) fn parse_urlencoded(body: &[u8]) -> Result<Self, String> {
        let text = String::from_utf8_lossy(body);
        let pairs: std::collections::BTreeMap<String, String> = serde_qs::from_str(&text)
            .map_err(|e| format!("urlencoded form parsing failed: {e}"))?;

        let mut form = FormData::new();
        for (name, value) in pairs {
            form.parts.push(Part::new(name, value.into_bytes()));
        }
        Ok(form)
    }
}

impl Default for FormData {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FormData {
    // Boundaries are random per instance; equality is about the fields.
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

fn generate_boundary() -> String {
    format!("unifetch-{:032x}", rand::rng().random::<u128>())
}

/// Extract a `key="value"` or `key=value` parameter from a header value.
fn header_param(header: &str, key: &str) -> Option<String> {
    for piece in header.split(';') {
        let piece = piece.trim();
        let Some((name, value)) = piece.split_once('=') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case(key) {
            return Some(value.trim().trim_matches('"').to_string());
        }
    }
    None
}
