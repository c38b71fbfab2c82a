//! Query-string serialization.
//!
//! Query mappings serialize to `?`-prefixed, URL-encoded strings. Scalar
//! values serialize directly; object and array values are JSON-encoded
//! first, so a structured value survives the round trip through a flat
//! query string.

use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::response::ResponseRecord;

/// Serialize a query mapping.
///
/// Returns an empty string for an absent or empty mapping, otherwise a
/// `?`-prefixed URL-encoded string.
pub(crate) fn serialize_query(query: Option<&Map<String, Value>>) -> Result<String, ClientError> {
    let Some(query) = query.filter(|map| !map.is_empty()) else {
        return Ok(String::new());
    };

    let mut flat = Map::new();
    for (key, value) in query {
        let encoded = match value {
            Value::Object(_) | Value::Array(_) => Value::String(
                serde_json::to_string(value)
                    .map_err(|e| ClientError::Encode(format!("query value encoding failed: {e}")))?,
            ),
            scalar => scalar.clone(),
        };
        flat.insert(key.clone(), encoded);
    }

    let serialized = serde_qs::to_string(&flat)
        .map_err(|e| ClientError::Encode(format!("query serialization failed: {e}")))?;
    Ok(format!("?{serialized}"))
}

/// Parse a query string back into a mapping.
///
/// The inverse of [`serialize_query`]: values that parse as JSON (numbers,
/// booleans, encoded objects) are revived, anything else stays a string.
#[cfg_attr(not(test), allow(dead_code))]
pub(crate) fn parse_query(query: &str) -> Result<Map<String, Value>, ClientError> {
    let trimmed = query.trim_start_matches('?');
    let raw: std::collections::BTreeMap<String, String> = serde_qs::from_str(trimmed)
        .map_err(|e| ClientError::Decode {
            record: ResponseRecord {
                method: String::new(),
                url: String::new(),
                status: None,
                status_text: String::new(),
                ok: false,
                headers: Default::default(),
                body: None,
            },
            message: format!("query parsing failed: {e}"),
        })?;

    let mut map = Map::new();
    for (key, value) in raw {
        let revived = serde_json::from_str(&value).unwrap_or(Value::String(value));
        map.insert(key, revived);
    }
    Ok(map)
}
