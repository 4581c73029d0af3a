//! Query-string serialization.
//!
//! Values are taken from a JSON object so callers can pass any
//! `Serialize` type. Pairs whose value is `null` or `""` are dropped; `0`
//! and `false` are kept. Nested objects and arrays are sent as JSON text.
//! Keys are written as-is; values are percent-encoded.

use serde::Serialize;
use serde_json::Value;

use crate::error::GatewayError;

/// Serialize `params` (which must serialize to a JSON object, or `null`)
/// into `k=v&k2=v2` form. Key order follows the serialized object.
pub fn to_query_string<P: Serialize + ?Sized>(params: &P) -> Result<String, GatewayError> {
    let value =
        serde_json::to_value(params).map_err(|e| GatewayError::Serialization(e.to_string()))?;
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(String::new()),
        other => {
            return Err(GatewayError::Serialization(format!(
                "query parameters must be an object, got {other}"
            )))
        }
    };

    let pairs: Vec<String> = map
        .iter()
        .filter_map(|(key, value)| {
            let text = value_text(value)?;
            Some(format!("{key}={}", urlencoding::encode(&text)))
        })
        .collect();
    Ok(pairs.join("&"))
}

/// Text form of a query value, or `None` when the pair should be skipped.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
