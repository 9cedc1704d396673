//! Payload encoding for the `data` field of a row.
//!
//! Primitives are stored as they are. Objects and arrays are stored as their
//! JSON text, and recognised on the way back by their first character.
//!
//! A *string* value that itself starts with `[` or `{` is indistinguishable
//! from an encoded composite, so it can never be stored. [`check_storable`]
//! rejects it before it is written.

use serde_json::Value;

/// Encode a value for storage.
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        primitive => primitive.clone(),
    }
}

/// Fail if `value` would not decode back to itself once encoded.
pub fn check_storable(value: &Value) -> Result<(), String> {
    match value {
        Value::String(text) if looks_composite(text) => Err(format!(
            "string values may not start with `{}`",
            &text[..1]
        )),
        _ => Ok(()),
    }
}

/// Decode a stored payload. Parses only strings that look like an encoded
/// object or array.
pub fn decode(stored: Value) -> Result<Value, serde_json::Error> {
    match stored {
        Value::String(text) if looks_composite(&text) => serde_json::from_str(&text),
        other => Ok(other),
    }
}

/// `true` if `text` would be treated as an encoded composite by [`decode`].
pub fn looks_composite(text: &str) -> bool {
    text.starts_with('[') || text.starts_with('{')
}
