//! Row keys and provider names.
//!
//! A key is either a string or a number. Anything else a caller hands in
//! (null, booleans, arrays, objects, the empty string) is rejected by
//! [`validate_key`] before any backend call is made.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Primary key of a row and of the matching map entry.
///
/// `Key::Str("42")` and `Key::Num(42)` are different keys, same as in the
/// backing table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// String key. Never empty once validated.
    Str(String),
    /// Integer or float key.
    Num(Number),
}

impl Key {
    /// The string, if this is a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Num(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Num(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Num(n.into())
    }
}

impl From<u64> for Key {
    fn from(n: u64) -> Self {
        Key::Num(n.into())
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Num(n.into())
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Str(s) => Value::String(s),
            Key::Num(n) => Value::Number(n),
        }
    }
}

impl From<&Key> for Value {
    fn from(key: &Key) -> Self {
        key.clone().into()
    }
}

impl TryFrom<Value> for Key {
    type Error = Error;

    fn try_from(raw: Value) -> Result<Self> {
        validate_key(&raw)
    }
}

/// Check that `raw` is usable as a row id and convert it.
///
/// Numbers are accepted, including zero. A float with no fractional part
/// is stored as the integer it equals, so `1.0` and `1` name the same row
/// (and `-0.0` names row `0`). Strings must be non-empty.
pub fn validate_key(raw: &Value) -> Result<Key> {
    match raw {
        Value::String(s) if s.is_empty() => {
            Err(Error::InvalidKeyType("key must not be empty".into()))
        }
        Value::String(s) => Ok(Key::Str(s.clone())),
        Value::Number(n) => Ok(Key::Num(canonical_number(n))),
        Value::Null => Err(Error::InvalidKeyType("key is missing".into())),
        other => Err(Error::InvalidKeyType(format!(
            "keys must be strings or numbers, got {}",
            type_name(other)
        ))),
    }
}

/// Turn a provider name into a safe table identifier: every char outside
/// `[A-Za-z0-9]` becomes `_`, then the result is lowercased.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Integral floats in the `i64`/`u64` range become integers.
pub(crate) fn canonical_number(n: &Number) -> Number {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 => {
            if (-TWO_POW_63..TWO_POW_63).contains(&f) {
                Number::from(f as i64)
            } else if (0.0..2.0 * TWO_POW_63).contains(&f) {
                Number::from(f as u64)
            } else {
                n.clone()
            }
        }
        _ => n.clone(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
