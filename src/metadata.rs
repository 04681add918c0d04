//! Record metadata values.
//!
//! Metadata crosses the wire as untagged JSON; inside the crate each value is
//! an explicit variant so callers match exhaustively instead of probing
//! `serde_json::Value` at runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata attached to one record.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A typed metadata value.
///
/// Variant order matters for untagged decoding: `1` decodes as `Int`, `1.5`
/// as `Float`, and an empty list as `BoolList`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    BoolList(Vec<bool>),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    StrList(Vec<String>),
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<bool>> for MetadataValue {
    fn from(value: Vec<bool>) -> Self {
        Self::BoolList(value)
    }
}

impl From<Vec<i64>> for MetadataValue {
    fn from(value: Vec<i64>) -> Self {
        Self::IntList(value)
    }
}

impl From<Vec<f64>> for MetadataValue {
    fn from(value: Vec<f64>) -> Self {
        Self::FloatList(value)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(value: Vec<String>) -> Self {
        Self::StrList(value)
    }
}

/// Build a [`Metadata`] map from `(key, value)` pairs.
pub fn metadata<K, V, I>(pairs: I) -> Metadata
where
    K: Into<String>,
    V: Into<MetadataValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untagged_decode_picks_narrowest_variant() {
        let decoded: Metadata = serde_json::from_value(json!({
            "a": true,
            "b": 3,
            "c": 2.5,
            "d": "text",
            "e": ["x", "y"],
            "f": [1, 2],
        }))
        .unwrap();

        assert_eq!(decoded["a"], MetadataValue::Bool(true));
        assert_eq!(decoded["b"], MetadataValue::Int(3));
        assert_eq!(decoded["c"], MetadataValue::Float(2.5));
        assert_eq!(decoded["d"], MetadataValue::Str("text".into()));
        assert_eq!(decoded["e"], MetadataValue::StrList(vec!["x".into(), "y".into()]));
        assert_eq!(decoded["f"], MetadataValue::IntList(vec![1, 2]));
    }

    #[test]
    fn test_metadata_helper() {
        let m = metadata([("page", MetadataValue::from(3)), ("lang", "en".into())]);
        assert_eq!(serde_json::to_value(&m).unwrap(), json!({"lang": "en", "page": 3}));
    }
}
