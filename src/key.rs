//! Field keys addressed by filters, ranks, projections and grouping.
//!
//! Keys starting with `#` name synthetic columns maintained by the store;
//! every other string is a user metadata field.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A column or metadata field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    pub const ID: &'static str = "#id";
    pub const DOCUMENT: &'static str = "#document";
    pub const EMBEDDING: &'static str = "#embedding";
    pub const METADATA: &'static str = "#metadata";
    pub const SCORE: &'static str = "#score";

    /// A user metadata field.
    pub fn field(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn id() -> Self {
        Self(Self::ID.to_string())
    }

    pub fn document() -> Self {
        Self(Self::DOCUMENT.to_string())
    }

    pub fn embedding() -> Self {
        Self(Self::EMBEDDING.to_string())
    }

    pub fn metadata() -> Self {
        Self(Self::METADATA.to_string())
    }

    pub fn score() -> Self {
        Self(Self::SCORE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for the synthetic `#`-prefixed columns.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::ID | Self::DOCUMENT | Self::EMBEDDING | Self::METADATA | Self::SCORE
        )
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for Key {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

impl From<Key> for String {
    fn from(value: Key) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_keys() {
        assert!(Key::id().is_reserved());
        assert!(Key::score().is_reserved());
        assert!(!Key::field("author").is_reserved());
        assert!(!Key::field("#custom").is_reserved());
    }

    #[test]
    fn test_key_serializes_as_plain_string() {
        let json = serde_json::to_string(&vec![Key::document(), Key::field("title")]).unwrap();
        assert_eq!(json, r##"["#document","title"]"##);
    }
}
