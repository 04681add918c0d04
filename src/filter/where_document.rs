// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Where-document filter - full-text predicate tree
//!
//! ```text
//! {"$contains": "rust"}                      - substring match
//! {"$not_contains": "draft"}                 - negated substring match
//! {"$regex": "^chapter [0-9]+"}              - regular expression (server compiled)
//! {"$and": [{"$contains": "a"}, ...]}        - conjunction
//! ```

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use super::where_clause::BooleanOperator;
use crate::error::{QueryError, Result};

/// Content operator of a leaf filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentOperator {
    Contains,
    NotContains,
    Regex,
    NotRegex,
}

impl DocumentOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentOperator::Contains => "$contains",
            DocumentOperator::NotContains => "$not_contains",
            DocumentOperator::Regex => "$regex",
            DocumentOperator::NotRegex => "$not_regex",
        }
    }

    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "$contains" => DocumentOperator::Contains,
            "$not_contains" => DocumentOperator::NotContains,
            "$regex" => DocumentOperator::Regex,
            "$not_regex" => DocumentOperator::NotRegex,
            _ => return None,
        })
    }
}

impl fmt::Display for DocumentOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document content predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereDocumentFilter {
    Text {
        operator: DocumentOperator,
        text: String,
    },
    And(Vec<WhereDocumentFilter>),
    Or(Vec<WhereDocumentFilter>),
}

impl WhereDocumentFilter {
    pub fn contains(text: impl Into<String>) -> Self {
        Self::Text {
            operator: DocumentOperator::Contains,
            text: text.into(),
        }
    }

    pub fn not_contains(text: impl Into<String>) -> Self {
        Self::Text {
            operator: DocumentOperator::NotContains,
            text: text.into(),
        }
    }

    /// The pattern is sent as-is; compilation happens server side.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Text {
            operator: DocumentOperator::Regex,
            text: pattern.into(),
        }
    }

    pub fn not_regex(pattern: impl Into<String>) -> Self {
        Self::Text {
            operator: DocumentOperator::NotRegex,
            text: pattern.into(),
        }
    }

    pub fn and(children: impl IntoIterator<Item = WhereDocumentFilter>) -> Self {
        Self::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = WhereDocumentFilter>) -> Self {
        Self::Or(children.into_iter().collect())
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            WhereDocumentFilter::Text { operator, text } => match operator {
                DocumentOperator::Contains | DocumentOperator::NotContains if text.is_empty() => Err(
                    QueryError::structural(format!("{operator} requires a non-empty text operand")),
                ),
                _ => Ok(()),
            },
            WhereDocumentFilter::And(children) => validate_children(BooleanOperator::And, children),
            WhereDocumentFilter::Or(children) => validate_children(BooleanOperator::Or, children),
        }
    }

    fn parse(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(QueryError::structural("where_document filter must be a JSON object"));
        };
        if map.len() != 1 {
            return Err(QueryError::structural(format!(
                "where_document filter must have exactly one operator, found {}",
                map.len()
            )));
        }
        let Some((op, operand)) = map.into_iter().next() else {
            return Err(QueryError::structural("where_document filter must not be empty"));
        };

        match op.as_str() {
            "$and" | "$or" => {
                let Value::Array(items) = operand else {
                    return Err(QueryError::structural(format!("{op} expects an array of filters")));
                };
                let children = items
                    .into_iter()
                    .map(Self::parse)
                    .collect::<Result<Vec<_>>>()?;
                Ok(if op == "$and" {
                    WhereDocumentFilter::And(children)
                } else {
                    WhereDocumentFilter::Or(children)
                })
            }
            _ => {
                let operator = DocumentOperator::parse(&op).ok_or_else(|| {
                    QueryError::structural(format!("unsupported where_document operator {op}"))
                })?;
                let Value::String(text) = operand else {
                    return Err(QueryError::structural(format!("{op} expects a string operand")));
                };
                Ok(WhereDocumentFilter::Text { operator, text })
            }
        }
    }
}

fn validate_children(operator: BooleanOperator, children: &[WhereDocumentFilter]) -> Result<()> {
    if children.is_empty() {
        return Err(QueryError::arity(operator.as_str(), "filter"));
    }
    for child in children {
        child.validate().map_err(|e| e.context(operator.as_str()))?;
    }
    Ok(())
}

impl Serialize for WhereDocumentFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            WhereDocumentFilter::Text { operator, text } => map.serialize_entry(operator.as_str(), text)?,
            WhereDocumentFilter::And(children) => map.serialize_entry(BooleanOperator::And.as_str(), children)?,
            WhereDocumentFilter::Or(children) => map.serialize_entry(BooleanOperator::Or.as_str(), children)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WhereDocumentFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        WhereDocumentFilter::parse(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaf_encoding() {
        let filter = WhereDocumentFilter::contains("rust");
        assert_eq!(serde_json::to_value(&filter).unwrap(), json!({"$contains": "rust"}));
    }

    #[test]
    fn test_combinator_roundtrip() {
        let filter = WhereDocumentFilter::and([
            WhereDocumentFilter::contains("vector"),
            WhereDocumentFilter::or([
                WhereDocumentFilter::regex("^intro"),
                WhereDocumentFilter::not_regex("draft$"),
            ]),
            WhereDocumentFilter::not_contains("deprecated"),
        ]);
        filter.validate().unwrap();

        let encoded = serde_json::to_string(&filter).unwrap();
        let decoded: WhereDocumentFilter = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, filter);
    }

    #[test]
    fn test_empty_contains_rejected() {
        assert!(WhereDocumentFilter::contains("").validate().is_err());
        assert!(WhereDocumentFilter::not_contains("").validate().is_err());
    }

    #[test]
    fn test_regex_operand_not_compiled() {
        // Unbalanced pattern is the server's problem
        assert!(WhereDocumentFilter::regex("([a-z").validate().is_ok());
        assert!(WhereDocumentFilter::not_regex("").validate().is_ok());
    }

    #[test]
    fn test_empty_combinator_is_arity_error() {
        let err = WhereDocumentFilter::or(Vec::<WhereDocumentFilter>::new())
            .validate()
            .unwrap_err();
        assert!(matches!(err, QueryError::Arity { .. }));
    }

    #[test]
    fn test_nested_invalid_child() {
        let filter = WhereDocumentFilter::and([
            WhereDocumentFilter::contains("ok"),
            WhereDocumentFilter::or([WhereDocumentFilter::contains("")]),
        ]);
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_decode_rejects_metadata_operator() {
        let result: std::result::Result<WhereDocumentFilter, _> =
            serde_json::from_value(json!({"$eq": "text"}));
        assert!(result.unwrap_err().to_string().contains("unsupported where_document operator $eq"));
    }
}
