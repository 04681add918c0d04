//! Post-rank grouping with a per-group top-k aggregate.
//!
//! ```text
//! {"keys": ["author"], "aggregate": {"$min_k": {"k": 3, "key": "#score"}}}
//! ```

use serde::Serialize;

use crate::error::{QueryError, Result};
use crate::key::Key;

/// Top-k selection applied inside each group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Aggregate {
    /// Keep the `k` rows with the smallest `key`
    #[serde(rename = "$min_k")]
    MinK { k: usize, key: Key },
    /// Keep the `k` rows with the largest `key`
    #[serde(rename = "$max_k")]
    MaxK { k: usize, key: Key },
}

impl Aggregate {
    pub fn min_k(k: usize, key: impl Into<Key>) -> Self {
        Aggregate::MinK { k, key: key.into() }
    }

    pub fn max_k(k: usize, key: impl Into<Key>) -> Self {
        Aggregate::MaxK { k, key: key.into() }
    }

    pub fn validate(&self) -> Result<()> {
        let (name, k, key) = match self {
            Aggregate::MinK { k, key } => ("$min_k", *k, key),
            Aggregate::MaxK { k, key } => ("$max_k", *k, key),
        };
        if k == 0 {
            return Err(QueryError::invalid_value("k", format!("{name} k must be greater than 0")));
        }
        if key.is_empty() {
            return Err(QueryError::structural(format!("{name} key must not be empty")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupBy {
    pub keys: Vec<Key>,
    pub aggregate: Aggregate,
}

impl GroupBy {
    pub fn new<I, K>(keys: I, aggregate: Aggregate) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            aggregate,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(QueryError::arity("group_by", "key"));
        }
        if self.keys.iter().any(Key::is_empty) {
            return Err(QueryError::structural("group_by keys must not be empty"));
        }
        self.aggregate.validate().map_err(|e| e.context("aggregate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encoding() {
        let group_by = GroupBy::new(["author"], Aggregate::max_k(2, Key::score()));
        assert_eq!(
            serde_json::to_value(&group_by).unwrap(),
            json!({"keys": ["author"], "aggregate": {"$max_k": {"k": 2, "key": "#score"}}})
        );
    }

    #[test]
    fn test_min_k_tag() {
        let value = serde_json::to_value(Aggregate::min_k(1, "year")).unwrap();
        assert_eq!(value, json!({"$min_k": {"k": 1, "key": "year"}}));
    }

    #[test]
    fn test_validation() {
        assert!(GroupBy::new(Vec::<Key>::new(), Aggregate::min_k(1, "a")).validate().is_err());
        assert!(GroupBy::new(["a"], Aggregate::min_k(0, "a")).validate().is_err());
        assert!(GroupBy::new([""], Aggregate::min_k(1, "a")).validate().is_err());
        assert!(GroupBy::new(["a"], Aggregate::max_k(3, "b")).validate().is_ok());
    }
}
