// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Where clause - metadata predicate tree
//!
//! A closed AST of typed leaves and `$and`/`$or` combinators that encodes to
//! the nested JSON shape the server evaluates.
//!
//! # Example
//!
//! ```rust
//! use collection_query::filter::WhereClause;
//!
//! let clause = WhereClause::eq("status", "published")
//!     .and_with(WhereClause::gte("year", 2020))
//!     .and_with(WhereClause::is_in("lang", vec!["en", "fr"]));
//!
//! clause.validate().unwrap();
//! let json = serde_json::to_string(&clause).unwrap();
//! assert!(json.starts_with(r#"{"$and":[{"status":{"$eq":"published"}}"#));
//! ```

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::{QueryError, Result};
use crate::key::Key;

/// Comparison operator carried by a leaf clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhereOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    NotContains,
    In,
    NotIn,
}

impl WhereOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            WhereOperator::Eq => "$eq",
            WhereOperator::Ne => "$ne",
            WhereOperator::Gt => "$gt",
            WhereOperator::Gte => "$gte",
            WhereOperator::Lt => "$lt",
            WhereOperator::Lte => "$lte",
            WhereOperator::Contains => "$contains",
            WhereOperator::NotContains => "$not_contains",
            WhereOperator::In => "$in",
            WhereOperator::NotIn => "$nin",
        }
    }

    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "$eq" => WhereOperator::Eq,
            "$ne" => WhereOperator::Ne,
            "$gt" => WhereOperator::Gt,
            "$gte" => WhereOperator::Gte,
            "$lt" => WhereOperator::Lt,
            "$lte" => WhereOperator::Lte,
            "$contains" => WhereOperator::Contains,
            "$not_contains" => WhereOperator::NotContains,
            "$in" => WhereOperator::In,
            "$nin" => WhereOperator::NotIn,
            _ => return None,
        })
    }
}

impl fmt::Display for WhereOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of operand a leaf carries; decides which operators are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Str,
    Int,
    Float,
    Bool,
    List,
}

impl OperandKind {
    /// Operators accepted for this operand kind.
    pub fn allowed_operators(self) -> &'static [WhereOperator] {
        use WhereOperator::*;
        match self {
            OperandKind::Str | OperandKind::Bool => &[Eq, Ne, Contains, NotContains],
            OperandKind::Int | OperandKind::Float => {
                &[Eq, Ne, Gt, Gte, Lt, Lte, Contains, NotContains]
            }
            OperandKind::List => &[In, NotIn],
        }
    }

    fn name(self) -> &'static str {
        match self {
            OperandKind::Str => "string",
            OperandKind::Int => "int",
            OperandKind::Float => "float",
            OperandKind::Bool => "bool",
            OperandKind::List => "list",
        }
    }
}

/// Scalar operand accepted by the comparison constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Float(value.into())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Homogeneous list operand for `$in` / `$nin`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListOperand {
    Str(Vec<String>),
    Int(Vec<i64>),
    Float(Vec<f64>),
    Bool(Vec<bool>),
}

impl ListOperand {
    pub fn len(&self) -> usize {
        match self {
            ListOperand::Str(v) => v.len(),
            ListOperand::Int(v) => v.len(),
            ListOperand::Float(v) => v.len(),
            ListOperand::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn from_values(items: Vec<Value>) -> Result<Self> {
        let kind = match items.first() {
            None => return Ok(ListOperand::Str(Vec::new())),
            Some(Value::String(_)) => OperandKind::Str,
            Some(Value::Bool(_)) => OperandKind::Bool,
            Some(Value::Number(_)) if items.iter().all(|v| v.as_i64().is_some()) => OperandKind::Int,
            Some(Value::Number(_)) => OperandKind::Float,
            Some(_) => {
                return Err(QueryError::structural(
                    "list operand elements must be strings, numbers or booleans",
                ))
            }
        };
        let mismatch = || QueryError::structural("list operand elements must share one type");
        match kind {
            OperandKind::Str => items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<_>>>()
                .map(ListOperand::Str),
            OperandKind::Bool => items
                .iter()
                .map(|v| v.as_bool().ok_or_else(mismatch))
                .collect::<Result<Vec<_>>>()
                .map(ListOperand::Bool),
            OperandKind::Int => items
                .iter()
                .map(|v| v.as_i64().ok_or_else(mismatch))
                .collect::<Result<Vec<_>>>()
                .map(ListOperand::Int),
            OperandKind::Float | OperandKind::List => items
                .iter()
                .map(|v| v.as_f64().ok_or_else(mismatch))
                .collect::<Result<Vec<_>>>()
                .map(ListOperand::Float),
        }
    }
}

impl From<Vec<&str>> for ListOperand {
    fn from(value: Vec<&str>) -> Self {
        ListOperand::Str(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for ListOperand {
    fn from(value: Vec<String>) -> Self {
        ListOperand::Str(value)
    }
}

impl From<Vec<i64>> for ListOperand {
    fn from(value: Vec<i64>) -> Self {
        ListOperand::Int(value)
    }
}

impl From<Vec<f64>> for ListOperand {
    fn from(value: Vec<f64>) -> Self {
        ListOperand::Float(value)
    }
}

impl From<Vec<bool>> for ListOperand {
    fn from(value: Vec<bool>) -> Self {
        ListOperand::Bool(value)
    }
}

/// A leaf comparison: `{key: {operator: operand}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<T> {
    pub key: Key,
    pub operator: WhereOperator,
    pub operand: T,
}

impl<T> Leaf<T> {
    fn check(&self, kind: OperandKind) -> Result<()> {
        if self.key.is_empty() {
            return Err(QueryError::structural(format!(
                "where clause key must not be empty (operator {})",
                self.operator
            )));
        }
        if self.key.as_str().starts_with('$') {
            return Err(QueryError::structural(format!(
                "where clause key '{}' must not start with '$'",
                self.key
            )));
        }
        if !kind.allowed_operators().contains(&self.operator) {
            return Err(QueryError::structural(format!(
                "operator {} is not allowed for {} value on key '{}'",
                self.operator,
                kind.name(),
                self.key
            )));
        }
        Ok(())
    }
}

/// NaN and infinities have no JSON encoding.
fn check_finite(key: &Key, values: impl IntoIterator<Item = f64>) -> Result<()> {
    match values.into_iter().find(|v| !v.is_finite()) {
        Some(value) => Err(QueryError::structural(format!(
            "where clause value {value} on key '{key}' is not a finite number"
        ))),
        None => Ok(()),
    }
}

/// Boolean combinator of a where clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOperator {
    And,
    Or,
}

impl BooleanOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BooleanOperator::And => "$and",
            BooleanOperator::Or => "$or",
        }
    }
}

/// Metadata predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    Str(Leaf<String>),
    Int(Leaf<i64>),
    Float(Leaf<f64>),
    Bool(Leaf<bool>),
    List(Leaf<ListOperand>),
    And(Vec<WhereClause>),
    Or(Vec<WhereClause>),
}

impl WhereClause {
    /// Leaf comparison with an explicit operator. Not validated here.
    pub fn compare(key: impl Into<Key>, operator: WhereOperator, value: impl Into<Scalar>) -> Self {
        let key = key.into();
        match value.into() {
            Scalar::Str(operand) => WhereClause::Str(Leaf { key, operator, operand }),
            Scalar::Int(operand) => WhereClause::Int(Leaf { key, operator, operand }),
            Scalar::Float(operand) => WhereClause::Float(Leaf { key, operator, operand }),
            Scalar::Bool(operand) => WhereClause::Bool(Leaf { key, operator, operand }),
        }
    }

    pub fn eq(key: impl Into<Key>, value: impl Into<Scalar>) -> Self {
        Self::compare(key, WhereOperator::Eq, value)
    }

    pub fn ne(key: impl Into<Key>, value: impl Into<Scalar>) -> Self {
        Self::compare(key, WhereOperator::Ne, value)
    }

    pub fn gt(key: impl Into<Key>, value: impl Into<Scalar>) -> Self {
        Self::compare(key, WhereOperator::Gt, value)
    }

    pub fn gte(key: impl Into<Key>, value: impl Into<Scalar>) -> Self {
        Self::compare(key, WhereOperator::Gte, value)
    }

    pub fn lt(key: impl Into<Key>, value: impl Into<Scalar>) -> Self {
        Self::compare(key, WhereOperator::Lt, value)
    }

    pub fn lte(key: impl Into<Key>, value: impl Into<Scalar>) -> Self {
        Self::compare(key, WhereOperator::Lte, value)
    }

    /// Array metadata contains the value.
    pub fn contains(key: impl Into<Key>, value: impl Into<Scalar>) -> Self {
        Self::compare(key, WhereOperator::Contains, value)
    }

    pub fn not_contains(key: impl Into<Key>, value: impl Into<Scalar>) -> Self {
        Self::compare(key, WhereOperator::NotContains, value)
    }

    pub fn is_in(key: impl Into<Key>, values: impl Into<ListOperand>) -> Self {
        WhereClause::List(Leaf {
            key: key.into(),
            operator: WhereOperator::In,
            operand: values.into(),
        })
    }

    pub fn not_in(key: impl Into<Key>, values: impl Into<ListOperand>) -> Self {
        WhereClause::List(Leaf {
            key: key.into(),
            operator: WhereOperator::NotIn,
            operand: values.into(),
        })
    }

    /// `$and` over the given children. An empty list is accepted here and
    /// rejected by [`WhereClause::validate`].
    pub fn and(children: impl IntoIterator<Item = WhereClause>) -> Self {
        WhereClause::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = WhereClause>) -> Self {
        WhereClause::Or(children.into_iter().collect())
    }

    /// Conjunction with another clause, flattening into an existing `$and`.
    pub fn and_with(self, other: WhereClause) -> Self {
        match self {
            WhereClause::And(mut children) => {
                children.push(other);
                WhereClause::And(children)
            }
            clause => WhereClause::And(vec![clause, other]),
        }
    }

    /// Disjunction with another clause, flattening into an existing `$or`.
    pub fn or_with(self, other: WhereClause) -> Self {
        match self {
            WhereClause::Or(mut children) => {
                children.push(other);
                WhereClause::Or(children)
            }
            clause => WhereClause::Or(vec![clause, other]),
        }
    }

    /// Key of a leaf clause, `None` for combinators.
    pub fn key(&self) -> Option<&Key> {
        match self {
            WhereClause::Str(leaf) => Some(&leaf.key),
            WhereClause::Int(leaf) => Some(&leaf.key),
            WhereClause::Float(leaf) => Some(&leaf.key),
            WhereClause::Bool(leaf) => Some(&leaf.key),
            WhereClause::List(leaf) => Some(&leaf.key),
            WhereClause::And(_) | WhereClause::Or(_) => None,
        }
    }

    /// Check operators, keys and arity recursively, stopping at the first
    /// invalid node.
    pub fn validate(&self) -> Result<()> {
        match self {
            WhereClause::Str(leaf) => leaf.check(OperandKind::Str),
            WhereClause::Int(leaf) => leaf.check(OperandKind::Int),
            WhereClause::Float(leaf) => {
                leaf.check(OperandKind::Float)?;
                check_finite(&leaf.key, [leaf.operand])
            }
            WhereClause::Bool(leaf) => leaf.check(OperandKind::Bool),
            WhereClause::List(leaf) => {
                leaf.check(OperandKind::List)?;
                if leaf.operand.is_empty() {
                    return Err(QueryError::arity(
                        format!("{} on key '{}'", leaf.operator, leaf.key),
                        "value",
                    ));
                }
                match &leaf.operand {
                    ListOperand::Float(values) => check_finite(&leaf.key, values.iter().copied()),
                    _ => Ok(()),
                }
            }
            WhereClause::And(children) => validate_children(BooleanOperator::And, children),
            WhereClause::Or(children) => validate_children(BooleanOperator::Or, children),
        }
    }

    fn parse(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(QueryError::structural("where clause must be a JSON object"));
        };
        if map.len() != 1 {
            return Err(QueryError::structural(format!(
                "where clause must have exactly one key, found {}",
                map.len()
            )));
        }
        let Some((key, inner)) = map.into_iter().next() else {
            return Err(QueryError::structural("where clause must not be empty"));
        };

        match key.as_str() {
            "$and" | "$or" => {
                let Value::Array(items) = inner else {
                    return Err(QueryError::structural(format!("{key} expects an array of clauses")));
                };
                let children = items
                    .into_iter()
                    .map(Self::parse)
                    .collect::<Result<Vec<_>>>()?;
                Ok(if key == "$and" {
                    WhereClause::And(children)
                } else {
                    WhereClause::Or(children)
                })
            }
            _ => Self::parse_leaf(Key::from(key), inner),
        }
    }

    fn parse_leaf(key: Key, inner: Value) -> Result<Self> {
        let Value::Object(ops) = inner else {
            // `{key: value}` is shorthand for `$eq`
            return Self::leaf_from_operand(key, WhereOperator::Eq, inner);
        };
        if ops.len() != 1 {
            return Err(QueryError::structural(format!(
                "where clause on key '{key}' must have exactly one operator, found {}",
                ops.len()
            )));
        }
        let Some((op, operand)) = ops.into_iter().next() else {
            return Err(QueryError::structural(format!("where clause on key '{key}' has no operator")));
        };
        let operator = WhereOperator::parse(&op).ok_or_else(|| {
            QueryError::structural(format!("unknown operator {op} on key '{key}'"))
        })?;
        Self::leaf_from_operand(key, operator, operand)
    }

    fn leaf_from_operand(key: Key, operator: WhereOperator, operand: Value) -> Result<Self> {
        Ok(match operand {
            Value::String(operand) => WhereClause::Str(Leaf { key, operator, operand }),
            Value::Bool(operand) => WhereClause::Bool(Leaf { key, operator, operand }),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(operand), _) => WhereClause::Int(Leaf { key, operator, operand }),
                (None, Some(operand)) => WhereClause::Float(Leaf { key, operator, operand }),
                (None, None) => {
                    return Err(QueryError::structural(format!("unrepresentable number on key '{key}'")))
                }
            },
            Value::Array(items) => WhereClause::List(Leaf {
                key,
                operator,
                operand: ListOperand::from_values(items)?,
            }),
            Value::Null | Value::Object(_) => {
                return Err(QueryError::structural(format!(
                    "unsupported operand for {operator} on key '{key}'"
                )))
            }
        })
    }
}

fn validate_children(operator: BooleanOperator, children: &[WhereClause]) -> Result<()> {
    if children.is_empty() {
        return Err(QueryError::arity(operator.as_str(), "clause"));
    }
    for child in children {
        child.validate().map_err(|e| e.context(operator.as_str()))?;
    }
    Ok(())
}

/// `{operator: operand}`
struct OperatorEntry<'a, T>(WhereOperator, &'a T);

impl<T: Serialize> Serialize for OperatorEntry<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0.as_str(), self.1)?;
        map.end()
    }
}

impl Serialize for WhereClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            WhereClause::Str(leaf) => {
                map.serialize_entry(leaf.key.as_str(), &OperatorEntry(leaf.operator, &leaf.operand))?
            }
            WhereClause::Int(leaf) => {
                map.serialize_entry(leaf.key.as_str(), &OperatorEntry(leaf.operator, &leaf.operand))?
            }
            WhereClause::Float(leaf) => {
                map.serialize_entry(leaf.key.as_str(), &OperatorEntry(leaf.operator, &leaf.operand))?
            }
            WhereClause::Bool(leaf) => {
                map.serialize_entry(leaf.key.as_str(), &OperatorEntry(leaf.operator, &leaf.operand))?
            }
            WhereClause::List(leaf) => {
                map.serialize_entry(leaf.key.as_str(), &OperatorEntry(leaf.operator, &leaf.operand))?
            }
            WhereClause::And(children) => map.serialize_entry(BooleanOperator::And.as_str(), children)?,
            WhereClause::Or(children) => map.serialize_entry(BooleanOperator::Or.as_str(), children)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WhereClause {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        WhereClause::parse(value).map_err(D::Error::custom)
    }
}

impl TryFrom<Value> for WhereClause {
    type Error = QueryError;

    fn try_from(value: Value) -> Result<Self> {
        WhereClause::parse(value)
    }
}
