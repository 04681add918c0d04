// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search filter - id list and where clause folded into one predicate
//!
//! ```text
//! ids      where    encoded
//! ───────  ───────  ─────────────────────────────────────
//! empty    none     {}
//! [a, b]   none     {"#id": {"$in": ["a", "b"]}}
//! empty    W        W
//! [a]      W        {"$and": [{"#id": {"$in": ["a"]}}, W]}
//! ```
//!
//! The contained where clause is checked only when the filter is encoded, so
//! a filter can be assembled piecemeal (and be temporarily invalid) while the
//! surrounding search request is still being configured.

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::where_clause::WhereClause;
use crate::error::{QueryError, Result};
use crate::key::Key;
use crate::ops::IdList;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    ids: IdList,
    where_clause: Option<WhereClause>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given ids. Duplicates are rejected immediately.
    pub fn with_ids<I, S>(mut self, ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.append(ids)?;
        Ok(self)
    }

    /// Attach a where clause. Never fails; see [`SearchFilter::validate`].
    pub fn with_where(mut self, clause: WhereClause) -> Self {
        self.where_clause = Some(clause);
        self
    }

    pub fn add_ids<I, S>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.append(ids)
    }

    pub fn set_where(&mut self, clause: WhereClause) {
        self.where_clause = Some(clause);
    }

    pub fn ids(&self) -> &[String] {
        self.ids.as_slice()
    }

    pub fn where_clause(&self) -> Option<&WhereClause> {
        self.where_clause.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.where_clause.is_none()
    }

    /// Validate the contained where clause, wrapped as an invalid search filter.
    pub fn validate(&self) -> Result<()> {
        match &self.where_clause {
            Some(clause) => clause
                .validate()
                .map_err(|e| QueryError::InvalidSearchFilter(Box::new(e))),
            None => Ok(()),
        }
    }

    /// Encode to JSON, surfacing validation failures as [`QueryError`].
    pub fn to_value(&self) -> Result<Value> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }

    fn id_clause(&self) -> WhereClause {
        WhereClause::is_in(Key::id(), self.ids.to_vec())
    }
}

impl Serialize for SearchFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.validate().map_err(S::Error::custom)?;

        match (self.ids.is_empty(), &self.where_clause) {
            (true, None) => serializer.serialize_map(Some(0))?.end(),
            (false, None) => self.id_clause().serialize(serializer),
            (true, Some(clause)) => clause.serialize(serializer),
            (false, Some(clause)) => {
                WhereClause::And(vec![self.id_clause(), clause.clone()]).serialize(serializer)
            }
        }
    }
}
