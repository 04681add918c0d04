// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search request and batch
//!
//! ```text
//! search_request := { "filter"?, "rank"?, "limit"?: {"limit": N, "offset": N},
//!                     "select"?: {"keys": [...]}, "group_by"? }
//! search_batch   := { "searches": [search_request, ...] }
//! ```
//!
//! Every field is omitted when unset, so a fresh [`SearchRequest`] encodes to
//! `{}`. The filter is the one part not checked by `prepare_and_validate`;
//! it is validated when the request is encoded and fails as
//! [`QueryError::InvalidSearchFilter`].

use serde::Serialize;
use serde_json::Value;

use super::group_by::GroupBy;
use super::rank::Rank;
use crate::error::{QueryError, Result};
use crate::filter::{SearchFilter, WhereClause};
use crate::key::Key;
use crate::ops::{CollectionOp, IdTarget, OperationKind, OptionTarget, PageTarget, WhereTarget};
use crate::page::{Page, SearchPage};

/// Keys returned for each search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Select {
    pub keys: Vec<Key>,
}

impl Select {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(QueryError::arity("select", "key"));
        }
        if self.keys.iter().any(Key::is_empty) {
            return Err(QueryError::structural("select keys must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<SearchFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<Rank>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<SearchPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check rank, grouping, projection and page. The filter is left alone.
    pub fn validate(&self) -> Result<()> {
        if let Some(rank) = &self.rank {
            rank.validate().map_err(|e| e.context("rank"))?;
        }
        if let Some(group_by) = &self.group_by {
            group_by.validate().map_err(|e| e.context("group_by"))?;
        }
        if let Some(select) = &self.select {
            select.validate().map_err(|e| e.context("select"))?;
        }
        if let Some(page) = &self.limit {
            page.validate().map_err(|e| e.context("limit"))?;
        }
        Ok(())
    }

    /// Encode, surfacing a bad filter as [`QueryError::InvalidSearchFilter`].
    pub fn to_value(&self) -> Result<Value> {
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }
        Ok(serde_json::to_value(self)?)
    }

    /// A page set by offset alone still carries the default limit.
    fn page_mut(&mut self) -> &mut SearchPage {
        self.limit.get_or_insert_with(|| SearchPage::from(Page::new()))
    }
}

impl OptionTarget for SearchRequest {}

impl IdTarget for SearchRequest {
    fn append_ids(&mut self, ids: &[String]) -> Result<()> {
        self.filter
            .get_or_insert_with(SearchFilter::new)
            .add_ids(ids)
    }
}

impl WhereTarget for SearchRequest {
    fn set_where(&mut self, clause: WhereClause) {
        self.filter
            .get_or_insert_with(SearchFilter::new)
            .set_where(clause);
    }
}

impl PageTarget for SearchRequest {
    fn set_limit(&mut self, limit: usize) {
        self.page_mut().limit = Some(limit);
    }

    fn set_offset(&mut self, offset: usize) {
        self.page_mut().offset = offset;
    }
}

/// One or more searches sent in a single round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchBatch {
    pub searches: Vec<SearchRequest>,
}

impl SearchBatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn push(mut self, request: SearchRequest) -> Self {
        self.searches.push(request);
        self
    }

    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }
}

impl From<SearchRequest> for SearchBatch {
    fn from(request: SearchRequest) -> Self {
        Self {
            searches: vec![request],
        }
    }
}

impl FromIterator<SearchRequest> for SearchBatch {
    fn from_iter<I: IntoIterator<Item = SearchRequest>>(iter: I) -> Self {
        Self {
            searches: iter.into_iter().collect(),
        }
    }
}

impl CollectionOp for SearchBatch {
    fn kind(&self) -> OperationKind {
        OperationKind::Search
    }

    fn prepare_and_validate(&mut self) -> Result<()> {
        if self.searches.is_empty() {
            return Err(QueryError::arity("search", "request"));
        }
        for (i, request) in self.searches.iter().enumerate() {
            request
                .validate()
                .map_err(|e| e.context(format!("searches[{i}]")))?;
        }
        Ok(())
    }

    fn marshal(&self) -> Result<Value> {
        for (i, request) in self.searches.iter().enumerate() {
            if let Some(filter) = &request.filter {
                filter
                    .validate()
                    .map_err(|e| e.context(format!("searches[{i}]")))?;
            }
        }
        Ok(serde_json::to_value(self)?)
    }
}
