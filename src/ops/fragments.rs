// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Building blocks shared by the operation builders.
//!
//! Each builder is assembled from a handful of fragments:
//!
//! ```text
//! fragment        get  query  add  update  delete
//! ──────────────  ───  ─────  ───  ──────  ──────
//! IdList           x     x     x     x       x
//! FilterFragment   x     x                   x
//! include          x     x
//! LimitOffset      x
//! Columns                      x     x
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::context::OperationContext;
use crate::embedding::{embed_texts, Embedding, EmbeddingFunction};
use crate::error::{QueryError, Result};
use crate::filter::{WhereClause, WhereDocumentFilter};
use crate::key::Key;
use crate::metadata::Metadata;

/// Ordered list of document ids, unique across every append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdList(Vec<String>);

impl IdList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append ids, rejecting empty strings and any id already seen in this
    /// call or a previous one. On error nothing is appended.
    pub fn append<I, S>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let incoming: Vec<String> = ids.into_iter().map(Into::into).collect();

        let mut seen: HashSet<&str> = self.0.iter().map(String::as_str).collect();
        for id in &incoming {
            if id.is_empty() {
                return Err(QueryError::structural("ids must not contain an empty string"));
            }
            if !seen.insert(id.as_str()) {
                return Err(QueryError::DuplicateId(id.clone()));
            }
        }

        self.0.extend(incoming);
        Ok(())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl From<IdList> for Vec<String> {
    fn from(ids: IdList) -> Self {
        ids.0
    }
}

impl<'a> IntoIterator for &'a IdList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Metadata and document predicates of a read or delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterFragment {
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<WhereClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<WhereDocumentFilter>,
}

impl FilterFragment {
    pub fn is_empty(&self) -> bool {
        self.where_clause.is_none() && self.where_document.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(clause) = &self.where_clause {
            clause.validate().map_err(|e| e.context("where"))?;
        }
        if let Some(filter) = &self.where_document {
            filter.validate().map_err(|e| e.context("where_document"))?;
        }
        Ok(())
    }
}

/// Column selectable in a get or query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Include {
    Documents,
    Embeddings,
    Metadatas,
    Distances,
    Uris,
}

impl Include {
    pub fn as_str(self) -> &'static str {
        match self {
            Include::Documents => "documents",
            Include::Embeddings => "embeddings",
            Include::Metadatas => "metadatas",
            Include::Distances => "distances",
            Include::Uris => "uris",
        }
    }
}

impl fmt::Display for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LimitOffset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl LimitOffset {
    pub fn validate(&self) -> Result<()> {
        if self.limit == Some(0) {
            return Err(QueryError::invalid_value("limit", "must be greater than 0"));
        }
        Ok(())
    }
}

/// Result ordering. Accepted by the builders but not yet sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub key: Key,
    pub descending: bool,
}

impl Sort {
    pub fn asc(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            descending: false,
        }
    }

    pub fn desc(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            descending: true,
        }
    }
}

/// Row-aligned payload columns of an add, upsert or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Columns {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeddings: Vec<Embedding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadatas: Vec<Metadata>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uris: Vec<String>,
}

impl Columns {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
            && self.embeddings.is_empty()
            && self.metadatas.is_empty()
            && self.uris.is_empty()
    }

    /// Longest populated column; the row count when no ids are given yet.
    pub fn row_count(&self) -> usize {
        [
            self.documents.len(),
            self.embeddings.len(),
            self.metadatas.len(),
            self.uris.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Every non-empty column must have exactly `ids` entries.
    pub fn check_parity(&self, ids: usize) -> Result<()> {
        let columns = [
            ("documents", self.documents.len()),
            ("embeddings", self.embeddings.len()),
            ("metadatas", self.metadatas.len()),
            ("uris", self.uris.len()),
        ];
        for (field, actual) in columns {
            if actual != 0 && actual != ids {
                return Err(QueryError::Cardinality {
                    field,
                    expected: ids,
                    actual,
                }
                .context(field));
            }
        }
        Ok(())
    }

    /// Fill `embeddings` from `documents` when only documents are present.
    pub(crate) async fn embed_missing(
        &mut self,
        ctx: &OperationContext,
        embedding_fn: Option<&dyn EmbeddingFunction>,
    ) -> Result<()> {
        if self.documents.is_empty() || !self.embeddings.is_empty() {
            return Ok(());
        }
        self.embeddings = embed_texts(ctx, embedding_fn, &self.documents).await?;
        Ok(())
    }
}
