// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Option values that configure an operation builder.
//!
//! Every option is a value implementing [`OpOption`] for the builders it
//! makes sense on. Options are applied strictly in the order given and the
//! first failure stops the sequence. List options append to what earlier
//! options accumulated; id options reject duplicates immediately.
//!
//! ```text
//! option                    get  query  add  upsert  update  delete  search
//! ────────────────────────  ───  ─────  ───  ──────  ──────  ──────  ──────
//! with_ids                   x     x     x     x       x       x       x
//! with_where                 x     x                           x       x
//! with_where_document        x     x                           x
//! with_include               x     x
//! with_limit/offset/page     x                                         x
//! with_sort                  x
//! with_documents ...         .           x     x       x
//! with_id_generator                      x     x
//! with_records                           x     x
//! with_query_texts ...             x
//! with_rank/select/...                                                 x
//! ```
//!
//! Targets are expressed as small traits ([`IdTarget`], [`WhereTarget`], ...)
//! so one option type serves every builder that carries the fragment.

use std::sync::Arc;

use crate::embedding::{Embedding, IdGenerator};
use crate::error::{QueryError, Result};
use crate::filter::{SearchFilter, WhereClause, WhereDocumentFilter};
use crate::key::Key;
use crate::metadata::Metadata;
use crate::page::Page;
use crate::search::{GroupBy, Rank, SearchRequest, Select};

use super::add::CollectionAddOp;
use super::fragments::{Columns, Include, Sort};
use super::get::CollectionGetOp;
use super::query::CollectionQueryOp;
use super::record::Record;

/// A configuration step for builder `B`.
pub trait OpOption<B: ?Sized>: Send + Sync {
    fn apply_to(&self, op: &mut B) -> Result<()>;
}

/// Builders that accumulate document ids.
pub trait IdTarget {
    fn append_ids(&mut self, ids: &[String]) -> Result<()>;
}

pub trait WhereTarget {
    fn set_where(&mut self, clause: WhereClause);
}

pub trait WhereDocumentTarget {
    fn set_where_document(&mut self, filter: WhereDocumentFilter);
}

pub trait IncludeTarget {
    fn set_include(&mut self, include: Vec<Include>);
}

/// Builders with limit/offset pagination.
pub trait PageTarget {
    fn set_limit(&mut self, limit: usize);
    fn set_offset(&mut self, offset: usize);
}

/// Builders carrying row-aligned payload columns.
pub trait ColumnTarget {
    fn columns_mut(&mut self) -> &mut Columns;
}

// =============================================================================
// Shared options
// =============================================================================

#[derive(Debug, Clone)]
pub struct WithIds(Vec<String>);

/// Append ids. Fails on an empty list or any duplicate.
pub fn with_ids<I, S>(ids: I) -> WithIds
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    WithIds(ids.into_iter().map(Into::into).collect())
}

impl<B: IdTarget> OpOption<B> for WithIds {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        if self.0.is_empty() {
            return Err(QueryError::arity("with_ids", "id").context("ids"));
        }
        op.append_ids(&self.0).map_err(|e| e.context("ids"))
    }
}

#[derive(Debug, Clone)]
pub struct WithWhere(WhereClause);

/// Set the metadata filter, replacing any earlier one. Checked at validation.
pub fn with_where(clause: WhereClause) -> WithWhere {
    WithWhere(clause)
}

impl<B: WhereTarget> OpOption<B> for WithWhere {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        op.set_where(self.0.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithWhereDocument(WhereDocumentFilter);

pub fn with_where_document(filter: WhereDocumentFilter) -> WithWhereDocument {
    WithWhereDocument(filter)
}

impl<B: WhereDocumentTarget> OpOption<B> for WithWhereDocument {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        op.set_where_document(self.0.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithInclude(Vec<Include>);

pub fn with_include(include: impl IntoIterator<Item = Include>) -> WithInclude {
    WithInclude(include.into_iter().collect())
}

impl<B: IncludeTarget> OpOption<B> for WithInclude {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        op.set_include(self.0.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WithLimit(usize);

pub fn with_limit(limit: usize) -> WithLimit {
    WithLimit(limit)
}

impl<B: PageTarget> OpOption<B> for WithLimit {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        if self.0 == 0 {
            return Err(QueryError::invalid_value("limit", "must be greater than 0"));
        }
        op.set_limit(self.0);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WithOffset(usize);

pub fn with_offset(offset: usize) -> WithOffset {
    WithOffset(offset)
}

impl<B: PageTarget> OpOption<B> for WithOffset {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        op.set_offset(self.0);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WithPage(Page);

/// Set limit and offset from a [`Page`], validating the page first.
pub fn with_page(page: Page) -> WithPage {
    WithPage(page)
}

impl<B: PageTarget> OpOption<B> for WithPage {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        self.0.validate().map_err(|e| e.context("page"))?;
        op.set_limit(self.0.limit());
        op.set_offset(self.0.offset());
        Ok(())
    }
}

// =============================================================================
// Column options (add, upsert, update)
// =============================================================================

#[derive(Debug, Clone)]
pub struct WithDocuments(Vec<String>);

pub fn with_documents<I, S>(documents: I) -> WithDocuments
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    WithDocuments(documents.into_iter().map(Into::into).collect())
}

impl<B: ColumnTarget> OpOption<B> for WithDocuments {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        op.columns_mut().documents.extend(self.0.iter().cloned());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithEmbeddings(Vec<Embedding>);

pub fn with_embeddings(embeddings: impl IntoIterator<Item = Embedding>) -> WithEmbeddings {
    WithEmbeddings(embeddings.into_iter().collect())
}

impl<B: ColumnTarget> OpOption<B> for WithEmbeddings {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        check_embeddings(&self.0).map_err(|e| e.context("embeddings"))?;
        op.columns_mut().embeddings.extend(self.0.iter().cloned());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithMetadatas(Vec<Metadata>);

pub fn with_metadatas(metadatas: impl IntoIterator<Item = Metadata>) -> WithMetadatas {
    WithMetadatas(metadatas.into_iter().collect())
}

impl<B: ColumnTarget> OpOption<B> for WithMetadatas {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        op.columns_mut().metadatas.extend(self.0.iter().cloned());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithUris(Vec<String>);

pub fn with_uris<I, S>(uris: I) -> WithUris
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    WithUris(uris.into_iter().map(Into::into).collect())
}

impl<B: ColumnTarget> OpOption<B> for WithUris {
    fn apply_to(&self, op: &mut B) -> Result<()> {
        op.columns_mut().uris.extend(self.0.iter().cloned());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithIdGenerator(Arc<dyn IdGenerator>);

/// Generate ids at validation time when none were given explicitly.
pub fn with_id_generator(generator: Arc<dyn IdGenerator>) -> WithIdGenerator {
    WithIdGenerator(generator)
}

impl OpOption<CollectionAddOp> for WithIdGenerator {
    fn apply_to(&self, op: &mut CollectionAddOp) -> Result<()> {
        op.id_generator = Some(Arc::clone(&self.0));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithRecords(Vec<Record>);

/// Append whole rows; each record is validated and its id deduplicated.
pub fn with_records(records: impl IntoIterator<Item = Record>) -> WithRecords {
    WithRecords(records.into_iter().collect())
}

impl OpOption<CollectionAddOp> for WithRecords {
    fn apply_to(&self, op: &mut CollectionAddOp) -> Result<()> {
        if self.0.is_empty() {
            return Err(QueryError::arity("with_records", "record").context("records"));
        }
        for (i, record) in self.0.iter().enumerate() {
            record
                .validate()
                .map_err(|e| e.context(format!("records[{i}]")))?;
        }
        op.push_records(&self.0).map_err(|e| e.context("records"))
    }
}

// =============================================================================
// Query options
// =============================================================================

#[derive(Debug, Clone)]
pub struct WithQueryTexts(Vec<String>);

/// Append query texts; embedded before sending unless embeddings are given.
pub fn with_query_texts<I, S>(texts: I) -> WithQueryTexts
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    WithQueryTexts(texts.into_iter().map(Into::into).collect())
}

impl OpOption<CollectionQueryOp> for WithQueryTexts {
    fn apply_to(&self, op: &mut CollectionQueryOp) -> Result<()> {
        if self.0.iter().any(String::is_empty) {
            return Err(QueryError::invalid_value("query_texts", "texts must not be empty"));
        }
        op.query_texts.extend(self.0.iter().cloned());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithQueryEmbeddings(Vec<Embedding>);

pub fn with_query_embeddings(
    embeddings: impl IntoIterator<Item = Embedding>,
) -> WithQueryEmbeddings {
    WithQueryEmbeddings(embeddings.into_iter().collect())
}

impl OpOption<CollectionQueryOp> for WithQueryEmbeddings {
    fn apply_to(&self, op: &mut CollectionQueryOp) -> Result<()> {
        check_embeddings(&self.0).map_err(|e| e.context("query_embeddings"))?;
        op.query_embeddings.extend(self.0.iter().cloned());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WithNResults(usize);

pub fn with_n_results(n: usize) -> WithNResults {
    WithNResults(n)
}

impl OpOption<CollectionQueryOp> for WithNResults {
    fn apply_to(&self, op: &mut CollectionQueryOp) -> Result<()> {
        if self.0 == 0 {
            return Err(QueryError::invalid_value("n_results", "must be greater than 0"));
        }
        op.n_results = Some(self.0);
        Ok(())
    }
}

// =============================================================================
// Get-only options
// =============================================================================

#[derive(Debug, Clone)]
pub struct WithSort(Sort);

pub fn with_sort(sort: Sort) -> WithSort {
    WithSort(sort)
}

impl OpOption<CollectionGetOp> for WithSort {
    fn apply_to(&self, op: &mut CollectionGetOp) -> Result<()> {
        op.sort = Some(self.0.clone());
        Ok(())
    }
}

// =============================================================================
// Search options
// =============================================================================

#[derive(Debug, Clone)]
pub struct WithRank(Rank);

pub fn with_rank(rank: impl Into<Rank>) -> WithRank {
    WithRank(rank.into())
}

impl OpOption<SearchRequest> for WithRank {
    fn apply_to(&self, op: &mut SearchRequest) -> Result<()> {
        op.rank = Some(self.0.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithSelect(Vec<Key>);

/// Append keys to the search projection.
pub fn with_select<I, K>(keys: I) -> WithSelect
where
    I: IntoIterator<Item = K>,
    K: Into<Key>,
{
    WithSelect(keys.into_iter().map(Into::into).collect())
}

impl OpOption<SearchRequest> for WithSelect {
    fn apply_to(&self, op: &mut SearchRequest) -> Result<()> {
        if let Some(key) = self.0.iter().find(|k| k.is_empty()) {
            return Err(QueryError::structural(format!("select key '{key}' must not be empty"))
                .context("select"));
        }
        op.select
            .get_or_insert_with(Select::default)
            .keys
            .extend(self.0.iter().cloned());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithGroupBy(GroupBy);

/// Group ranked results. The grouping is validated when applied.
pub fn with_group_by(group_by: GroupBy) -> WithGroupBy {
    WithGroupBy(group_by)
}

impl OpOption<SearchRequest> for WithGroupBy {
    fn apply_to(&self, op: &mut SearchRequest) -> Result<()> {
        self.0.validate().map_err(|e| e.context("group_by"))?;
        op.group_by = Some(self.0.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WithSearchFilter(SearchFilter);

/// Replace the whole search filter. Its where clause stays unchecked until
/// the request is encoded.
pub fn with_search_filter(filter: SearchFilter) -> WithSearchFilter {
    WithSearchFilter(filter)
}

impl OpOption<SearchRequest> for WithSearchFilter {
    fn apply_to(&self, op: &mut SearchRequest) -> Result<()> {
        op.filter = Some(self.0.clone());
        Ok(())
    }
}

fn check_embeddings(embeddings: &[Embedding]) -> Result<()> {
    match embeddings.iter().position(Vec::is_empty) {
        Some(i) => Err(QueryError::invalid_value(
            "embedding",
            format!("vector at index {i} is empty"),
        )),
        None => Ok(()),
    }
}
