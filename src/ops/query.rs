//! Nearest-neighbour query builder.
//!
//! Query texts are embedded client side; the body only ever carries
//! `query_embeddings`. When both texts and embeddings are supplied the
//! embeddings win and the texts are never embedded.

use async_trait::async_trait;
use serde::Serialize;

use super::fragments::{FilterFragment, IdList, Include};
use super::options::{IdTarget, IncludeTarget, WhereDocumentTarget, WhereTarget};
use super::{CollectionOp, Embeddable, OperationKind, OptionTarget};
use crate::context::OperationContext;
use crate::embedding::{embed_texts, Embedding, EmbeddingFunction};
use crate::error::{QueryError, Result};
use crate::filter::{WhereClause, WhereDocumentFilter};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionQueryOp {
    #[serde(skip)]
    pub query_texts: Vec<String>,
    pub query_embeddings: Vec<Embedding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_results: Option<usize>,
    #[serde(skip_serializing_if = "IdList::is_empty")]
    pub ids: IdList,
    #[serde(flatten)]
    pub filter: FilterFragment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<Include>>,
}

impl CollectionQueryOp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionTarget for CollectionQueryOp {}

impl CollectionOp for CollectionQueryOp {
    fn kind(&self) -> OperationKind {
        OperationKind::Query
    }

    fn prepare_and_validate(&mut self) -> Result<()> {
        if self.query_texts.is_empty() && self.query_embeddings.is_empty() {
            return Err(QueryError::structural(
                "query requires query texts or query embeddings",
            ));
        }
        if matches!(self.n_results, Some(0)) {
            return Err(QueryError::invalid_value("n_results", "must be greater than 0"));
        }
        self.filter.validate()
    }

    fn marshal(&self) -> Result<serde_json::Value> {
        if self.query_embeddings.is_empty() {
            return Err(QueryError::Dependency(
                "query texts must be embedded before the query is sent".into(),
            ));
        }
        Ok(serde_json::to_value(self)?)
    }
}

#[async_trait]
impl Embeddable for CollectionQueryOp {
    async fn embed_data(
        &mut self,
        ctx: &OperationContext,
        embedding_fn: Option<&dyn EmbeddingFunction>,
    ) -> Result<()> {
        if self.query_texts.is_empty() || !self.query_embeddings.is_empty() {
            return Ok(());
        }
        self.query_embeddings = embed_texts(ctx, embedding_fn, &self.query_texts).await?;
        Ok(())
    }
}

impl IdTarget for CollectionQueryOp {
    fn append_ids(&mut self, ids: &[String]) -> Result<()> {
        self.ids.append(ids)
    }
}

impl WhereTarget for CollectionQueryOp {
    fn set_where(&mut self, clause: WhereClause) {
        self.filter.where_clause = Some(clause);
    }
}

impl WhereDocumentTarget for CollectionQueryOp {
    fn set_where_document(&mut self, filter: WhereDocumentFilter) {
        self.filter.where_document = Some(filter);
    }
}

impl IncludeTarget for CollectionQueryOp {
    fn set_include(&mut self, include: Vec<Include>) {
        self.include = Some(include);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{with_n_results, with_query_embeddings, with_query_texts, with_where};
    use serde_json::json;

    #[test]
    fn test_requires_query_source() {
        let mut op = CollectionQueryOp::from_options(&[&with_n_results(3)]).unwrap();
        assert!(op.prepare_and_validate().is_err());
    }

    #[test]
    fn test_body_shape() {
        let mut op = CollectionQueryOp::from_options(&[
            &with_query_embeddings([vec![0.5, 0.25]]),
            &with_n_results(2),
            &with_where(WhereClause::gte("year", 2020)),
        ])
        .unwrap();
        op.prepare_and_validate().unwrap();
        assert_eq!(
            op.marshal().unwrap(),
            json!({
                "query_embeddings": [[0.5, 0.25]],
                "n_results": 2,
                "where": {"year": {"$gte": 2020}}
            })
        );
    }

    #[test]
    fn test_texts_must_be_embedded_before_marshal() {
        let mut op = CollectionQueryOp::from_options(&[&with_query_texts(["hello"])]).unwrap();
        op.prepare_and_validate().unwrap();
        assert!(matches!(op.marshal(), Err(QueryError::Dependency(_))));
    }

    #[tokio::test]
    async fn test_embed_without_function_is_dependency_error() {
        let mut op = CollectionQueryOp::from_options(&[&with_query_texts(["hello"])]).unwrap();
        let err = op
            .embed_data(&OperationContext::background(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Dependency(_)));
    }

    #[tokio::test]
    async fn test_embed_is_noop_with_embeddings() {
        let mut op = CollectionQueryOp::from_options(&[
            &with_query_texts(["hello"]),
            &with_query_embeddings([vec![1.0]]),
        ])
        .unwrap();
        op.embed_data(&OperationContext::background(), None).await.unwrap();
        assert_eq!(op.query_embeddings, vec![vec![1.0]]);
    }
}
