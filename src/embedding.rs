//! External collaborators that produce data for an operation.
//!
//! - [`EmbeddingFunction`] turns documents or query texts into vectors.
//! - [`IdGenerator`] produces ids for an add/upsert that supplied none.
//!
//! Neither has an implementation in this crate; hosts inject their own.

use async_trait::async_trait;
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

use crate::context::OperationContext;
use crate::error::{BoxError, QueryError, Result};
use crate::metrics;

/// Dense vector for one document or query.
pub type Embedding = Vec<f32>;

#[async_trait]
pub trait EmbeddingFunction: Send + Sync {
    /// Embed every text, returning one vector per input in the same order.
    async fn embed_documents(
        &self,
        ctx: &OperationContext,
        texts: &[String],
    ) -> Result<Vec<Embedding>, BoxError>;

    /// Embed a single query text.
    /// Default implementation embeds a one-element batch.
    async fn embed_query(&self, ctx: &OperationContext, text: &str) -> Result<Embedding, BoxError> {
        let mut embeddings = self.embed_documents(ctx, &[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| "embedding function returned no vector for the query".into())
    }
}

/// Input available to an [`IdGenerator`] for one row.
#[derive(Debug, Clone, Copy)]
pub struct IdInput<'a> {
    /// Position of the row within the operation
    pub index: usize,
    pub document: Option<&'a str>,
}

pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn generate(&self, input: IdInput<'_>) -> String;
}

/// Embed `texts` through `embedding_fn` inside `ctx`, requiring exactly one
/// vector back per text.
pub(crate) async fn embed_texts(
    ctx: &OperationContext,
    embedding_fn: Option<&dyn EmbeddingFunction>,
    texts: &[String],
) -> Result<Vec<Embedding>> {
    let Some(embedding_fn) = embedding_fn else {
        return Err(QueryError::Dependency(
            "an embedding function is required to embed documents".into(),
        ));
    };

    let start = Instant::now();
    debug!(count = texts.len(), "Embedding documents");

    let embeddings = ctx
        .run("embed", async {
            embedding_fn
                .embed_documents(ctx, texts)
                .await
                .map_err(QueryError::Embedding)
        })
        .await
        .inspect_err(|e| warn!(error = %e, "Embedding function failed"))?;

    if embeddings.len() != texts.len() {
        return Err(QueryError::Cardinality {
            field: "embeddings",
            expected: texts.len(),
            actual: embeddings.len(),
        });
    }

    metrics::record_embedded_documents(texts.len());
    debug!(
        count = texts.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Embedded documents"
    );
    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthEmbedder;

    #[async_trait]
    impl EmbeddingFunction for LengthEmbedder {
        async fn embed_documents(
            &self,
            _ctx: &OperationContext,
            texts: &[String],
        ) -> Result<Vec<Embedding>, BoxError> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl EmbeddingFunction for ShortEmbedder {
        async fn embed_documents(
            &self,
            _ctx: &OperationContext,
            _texts: &[String],
        ) -> Result<Vec<Embedding>, BoxError> {
            Ok(vec![vec![0.0]])
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_embed_texts_one_to_one() {
        let ctx = OperationContext::background();
        let out = embed_texts(&ctx, Some(&LengthEmbedder), &texts(&["a", "abc"]))
            .await
            .unwrap();
        assert_eq!(out, vec![vec![1.0], vec![3.0]]);
    }

    #[tokio::test]
    async fn test_missing_function_is_dependency_error() {
        let ctx = OperationContext::background();
        let err = embed_texts(&ctx, None, &texts(&["a"])).await.unwrap_err();
        assert!(matches!(err, QueryError::Dependency(_)));
    }

    #[tokio::test]
    async fn test_count_mismatch_is_cardinality_error() {
        let ctx = OperationContext::background();
        let err = embed_texts(&ctx, Some(&ShortEmbedder), &texts(&["a", "b"]))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Cardinality { field: "embeddings", expected: 2, actual: 1 }));
    }

    #[tokio::test]
    async fn test_embed_query_default() {
        let ctx = OperationContext::background();
        let vector = LengthEmbedder.embed_query(&ctx, "four").await.unwrap();
        assert_eq!(vector, vec![4.0]);
    }
}
