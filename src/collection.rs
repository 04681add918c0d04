// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Collection handle - owner of the operation pipeline
//!
//! Every operation runs the same fixed sequence and stops at the first error:
//!
//! ```text
//! options ─► apply (in order) ─► prepare_and_validate ─► batch limit
//!         ─► embed_data (add, upsert, update, query) ─► marshal ─► transport
//!         ─► decode (get, query, search)
//! ```
//!
//! Errors leave the pipeline wrapped with the operation name, e.g.
//! `add: metadatas: metadatas has 2 entries but ids has 3`. The embedding
//! function and the transport are each called at most once per operation.
//!
//! # Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use collection_query::{Collection, OperationContext, Transport, WhereClause};
//! # use collection_query::ops::{with_limit, with_where};
//! # async fn example(transport: Arc<dyn Transport>) -> collection_query::Result<()> {
//! let collection = Collection::new("articles", transport);
//! let ctx = OperationContext::background();
//!
//! let result = collection
//!     .get(&ctx, &[&with_where(WhereClause::eq("lang", "en")), &with_limit(20)])
//!     .await?;
//! for row in result.rows() {
//!     println!("{} {:?}", row.id, row.document);
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::context::OperationContext;
use crate::embedding::EmbeddingFunction;
use crate::error::{QueryError, Result};
use crate::metrics::{self, LatencyTimer};
use crate::ops::{
    CollectionAddOp, CollectionDeleteOp, CollectionGetOp, CollectionOp, CollectionQueryOp,
    CollectionUpdateOp, Embeddable, OpOption, OperationKind, OptionTarget,
};
use crate::page::Page;
use crate::results::{decode, GetResult, QueryResult, SearchResult};
use crate::search::{Knn, KnnQuery, Rrf, SearchBatch, SearchRequest};
use crate::transport::{OperationRequest, Transport};

/// Handle to one collection on a server reached through a [`Transport`].
#[derive(Clone)]
pub struct Collection {
    id: String,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    embedding_fn: Option<Arc<dyn EmbeddingFunction>>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("embedding_fn", &self.embedding_fn.is_some())
            .finish_non_exhaustive()
    }
}

impl Collection {
    pub fn new(id: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            id: id.into(),
            config: ClientConfig::default(),
            transport,
            embedding_fn: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_embedding_function(mut self, embedding_fn: Arc<dyn EmbeddingFunction>) -> Self {
        self.embedding_fn = Some(embedding_fn);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn embedding_function(&self) -> Option<&dyn EmbeddingFunction> {
        self.embedding_fn.as_deref()
    }

    /// First page sized by the configured default limit.
    pub fn page(&self) -> Page {
        Page::new().with_limit(self.config.default_page_limit)
    }

    /// A [`Knn`] rank with the configured default candidate limit.
    pub fn knn(&self, query: impl Into<KnnQuery>) -> Result<Knn> {
        Knn::new(query)?.limit(self.config.default_knn_limit)
    }

    /// An [`Rrf`] fusion with the configured default `k`.
    pub fn rrf(&self, ranks: impl IntoIterator<Item = Knn>) -> Result<Rrf> {
        Rrf::new(ranks, self.config.default_rrf_k)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub async fn get(
        &self,
        ctx: &OperationContext,
        options: &[&dyn OpOption<CollectionGetOp>],
    ) -> Result<GetResult> {
        self.instrumented(OperationKind::Get, async {
            let mut op = CollectionGetOp::from_options(options)?;
            if op.include.is_none() {
                op.include = Some(self.config.get_include.clone());
            }
            self.prepare(&mut op)?;
            let body = self.send(ctx, &op).await?;
            decode("get", &body)
        })
        .await
    }

    pub async fn query(
        &self,
        ctx: &OperationContext,
        options: &[&dyn OpOption<CollectionQueryOp>],
    ) -> Result<QueryResult> {
        self.instrumented(OperationKind::Query, async {
            let mut op = CollectionQueryOp::from_options(options)?;
            op.n_results.get_or_insert(self.config.default_n_results);
            if op.include.is_none() {
                op.include = Some(self.config.query_include.clone());
            }
            self.prepare(&mut op)?;
            self.embed(ctx, &mut op).await?;
            let body = self.send(ctx, &op).await?;
            decode("query", &body)
        })
        .await
    }

    pub async fn add(
        &self,
        ctx: &OperationContext,
        options: &[&dyn OpOption<CollectionAddOp>],
    ) -> Result<()> {
        self.write(ctx, CollectionAddOp::add(), options).await
    }

    /// Add records, replacing any that already exist.
    pub async fn upsert(
        &self,
        ctx: &OperationContext,
        options: &[&dyn OpOption<CollectionAddOp>],
    ) -> Result<()> {
        self.write(ctx, CollectionAddOp::upsert(), options).await
    }

    pub async fn update(
        &self,
        ctx: &OperationContext,
        options: &[&dyn OpOption<CollectionUpdateOp>],
    ) -> Result<()> {
        self.write(ctx, CollectionUpdateOp::new(), options).await
    }

    pub async fn delete(
        &self,
        ctx: &OperationContext,
        options: &[&dyn OpOption<CollectionDeleteOp>],
    ) -> Result<()> {
        self.instrumented(OperationKind::Delete, async {
            let mut op = CollectionDeleteOp::from_options(options)?;
            self.prepare(&mut op)?;
            self.send(ctx, &op).await?;
            Ok(())
        })
        .await
    }

    /// Run a single search built from options.
    pub async fn search(
        &self,
        ctx: &OperationContext,
        options: &[&dyn OpOption<SearchRequest>],
    ) -> Result<SearchResult> {
        self.instrumented(OperationKind::Search, async {
            let request = SearchRequest::from_options(options)?;
            self.run_search(ctx, SearchBatch::from(request)).await
        })
        .await
    }

    /// Run several prepared searches in one round trip.
    pub async fn search_batch(
        &self,
        ctx: &OperationContext,
        batch: SearchBatch,
    ) -> Result<SearchResult> {
        self.instrumented(OperationKind::Search, self.run_search(ctx, batch))
            .await
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    async fn run_search(&self, ctx: &OperationContext, mut batch: SearchBatch) -> Result<SearchResult> {
        self.prepare(&mut batch)?;
        let body = self.send(ctx, &batch).await?;
        decode("search", &body)
    }

    async fn write<O>(
        &self,
        ctx: &OperationContext,
        mut op: O,
        options: &[&dyn OpOption<O>],
    ) -> Result<()>
    where
        O: CollectionOp + Embeddable + OptionTarget,
    {
        let kind = op.kind();
        self.instrumented(kind, async {
            op.apply_all(options)?;
            self.prepare(&mut op)?;
            self.embed(ctx, &mut op).await?;
            self.send(ctx, &op).await?;
            Ok(())
        })
        .await
    }

    /// Validate, then enforce the configured batch limit on writes.
    fn prepare<O: CollectionOp>(&self, op: &mut O) -> Result<()> {
        op.prepare_and_validate()?;

        if let (Some(max), Some(rows)) = (self.config.max_batch_size, op.batch_len()) {
            if rows > max {
                return Err(QueryError::invalid_value(
                    "ids",
                    format!("batch of {rows} exceeds max_batch_size {max}"),
                ));
            }
        }
        if let Some(rows) = op.batch_len() {
            metrics::record_batch_size(op.kind().as_str(), rows);
        }
        Ok(())
    }

    async fn embed<O: CollectionOp + Embeddable>(
        &self,
        ctx: &OperationContext,
        op: &mut O,
    ) -> Result<()> {
        let start = Instant::now();
        op.embed_data(ctx, self.embedding_fn.as_deref()).await?;
        metrics::record_phase_latency(op.kind().as_str(), "embed", start.elapsed());
        Ok(())
    }

    async fn send<O: CollectionOp>(&self, ctx: &OperationContext, op: &O) -> Result<Vec<u8>> {
        let kind = op.kind();
        let request = OperationRequest {
            kind,
            collection_id: self.id.clone(),
            body: op.marshal()?,
        };

        debug!(collection = %self.id, kind = %kind, "Sending operation");
        let start = Instant::now();
        let response = ctx
            .run("send", async {
                self.transport
                    .send(ctx, request)
                    .await
                    .map_err(QueryError::Transport)
            })
            .await?;
        metrics::record_phase_latency(kind.as_str(), "send", start.elapsed());

        debug!(
            collection = %self.id,
            kind = %kind,
            bytes = response.len(),
            "Operation response received"
        );
        Ok(response)
    }

    /// Record outcome metrics and attach the operation name to any error.
    async fn instrumented<T, F>(&self, kind: OperationKind, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _timer = LatencyTimer::new(kind.as_str());
        match fut.await {
            Ok(value) => {
                metrics::record_operation(kind.as_str(), "success");
                Ok(value)
            }
            Err(e) => {
                metrics::record_operation(kind.as_str(), "error");
                metrics::record_rejection(kind.as_str(), e.label());
                warn!(collection = %self.id, kind = %kind, error = %e, "Operation failed");
                Err(e.context(kind.as_str()))
            }
        }
    }
}
