use async_trait::async_trait;
use serde::Serialize;

use super::fragments::{Columns, IdList};
use super::options::{ColumnTarget, IdTarget};
use super::{CollectionOp, Embeddable, OperationKind, OptionTarget};
use crate::context::OperationContext;
use crate::embedding::EmbeddingFunction;
use crate::error::{QueryError, Result};

/// Replace columns of existing records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionUpdateOp {
    pub ids: IdList,
    #[serde(flatten)]
    pub columns: Columns,
}

impl CollectionUpdateOp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionTarget for CollectionUpdateOp {}

impl CollectionOp for CollectionUpdateOp {
    fn kind(&self) -> OperationKind {
        OperationKind::Update
    }

    fn prepare_and_validate(&mut self) -> Result<()> {
        if self.ids.is_empty() {
            return Err(QueryError::arity("update", "id"));
        }
        if self.columns.is_empty() {
            return Err(QueryError::structural(
                "update requires at least one of documents, embeddings, metadatas or uris",
            ));
        }
        self.columns.check_parity(self.ids.len())
    }

    fn batch_len(&self) -> Option<usize> {
        Some(self.ids.len())
    }
}

#[async_trait]
impl Embeddable for CollectionUpdateOp {
    async fn embed_data(
        &mut self,
        ctx: &OperationContext,
        embedding_fn: Option<&dyn EmbeddingFunction>,
    ) -> Result<()> {
        self.columns.embed_missing(ctx, embedding_fn).await
    }
}

impl IdTarget for CollectionUpdateOp {
    fn append_ids(&mut self, ids: &[String]) -> Result<()> {
        self.ids.append(ids)
    }
}

impl ColumnTarget for CollectionUpdateOp {
    fn columns_mut(&mut self) -> &mut Columns {
        &mut self.columns
    }
}
