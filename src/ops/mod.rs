// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Operation builders
//!
//! Each builder is a plain mutable accumulator for one server operation:
//!
//! ```text
//! ┌──────────────┐   apply (in order)   ┌──────────────┐  prepare_and_validate
//! │ OpOption ... │ ───────────────────► │   builder    │ ─────────────────────►
//! └──────────────┘  append / fail fast  └──────────────┘
//!        embed_data (add, upsert, update, query) ─► marshal ─► transport
//! ```
//!
//! Builders hold no locks; one instance must not be mutated from several
//! threads at once. After `marshal` the builder is treated as immutable.

mod add;
mod delete;
mod fragments;
mod get;
mod options;
mod query;
mod record;
mod update;

pub use add::CollectionAddOp;
pub use delete::CollectionDeleteOp;
pub use fragments::{Columns, FilterFragment, IdList, Include, LimitOffset, Sort};
pub use get::CollectionGetOp;
pub use options::*;
pub use query::CollectionQueryOp;
pub use record::Record;
pub use update::CollectionUpdateOp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::context::OperationContext;
use crate::embedding::EmbeddingFunction;
use crate::error::Result;

/// Server operation a builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Get,
    Query,
    Add,
    Upsert,
    Update,
    Delete,
    Search,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Get => "get",
            OperationKind::Query => "query",
            OperationKind::Add => "add",
            OperationKind::Upsert => "upsert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Search => "search",
        }
    }

    pub fn is_write(self) -> bool {
        matches!(
            self,
            OperationKind::Add | OperationKind::Upsert | OperationKind::Update | OperationKind::Delete
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A builder that can be validated and encoded for the transport.
pub trait CollectionOp: Serialize + Send {
    fn kind(&self) -> OperationKind;

    /// Structural and semantic checks, run once after every option is applied.
    fn prepare_and_validate(&mut self) -> Result<()>;

    /// Rows a write carries, for batch-size limits. `None` for reads.
    fn batch_len(&self) -> Option<usize> {
        None
    }

    /// Encode the request body.
    fn marshal(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Builders whose data may need embedding before they are sent.
#[async_trait]
pub trait Embeddable: Send {
    /// Fill missing embeddings from documents (or query texts). No-op when
    /// embeddings are present or there is nothing to embed.
    async fn embed_data(
        &mut self,
        ctx: &OperationContext,
        embedding_fn: Option<&dyn EmbeddingFunction>,
    ) -> Result<()>;
}

/// Option application shared by every builder.
pub trait OptionTarget: Sized {
    fn apply(&mut self, option: &dyn OpOption<Self>) -> Result<()> {
        option.apply_to(self)
    }

    /// Apply options in order, stopping at the first error. Options applied
    /// before the failure stay applied.
    fn apply_all(&mut self, options: &[&dyn OpOption<Self>]) -> Result<()> {
        for option in options {
            option.apply_to(self)?;
        }
        Ok(())
    }

    fn from_options(options: &[&dyn OpOption<Self>]) -> Result<Self>
    where
        Self: Default,
    {
        let mut op = Self::default();
        op.apply_all(options)?;
        Ok(op)
    }
}
