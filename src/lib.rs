//! # Collection Query
//!
//! Typed query expressions and validated operation builders for a vector
//! document store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Predicates & Ranks                      │
//! │  • WhereClause / WhereDocumentFilter predicate trees       │
//! │  • SearchFilter (ids folded into a where clause)           │
//! │  • Rank (Knn | Rrf), GroupBy (MinK | MaxK), Page           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                   (applied as OpOption values)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Operation Builders                      │
//! │  • Get / Query / Add / Upsert / Update / Delete / Search   │
//! │  • Append semantics, eager duplicate-id rejection          │
//! │  • prepare_and_validate → embed_data → marshal             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                    (Collection pipeline)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   External Collaborators                    │
//! │  • EmbeddingFunction, IdGenerator                          │
//! │  • Transport (receives encoded, validated requests)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use collection_query::{WhereClause, WhereDocumentFilter};
//! use collection_query::ops::{
//!     with_ids, with_include, with_where, with_where_document, CollectionGetOp, CollectionOp,
//!     Include, OptionTarget,
//! };
//!
//! let mut op = CollectionGetOp::from_options(&[
//!     &with_ids(["doc-1", "doc-2"]),
//!     &with_where(WhereClause::gte("year", 2020).and_with(WhereClause::eq("lang", "en"))),
//!     &with_where_document(WhereDocumentFilter::contains("rust")),
//!     &with_include([Include::Documents]),
//! ])
//! .unwrap();
//! op.prepare_and_validate().unwrap();
//!
//! let body = op.marshal().unwrap();
//! assert_eq!(body["ids"][1], "doc-2");
//! ```
//!
//! ## Modules
//!
//! - [`filter`]: Where / where-document predicates and the search filter
//! - [`search`]: Ranks, grouping and search requests
//! - [`ops`]: Operation builders and their options
//! - [`collection`]: The [`Collection`] pipeline owner
//! - [`results`]: Decoded get / query / search responses
//! - [`context`]: Cancellation and deadlines for collaborator calls

pub mod collection;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod key;
pub mod metadata;
pub mod metrics;
pub mod ops;
pub mod page;
pub mod results;
pub mod search;
pub mod transport;

pub use collection::Collection;
pub use config::ClientConfig;
pub use context::{CancelHandle, OperationContext};
pub use embedding::{Embedding, EmbeddingFunction, IdGenerator, IdInput};
pub use error::{BoxError, QueryError, Result};
pub use filter::{
    BooleanOperator, DocumentOperator, ListOperand, OperandKind, Scalar, SearchFilter,
    WhereClause, WhereDocumentFilter, WhereOperator,
};
pub use key::Key;
pub use metadata::{Metadata, MetadataValue};
pub use metrics::LatencyTimer;
pub use ops::{OpOption, OperationKind};
pub use page::{Page, SearchPage};
pub use results::{GetResult, QueryResult, Row, SearchResult};
pub use search::{Aggregate, GroupBy, Knn, Rank, Rrf, SearchBatch, SearchRequest};
pub use transport::{OperationRequest, Transport};
