// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Requests
//!
//! Ranked retrieval over a collection: a filter narrows candidates, a rank
//! scores them, an optional grouping keeps the top rows per group.
//!
//! # Architecture
//!
//! ```text
//! SearchFilter (ids + where) ──┐
//! Rank (Knn | Rrf[Knn...]) ────┤
//! SearchPage ──────────────────┼──► SearchRequest ──► SearchBatch ──► transport
//! Select ──────────────────────┤
//! GroupBy (MinK | MaxK) ───────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use collection_query::search::{Aggregate, GroupBy, Knn, Rrf, SearchRequest};
//! use collection_query::ops::{with_group_by, with_limit, with_rank, OptionTarget};
//!
//! let dense = Knn::new("vector databases").unwrap().limit(100).unwrap();
//! let sparse = Knn::new("vector databases").unwrap().key("#sparse");
//! let rank = Rrf::new([dense.with_weight(0.7), sparse.with_weight(0.3)], 60).unwrap();
//!
//! let request = SearchRequest::from_options(&[
//!     &with_rank(rank),
//!     &with_limit(10),
//!     &with_group_by(GroupBy::new(["author"], Aggregate::max_k(1, "#score"))),
//! ])
//! .unwrap();
//! assert!(request.validate().is_ok());
//! ```

mod group_by;
mod rank;
mod request;

pub use group_by::{Aggregate, GroupBy};
pub use rank::{Knn, KnnQuery, Rank, Rrf};
pub use request::{SearchBatch, SearchRequest, Select};
