// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Filter Predicates
//!
//! Typed predicate trees for metadata (`where`) and document content
//! (`where_document`), plus the search-endpoint filter that folds an id list
//! into a where clause.
//!
//! # Wire Grammar
//!
//! ```text
//! leaf_where        := { <key>: { <op>: <value> } }
//! combinator_where  := { "$and"|"$or": [ where, ... ] }
//! leaf_doc_filter   := { <op>: <text> }
//! combinator_doc    := { "$and"|"$or": [ doc_filter, ... ] }
//! search_filter     := {} | {"#id": {"$in": [id...]}} | where | {"$and": [idClause, where]}
//! ```
//!
//! Predicates are built freely and checked with `validate()`. Operation
//! builders validate attached filters in `prepare_and_validate`; the search
//! filter defers the check until it is encoded.

mod search_filter;
mod where_clause;
mod where_document;

pub use search_filter::SearchFilter;
pub use where_clause::{
    BooleanOperator, Leaf, ListOperand, OperandKind, Scalar, WhereClause, WhereOperator,
};
pub use where_document::{DocumentOperator, WhereDocumentFilter};
