// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for predicate validation, option application and the
//! collection pipeline.
//!
//! Every failure is returned on first occurrence. Callers that apply options
//! or validate an operation wrap the error with [`QueryError::context`] so the
//! final message names the operation and field, e.g.
//! `add: metadatas: metadatas has 2 entries but ids has 3`.

use thiserror::Error;

/// Boxed error produced by an external collaborator (embedding function,
/// transport).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Crate-wide result alias.
pub type Result<T, E = QueryError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum QueryError {
    /// Malformed clause: empty key, operator not allowed for the value kind.
    #[error("{0}")]
    Structural(String),

    /// A list or combinator that needs at least one element was empty.
    #[error("{what} requires at least one {item}")]
    Arity { what: String, item: &'static str },

    /// A column does not line up with the id list.
    #[error("{field} has {actual} entries but ids has {expected}")]
    Cardinality {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    /// A required collaborator was not provided.
    #[error("missing dependency: {0}")]
    Dependency(String),

    /// Numeric argument out of range (limit, offset, n_results, k, ...).
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// Filter found invalid while encoding a search request.
    #[error("invalid search filter: {0}")]
    InvalidSearchFilter(Box<QueryError>),

    #[error("embedding function failed: {0}")]
    Embedding(#[source] BoxError),

    #[error("transport failed: {0}")]
    Transport(#[source] BoxError),

    #[error("failed to decode {what} response: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("operation cancelled during {0}")]
    Cancelled(&'static str),

    #[error("deadline exceeded during {0}")]
    DeadlineExceeded(&'static str),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An inner error annotated with the operation or field it came from.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<QueryError>,
    },
}

impl QueryError {
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    pub fn arity(what: impl Into<String>, item: &'static str) -> Self {
        Self::Arity {
            what: what.into(),
            item,
        }
    }

    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// Wrap this error with the name of the operation or field it belongs to.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Short stable name of the innermost error, for metric labels.
    pub fn label(&self) -> &'static str {
        match self.root() {
            QueryError::Structural(_) => "structural",
            QueryError::Arity { .. } => "arity",
            QueryError::Cardinality { .. } => "cardinality",
            QueryError::DuplicateId(_) => "duplicate_id",
            QueryError::Dependency(_) => "dependency",
            QueryError::InvalidValue { .. } => "invalid_value",
            QueryError::InvalidSearchFilter(_) => "invalid_search_filter",
            QueryError::Embedding(_) => "embedding",
            QueryError::Transport(_) => "transport",
            QueryError::Decode { .. } => "decode",
            QueryError::Cancelled(_) => "cancelled",
            QueryError::DeadlineExceeded(_) => "deadline_exceeded",
            QueryError::Serialization(_) => "serialization",
            QueryError::Context { .. } => "context",
        }
    }

    /// The innermost error, skipping every [`QueryError::Context`] layer.
    pub fn root(&self) -> &QueryError {
        match self {
            QueryError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}
