//! Transport seam between the pipeline and the server.
//!
//! The crate never opens connections itself. A host implements [`Transport`]
//! (HTTP, gRPC, an in-process store for tests) and receives requests that
//! were already validated and encoded.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::context::OperationContext;
use crate::error::BoxError;
use crate::ops::OperationKind;

/// A validated, encoded operation addressed to one collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRequest {
    pub kind: OperationKind,
    pub collection_id: String,
    pub body: Value,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the raw response body.
    ///
    /// Called at most once per operation. Retries, if any, belong to the
    /// implementation.
    async fn send(
        &self,
        ctx: &OperationContext,
        request: OperationRequest,
    ) -> Result<Vec<u8>, BoxError>;
}
