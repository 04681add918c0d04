// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the collection pipeline.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `collection_query_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: get, query, add, upsert, update, delete, search
//! - `phase`: embed, send
//! - `status`: success, error

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record the outcome of one collection operation
pub fn record_operation(operation: &str, status: &str) {
    counter!(
        "collection_query_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record end-to-end operation latency
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "collection_query_operation_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record latency of a single pipeline phase
pub fn record_phase_latency(operation: &str, phase: &str, duration: Duration) {
    histogram!(
        "collection_query_phase_seconds",
        "operation" => operation.to_string(),
        "phase" => phase.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record how many rows one operation carried
pub fn record_batch_size(operation: &str, count: usize) {
    histogram!(
        "collection_query_batch_size",
        "operation" => operation.to_string()
    )
    .record(count as f64);
}

/// Record documents sent through the embedding function
pub fn record_embedded_documents(count: usize) {
    counter!("collection_query_embedded_documents_total").increment(count as u64);
}

/// Record a validation or option failure, labelled by error kind
pub fn record_rejection(operation: &str, error_type: &str) {
    counter!(
        "collection_query_rejections_total",
        "operation" => operation.to_string(),
        "error_type" => error_type.to_string()
    )
    .increment(1);
}

/// A timing guard that records operation latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}
