//! Integration Tests for the collection pipeline
//!
//! Drives [`Collection`] end to end against an in-memory recording transport
//! and a deterministic embedding function. No server is required.
//!
//! # Running Tests
//! ```bash
//! cargo test --test integration
//!
//! # Run only failure scenario tests
//! cargo test --test integration failure
//! ```
//!
//! # Test Organization
//! - `happy_*` - Normal operation: bodies sent, responses decoded
//! - `failure_*` - Validation, collaborator and cancellation failures

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use collection_query::ops::{
    with_documents, with_embeddings, with_id_generator, with_ids, with_include, with_limit,
    with_metadatas, with_n_results, with_query_texts, with_rank, with_search_filter, with_where,
    Include,
};
use collection_query::{
    BoxError, ClientConfig, Collection, Embedding, EmbeddingFunction, IdGenerator, IdInput, Knn,
    Metadata, OperationContext, OperationKind, OperationRequest, QueryError, SearchBatch,
    SearchFilter, SearchRequest, Transport, WhereClause,
};

// =============================================================================
// Test Doubles
// =============================================================================

/// Records every request and replies with a canned body.
#[derive(Default)]
struct RecordingTransport {
    requests: Mutex<Vec<OperationRequest>>,
    response: Mutex<Vec<u8>>,
    fail: Mutex<bool>,
}

impl RecordingTransport {
    fn replying(body: Value) -> Arc<Self> {
        let transport = Self::default();
        *transport.response.lock() = serde_json::to_vec(&body).unwrap();
        Arc::new(transport)
    }

    fn failing() -> Arc<Self> {
        let transport = Self::default();
        *transport.fail.lock() = true;
        Arc::new(transport)
    }

    fn sent(&self) -> Vec<OperationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        _ctx: &OperationContext,
        request: OperationRequest,
    ) -> Result<Vec<u8>, BoxError> {
        self.requests.lock().push(request);
        if *self.fail.lock() {
            return Err("connection reset".into());
        }
        Ok(self.response.lock().clone())
    }
}

/// Never answers; used to exercise cancellation and deadlines.
struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn send(
        &self,
        _ctx: &OperationContext,
        _request: OperationRequest,
    ) -> Result<Vec<u8>, BoxError> {
        std::future::pending().await
    }
}

/// Embeds each text as `[len, 1.0]` and counts calls.
#[derive(Default)]
struct CountingEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingFunction for CountingEmbedder {
    async fn embed_documents(
        &self,
        _ctx: &OperationContext,
        texts: &[String],
    ) -> Result<Vec<Embedding>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
    }
}

struct FailingEmbedder;

#[async_trait]
impl EmbeddingFunction for FailingEmbedder {
    async fn embed_documents(
        &self,
        _ctx: &OperationContext,
        _texts: &[String],
    ) -> Result<Vec<Embedding>, BoxError> {
        Err("model unavailable".into())
    }
}

#[derive(Debug)]
struct IndexIds;

impl IdGenerator for IndexIds {
    fn generate(&self, input: IdInput<'_>) -> String {
        format!("row-{}", input.index)
    }
}

fn ctx() -> OperationContext {
    OperationContext::background()
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn happy_get_sends_body_and_decodes_rows() {
    let transport = RecordingTransport::replying(json!({
        "ids": ["a", "b"],
        "documents": ["first", null],
        "metadatas": [{"lang": "en"}, null]
    }));
    let collection = Collection::new("articles", transport.clone());

    let result = collection
        .get(
            &ctx(),
            &[
                &with_ids(["a", "b"]),
                &with_where(WhereClause::eq("lang", "en")),
                &with_limit(10),
            ],
        )
        .await
        .unwrap();

    let rows: Vec<_> = result.rows().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].document, Some("first"));
    assert!(rows[1].metadata.is_none());

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, OperationKind::Get);
    assert_eq!(sent[0].collection_id, "articles");
    assert_eq!(
        sent[0].body,
        json!({
            "ids": ["a", "b"],
            "where": {"lang": {"$eq": "en"}},
            "include": ["documents", "metadatas"],
            "limit": 10
        })
    );
}

#[tokio::test]
async fn happy_add_embeds_documents_once() {
    let transport = RecordingTransport::replying(json!({}));
    let embedder = Arc::new(CountingEmbedder::default());
    let collection = Collection::new("notes", transport.clone())
        .with_embedding_function(embedder.clone());

    collection
        .add(
            &ctx(),
            &[&with_ids(["n1", "n2"]), &with_documents(["hi", "hello"])],
        )
        .await
        .unwrap();

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    let body = &transport.sent()[0].body;
    assert_eq!(body["embeddings"], json!([[2.0, 1.0], [5.0, 1.0]]));
    assert_eq!(body["ids"], json!(["n1", "n2"]));
}

#[tokio::test]
async fn happy_add_with_embeddings_skips_embedding() {
    let transport = RecordingTransport::replying(json!({}));
    let embedder = Arc::new(CountingEmbedder::default());
    let collection = Collection::new("notes", transport.clone())
        .with_embedding_function(embedder.clone());

    collection
        .add(
            &ctx(),
            &[
                &with_ids(["n1"]),
                &with_documents(["text"]),
                &with_embeddings([vec![0.5, 0.5]]),
            ],
        )
        .await
        .unwrap();

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn happy_upsert_with_generated_ids() {
    let transport = RecordingTransport::replying(json!({}));
    let collection = Collection::new("notes", transport.clone());

    collection
        .upsert(
            &ctx(),
            &[
                &with_id_generator(Arc::new(IndexIds)),
                &with_embeddings([vec![1.0], vec![2.0]]),
            ],
        )
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent[0].kind, OperationKind::Upsert);
    assert_eq!(sent[0].body["ids"], json!(["row-0", "row-1"]));
}

#[tokio::test]
async fn happy_query_embeds_texts_and_applies_defaults() {
    let transport = RecordingTransport::replying(json!({
        "ids": [["a", "b"]],
        "distances": [[0.1, 0.4]],
        "documents": null
    }));
    let collection = Collection::new("notes", transport.clone())
        .with_embedding_function(Arc::new(CountingEmbedder::default()));

    let result = collection
        .query(&ctx(), &[&with_query_texts(["abc"])])
        .await
        .unwrap();

    let best = result.rows(0).next().unwrap();
    assert_eq!((best.id, best.score), ("a", Some(0.1)));

    let body = &transport.sent()[0].body;
    assert_eq!(body["query_embeddings"], json!([[3.0, 1.0]]));
    assert_eq!(body["n_results"], 10);
    assert_eq!(body["include"], json!(["documents", "metadatas", "distances"]));
    assert!(body.get("query_texts").is_none());
}

#[tokio::test]
async fn happy_query_explicit_options() {
    let transport = RecordingTransport::replying(json!({"ids": [[]]}));
    let collection = Collection::new("notes", transport.clone());

    collection
        .query(
            &ctx(),
            &[
                &collection_query::ops::with_query_embeddings([vec![0.25]]),
                &with_n_results(3),
                &with_include([Include::Embeddings]),
            ],
        )
        .await
        .unwrap();

    let body = &transport.sent()[0].body;
    assert_eq!(body["n_results"], 3);
    assert_eq!(body["include"], json!(["embeddings"]));
}

#[tokio::test]
async fn happy_search_sends_batch_with_folded_filter() {
    let transport = RecordingTransport::replying(json!({
        "ids": [["x", "y"]],
        "scores": [[0.9, 0.5]]
    }));
    let collection = Collection::new("docs", transport.clone());

    let result = collection
        .search(
            &ctx(),
            &[
                &with_ids(["x", "y"]),
                &with_where(WhereClause::ne("draft", true)),
                &with_rank(collection.knn("ownership").unwrap()),
                &with_limit(2),
            ],
        )
        .await
        .unwrap();
    assert_eq!(result.rows(0).count(), 2);

    let body = &transport.sent()[0].body;
    assert_eq!(
        body,
        &json!({"searches": [{
            "filter": {"$and": [{"#id": {"$in": ["x", "y"]}}, {"draft": {"$ne": true}}]},
            "rank": {"$knn": {"query": "ownership", "limit": 16}},
            "limit": {"limit": 2, "offset": 0}
        }]})
    );
}

#[tokio::test]
async fn happy_search_batch_of_two() {
    let transport = RecordingTransport::replying(json!({"ids": [["a"], ["b"]]}));
    let collection = Collection::new("docs", transport.clone());

    let first = SearchRequest::new();
    let mut second = SearchRequest::new();
    second.rank = Some(Knn::new("q").unwrap().into());

    let result = collection
        .search_batch(&ctx(), SearchBatch::new().push(first).push(second))
        .await
        .unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(transport.sent()[0].body["searches"][0], json!({}));
}

#[tokio::test]
async fn happy_delete_by_filter() {
    let transport = RecordingTransport::replying(json!(null));
    let collection = Collection::new("docs", transport.clone());

    collection
        .delete(&ctx(), &[&with_where(WhereClause::lt("year", 1990))])
        .await
        .unwrap();
    assert_eq!(
        transport.sent()[0].body,
        json!({"where": {"year": {"$lt": 1990}}})
    );
}

// =============================================================================
// Failure Scenarios
// =============================================================================

#[tokio::test]
async fn failure_cardinality_names_operation_and_field() {
    let transport = RecordingTransport::replying(json!({}));
    let collection = Collection::new("docs", transport.clone());

    let err = collection
        .add(
            &ctx(),
            &[
                &with_ids(["a", "b", "c"]),
                &with_documents(["1", "2", "3"]),
                &with_metadatas([Metadata::new(), Metadata::new()]),
            ],
        )
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("add: metadatas: "), "{err}");
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn failure_duplicate_ids_across_options() {
    let transport = RecordingTransport::replying(json!({}));
    let collection = Collection::new("docs", transport.clone());

    let err = collection
        .update(
            &ctx(),
            &[&with_ids(["id1", "id2"]), &with_ids(["id2", "id3"])],
        )
        .await
        .unwrap_err();

    assert!(matches!(err.root(), QueryError::DuplicateId(id) if id == "id2"));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn failure_missing_embedding_function() {
    let transport = RecordingTransport::replying(json!({}));
    let collection = Collection::new("docs", transport.clone());

    let err = collection
        .add(&ctx(), &[&with_ids(["a"]), &with_documents(["text"])])
        .await
        .unwrap_err();

    assert!(matches!(err.root(), QueryError::Dependency(_)));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn failure_embedding_error_stops_pipeline() {
    let transport = RecordingTransport::replying(json!({}));
    let collection =
        Collection::new("docs", transport.clone()).with_embedding_function(Arc::new(FailingEmbedder));

    let err = collection
        .query(&ctx(), &[&with_query_texts(["hello"])])
        .await
        .unwrap_err();

    assert!(matches!(err.root(), QueryError::Embedding(_)));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn failure_transport_error_is_wrapped() {
    let transport = RecordingTransport::failing();
    let collection = Collection::new("docs", transport.clone());

    let err = collection
        .delete(&ctx(), &[&with_ids(["a"])])
        .await
        .unwrap_err();

    assert!(matches!(err.root(), QueryError::Transport(_)));
    assert!(err.to_string().starts_with("delete: transport failed"));
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn failure_invalid_search_filter_surfaces_at_encode() {
    let transport = RecordingTransport::replying(json!({}));
    let collection = Collection::new("docs", transport.clone());

    let filter = SearchFilter::new().with_where(WhereClause::or(Vec::<WhereClause>::new()));
    let err = collection
        .search(&ctx(), &[&with_search_filter(filter)])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("invalid search filter: "), "{err}");
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn failure_batch_size_limit() {
    let transport = RecordingTransport::replying(json!({}));
    let config = ClientConfig {
        max_batch_size: Some(2),
        ..Default::default()
    };
    let collection = Collection::new("docs", transport.clone()).with_config(config);

    let err = collection
        .delete(&ctx(), &[&with_ids(["a", "b", "c"])])
        .await
        .unwrap_err();

    assert!(matches!(err.root(), QueryError::InvalidValue { field: "ids", .. }));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn failure_undecodable_response() {
    let transport = Arc::new(RecordingTransport::default());
    *transport.response.lock() = b"<html>".to_vec();
    let collection = Collection::new("docs", transport.clone());

    let err = collection.get(&ctx(), &[]).await.unwrap_err();
    assert!(matches!(err.root(), QueryError::Decode { what: "get", .. }));
}

#[tokio::test]
async fn failure_cancelled_send() {
    let collection = Collection::new("docs", Arc::new(HangingTransport));
    let (ctx, handle) = OperationContext::with_cancel();

    let task = tokio::spawn(async move { collection.get(&ctx, &[]).await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.cancel();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err.root(), QueryError::Cancelled("send")));
}

#[tokio::test(start_paused = true)]
async fn failure_deadline_exceeded() {
    let collection = Collection::new("docs", Arc::new(HangingTransport));
    let ctx = OperationContext::background().with_timeout(Duration::from_secs(1));

    let err = collection.get(&ctx, &[]).await.unwrap_err();
    assert!(matches!(err.root(), QueryError::DeadlineExceeded("send")));
}
