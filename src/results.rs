// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Decoded responses.
//!
//! Servers return column-oriented results. Query and search responses are
//! ragged 2-D arrays (one inner array per query), and any column or inner
//! array may be `null` when it was not included. Every such `null` decodes to
//! an empty vector, so absent data is indistinguishable from no rows.
//!
//! ```text
//! {"ids": [["a", "b"], ["c"]], "documents": [null, ["third"]], "distances": null}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::embedding::Embedding;
use crate::error::{QueryError, Result};
use crate::metadata::Metadata;
use crate::ops::Include;

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn ragged<'de, D, T>(deserializer: D) -> std::result::Result<Vec<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let outer = Option::<Vec<Option<Vec<T>>>>::deserialize(deserializer)?;
    Ok(outer
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

/// Decode a response body, naming the operation on failure.
pub fn decode<T: DeserializeOwned>(what: &'static str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| QueryError::Decode { what, source })
}

/// One record of a result, borrowed from its columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row<'a> {
    pub id: &'a str,
    pub document: Option<&'a str>,
    pub metadata: Option<&'a Metadata>,
    pub embedding: Option<&'a [f32]>,
    pub uri: Option<&'a str>,
    /// Distance for queries, score for searches; `None` for gets.
    pub score: Option<f32>,
}

fn cell<T>(column: Option<&[Option<T>]>, index: usize) -> Option<&T> {
    column?.get(index)?.as_ref()
}

/// Column slices of one result set, turned into rows on demand.
#[derive(Clone, Copy)]
struct ColumnView<'a> {
    ids: &'a [String],
    documents: Option<&'a [Option<String>]>,
    metadatas: Option<&'a [Option<Metadata>]>,
    embeddings: Option<&'a [Option<Embedding>]>,
    uris: Option<&'a [Option<String>]>,
    scores: Option<&'a [Option<f32>]>,
}

impl<'a> ColumnView<'a> {
    fn row(self, i: usize) -> Row<'a> {
        Row {
            id: &self.ids[i],
            document: cell(self.documents, i).map(String::as_str),
            metadata: cell(self.metadatas, i),
            embedding: cell(self.embeddings, i).map(Vec::as_slice),
            uri: cell(self.uris, i).map(String::as_str),
            score: cell(self.scores, i).copied(),
        }
    }

    fn rows(self) -> impl Iterator<Item = Row<'a>> {
        (0..self.ids.len()).map(move |i| self.row(i))
    }
}

/// Response of a get.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GetResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub documents: Vec<Option<String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadatas: Vec<Option<Metadata>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub embeddings: Vec<Option<Embedding>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uris: Vec<Option<String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub include: Vec<Include>,
}

impl GetResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        ColumnView {
            ids: &self.ids,
            documents: Some(&self.documents),
            metadatas: Some(&self.metadatas),
            embeddings: Some(&self.embeddings),
            uris: Some(&self.uris),
            scores: None,
        }
        .rows()
    }
}

/// Response of a query; one result set per query embedding.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResult {
    #[serde(default, deserialize_with = "ragged")]
    pub ids: Vec<Vec<String>>,
    #[serde(default, deserialize_with = "ragged")]
    pub documents: Vec<Vec<Option<String>>>,
    #[serde(default, deserialize_with = "ragged")]
    pub metadatas: Vec<Vec<Option<Metadata>>>,
    #[serde(default, deserialize_with = "ragged")]
    pub embeddings: Vec<Vec<Option<Embedding>>>,
    #[serde(default, deserialize_with = "ragged")]
    pub uris: Vec<Vec<Option<String>>>,
    #[serde(default, deserialize_with = "ragged")]
    pub distances: Vec<Vec<Option<f32>>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub include: Vec<Include>,
}

impl QueryResult {
    /// Number of result sets (one per query).
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rows of the `query`-th result set, best match first. Empty when the
    /// index is out of range.
    pub fn rows(&self, query: usize) -> impl Iterator<Item = Row<'_>> {
        ColumnView {
            ids: self.ids.get(query).map(Vec::as_slice).unwrap_or_default(),
            documents: self.documents.get(query).map(Vec::as_slice),
            metadatas: self.metadatas.get(query).map(Vec::as_slice),
            embeddings: self.embeddings.get(query).map(Vec::as_slice),
            uris: self.uris.get(query).map(Vec::as_slice),
            scores: self.distances.get(query).map(Vec::as_slice),
        }
        .rows()
    }
}

/// Response of a search batch; one result set per search request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "ragged")]
    pub ids: Vec<Vec<String>>,
    #[serde(default, deserialize_with = "ragged")]
    pub documents: Vec<Vec<Option<String>>>,
    #[serde(default, deserialize_with = "ragged")]
    pub metadatas: Vec<Vec<Option<Metadata>>>,
    #[serde(default, deserialize_with = "ragged")]
    pub embeddings: Vec<Vec<Option<Embedding>>>,
    #[serde(default, deserialize_with = "ragged")]
    pub scores: Vec<Vec<Option<f32>>>,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn rows(&self, search: usize) -> impl Iterator<Item = Row<'_>> {
        ColumnView {
            ids: self.ids.get(search).map(Vec::as_slice).unwrap_or_default(),
            documents: self.documents.get(search).map(Vec::as_slice),
            metadatas: self.metadatas.get(search).map(Vec::as_slice),
            embeddings: self.embeddings.get(search).map(Vec::as_slice),
            uris: None,
            scores: self.scores.get(search).map(Vec::as_slice),
        }
        .rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_result_tolerates_null_columns() {
        let result: GetResult = decode(
            "get",
            br#"{"ids": ["a", "b"], "documents": ["one", null], "metadatas": null, "embeddings": null}"#,
        )
        .unwrap();

        let rows: Vec<_> = result.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].document, Some("one"));
        assert_eq!(rows[1].document, None);
        assert!(rows[0].metadata.is_none());
    }

    #[test]
    fn test_query_result_ragged_with_null_inner_arrays() {
        let result: QueryResult = decode(
            "query",
            br#"{
                "ids": [["a", "b"], ["c"]],
                "documents": [null, ["third"]],
                "distances": [[0.1, 0.2], null],
                "metadatas": null
            }"#,
        )
        .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.documents[0], Vec::<Option<String>>::new());

        let first: Vec<_> = result.rows(0).collect();
        assert_eq!(first[1].id, "b");
        assert_eq!(first[1].score, Some(0.2));
        assert_eq!(first[1].document, None);

        let second: Vec<_> = result.rows(1).collect();
        assert_eq!(second[0].document, Some("third"));
        assert_eq!(second[0].score, None);

        assert_eq!(result.rows(7).count(), 0);
    }

    #[test]
    fn test_search_result_scores() {
        let result: SearchResult =
            decode("search", br#"{"ids": [["x"]], "scores": [[0.75]]}"#).unwrap();
        let row = result.rows(0).next().unwrap();
        assert_eq!((row.id, row.score), ("x", Some(0.75)));
    }

    #[test]
    fn test_decode_error_names_operation() {
        let err = decode::<GetResult>("get", b"not json").unwrap_err();
        assert!(err.to_string().starts_with("failed to decode get response"));
    }

    #[test]
    fn test_empty_object_decodes() {
        let result: QueryResult = decode("query", b"{}").unwrap();
        assert!(result.is_empty());
    }
}
