// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Add and upsert builder.
//!
//! Both operations share one body shape; only [`OperationKind`] differs.
//! Ids come from one of three sources, checked in `prepare_and_validate`:
//!
//! | Source | How |
//! |--------|-----|
//! | explicit | `with_ids` |
//! | records | `with_records` (id taken from each record) |
//! | generator | `with_id_generator`, used only when no ids were given |

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::fragments::{Columns, IdList};
use super::options::{ColumnTarget, IdTarget};
use super::record::Record;
use super::{CollectionOp, Embeddable, OperationKind, OptionTarget};
use crate::context::OperationContext;
use crate::embedding::{EmbeddingFunction, IdGenerator, IdInput};
use crate::error::{QueryError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct CollectionAddOp {
    #[serde(skip)]
    kind: OperationKind,
    pub ids: IdList,
    #[serde(flatten)]
    pub columns: Columns,
    #[serde(skip)]
    pub id_generator: Option<Arc<dyn IdGenerator>>,
}

impl Default for CollectionAddOp {
    fn default() -> Self {
        Self::add()
    }
}

impl CollectionAddOp {
    pub fn add() -> Self {
        Self::with_kind(OperationKind::Add)
    }

    pub fn upsert() -> Self {
        Self::with_kind(OperationKind::Upsert)
    }

    fn with_kind(kind: OperationKind) -> Self {
        Self {
            kind,
            ids: IdList::new(),
            columns: Columns::default(),
            id_generator: None,
        }
    }

    /// Append the ids and columns of already validated records.
    ///
    /// Records extend the id list and the columns row by row, so both must
    /// already line up, and every record must carry the same optional fields
    /// as the rows before it. On error nothing is appended.
    pub(crate) fn push_records(&mut self, records: &[Record]) -> Result<()> {
        let mut ids = self.ids.clone();
        ids.append(records.iter().map(|r| r.id.as_str()))?;
        self.check_record_shape(records)?;
        self.ids = ids;

        let columns = &mut self.columns;
        for record in records {
            if let Some(document) = &record.document {
                columns.documents.push(document.clone());
            }
            if let Some(embedding) = &record.embedding {
                columns.embeddings.push(embedding.clone());
            }
            if let Some(metadata) = &record.metadata {
                columns.metadatas.push(metadata.clone());
            }
            if let Some(uri) = &record.uri {
                columns.uris.push(uri.clone());
            }
        }
        Ok(())
    }

    fn check_record_shape(&self, records: &[Record]) -> Result<()> {
        let rows = self.ids.len();
        self.columns.check_parity(rows)?;

        let columns = &self.columns;
        // Which columns the existing rows populate; unknown until the first row
        let mut present = (rows > 0).then(|| {
            [
                !columns.documents.is_empty(),
                !columns.embeddings.is_empty(),
                !columns.metadatas.is_empty(),
                !columns.uris.is_empty(),
            ]
        });

        for record in records {
            let fields = [
                record.document.is_some(),
                record.embedding.is_some(),
                record.metadata.is_some(),
                record.uri.is_some(),
            ];
            let expected = *present.get_or_insert(fields);
            let names = ["documents", "embeddings", "metadatas", "uris"];
            for ((name, has), want) in names.into_iter().zip(fields).zip(expected) {
                if has != want {
                    let verb = if want { "lacks" } else { "has" };
                    return Err(QueryError::structural(format!(
                        "record '{}' {verb} {name} unlike the rows before it",
                        record.id
                    )));
                }
            }
        }
        Ok(())
    }

    fn generate_ids(&mut self, generator: &dyn IdGenerator) -> Result<()> {
        let rows = self.columns.row_count();
        let generated: Vec<String> = (0..rows)
            .map(|index| {
                generator.generate(IdInput {
                    index,
                    document: self.columns.documents.get(index).map(String::as_str),
                })
            })
            .collect();

        debug!(kind = %self.kind, count = generated.len(), "Generated ids");
        self.ids.append(generated).map_err(|e| e.context("generated ids"))
    }
}

impl OptionTarget for CollectionAddOp {}

impl CollectionOp for CollectionAddOp {
    fn kind(&self) -> OperationKind {
        self.kind
    }

    fn prepare_and_validate(&mut self) -> Result<()> {
        if self.columns.documents.is_empty() && self.columns.embeddings.is_empty() {
            return Err(QueryError::structural(format!(
                "{} requires documents or embeddings",
                self.kind
            )));
        }

        if self.ids.is_empty() {
            let Some(generator) = self.id_generator.clone() else {
                return Err(QueryError::structural(
                    "no id source: pass ids, records or an id generator",
                ));
            };
            self.generate_ids(generator.as_ref())?;
        }

        self.columns.check_parity(self.ids.len())
    }

    fn batch_len(&self) -> Option<usize> {
        Some(self.ids.len())
    }
}

#[async_trait]
impl Embeddable for CollectionAddOp {
    async fn embed_data(
        &mut self,
        ctx: &OperationContext,
        embedding_fn: Option<&dyn EmbeddingFunction>,
    ) -> Result<()> {
        self.columns.embed_missing(ctx, embedding_fn).await
    }
}

impl IdTarget for CollectionAddOp {
    fn append_ids(&mut self, ids: &[String]) -> Result<()> {
        self.ids.append(ids)
    }
}

impl ColumnTarget for CollectionAddOp {
    fn columns_mut(&mut self) -> &mut Columns {
        &mut self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{metadata, Metadata};
    use crate::ops::{
        with_documents, with_embeddings, with_id_generator, with_ids, with_metadatas, with_records,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct SequentialIds(AtomicUsize);

    impl IdGenerator for SequentialIds {
        fn generate(&self, _input: IdInput<'_>) -> String {
            format!("gen-{}", self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    #[derive(Debug)]
    struct ConstantId;

    impl IdGenerator for ConstantId {
        fn generate(&self, _input: IdInput<'_>) -> String {
            "same".into()
        }
    }

    #[test]
    fn test_metadatas_cardinality_mismatch() {
        let mut op = CollectionAddOp::from_options(&[
            &with_ids(["a", "b", "c"]),
            &with_documents(["1", "2", "3"]),
            &with_metadatas([Metadata::new(), Metadata::new()]),
        ])
        .unwrap();
        let err = op.prepare_and_validate().unwrap_err();
        assert!(matches!(err.root(), QueryError::Cardinality { field: "metadatas", .. }));
        assert!(err.to_string().contains("metadatas"));
    }

    #[test]
    fn test_requires_id_source() {
        let mut op = CollectionAddOp::from_options(&[&with_documents(["x"])]).unwrap();
        assert!(matches!(op.prepare_and_validate(), Err(QueryError::Structural(_))));
    }

    #[test]
    fn test_requires_documents_or_embeddings() {
        let mut op = CollectionAddOp::from_options(&[&with_ids(["a"])]).unwrap();
        assert!(op.prepare_and_validate().is_err());
    }

    #[test]
    fn test_generator_fills_ids() {
        let mut op = CollectionAddOp::from_options(&[
            &with_id_generator(Arc::new(SequentialIds::default())),
            &with_documents(["one", "two"]),
        ])
        .unwrap();
        op.prepare_and_validate().unwrap();
        assert_eq!(op.ids.as_slice(), ["gen-0", "gen-1"]);
    }

    #[test]
    fn test_generator_ignored_with_explicit_ids() {
        let mut op = CollectionAddOp::from_options(&[
            &with_id_generator(Arc::new(SequentialIds::default())),
            &with_ids(["mine"]),
            &with_embeddings([vec![0.1, 0.2]]),
        ])
        .unwrap();
        op.prepare_and_validate().unwrap();
        assert_eq!(op.ids.as_slice(), ["mine"]);
    }

    #[test]
    fn test_generator_duplicates_detected() {
        let mut op = CollectionAddOp::from_options(&[
            &with_id_generator(Arc::new(ConstantId)),
            &with_documents(["one", "two"]),
        ])
        .unwrap();
        let err = op.prepare_and_validate().unwrap_err();
        assert!(matches!(err.root(), QueryError::DuplicateId(id) if id == "same"));
    }

    #[test]
    fn test_records_are_an_id_source() {
        let mut op = CollectionAddOp::from_options(&[&with_records([
            Record::new("r1")
                .with_document("first")
                .with_metadata(metadata([("n", 1)])),
            Record::new("r2")
                .with_document("second")
                .with_metadata(metadata([("n", 2)])),
        ])])
        .unwrap();
        op.prepare_and_validate().unwrap();
        assert_eq!(
            op.marshal().unwrap(),
            json!({
                "ids": ["r1", "r2"],
                "documents": ["first", "second"],
                "metadatas": [{"n": 1}, {"n": 2}]
            })
        );
    }

    #[test]
    fn test_record_ids_checked_against_explicit_ids() {
        let err = CollectionAddOp::from_options(&[
            &with_ids(["r1"]),
            &with_records([Record::new("r1").with_document("dup")]),
        ])
        .unwrap_err();
        assert!(matches!(err.root(), QueryError::DuplicateId(_)));
    }

    #[test]
    fn test_records_after_unaligned_column_rejected() {
        let err = CollectionAddOp::from_options(&[
            &with_documents(["doc-for-y"]),
            &with_records([Record::new("x").with_document("doc-for-x")]),
            &with_ids(["y"]),
        ])
        .unwrap_err();
        assert!(matches!(
            err.root(),
            QueryError::Cardinality { field: "documents", expected: 0, actual: 1 }
        ));
        assert!(err.to_string().starts_with("records: documents: "), "{err}");
    }

    #[test]
    fn test_records_after_ids_without_column_rejected() {
        let mut op = CollectionAddOp::from_options(&[&with_ids(["y"])]).unwrap();
        let err = op
            .apply(&with_records([Record::new("x").with_document("doc-for-x")]))
            .unwrap_err();
        assert!(err.to_string().contains("record 'x' has documents"), "{err}");
        assert_eq!(op.ids.as_slice(), ["y"]);
        assert!(op.columns.is_empty());
    }

    #[test]
    fn test_records_with_partial_metadata_name_the_record() {
        let err = CollectionAddOp::from_options(&[&with_records([
            Record::new("r1")
                .with_document("first")
                .with_metadata(metadata([("n", 1)])),
            Record::new("r2").with_document("second"),
        ])])
        .unwrap_err();
        assert!(matches!(err.root(), QueryError::Structural(_)));
        assert!(err.to_string().contains("record 'r2' lacks metadatas"), "{err}");
    }

    #[test]
    fn test_records_extend_aligned_columns() {
        let mut op = CollectionAddOp::from_options(&[
            &with_ids(["a"]),
            &with_documents(["doc-a"]),
            &with_records([Record::new("b").with_document("doc-b")]),
        ])
        .unwrap();
        op.prepare_and_validate().unwrap();
        assert_eq!(
            op.marshal().unwrap(),
            json!({"ids": ["a", "b"], "documents": ["doc-a", "doc-b"]})
        );
    }

    #[test]
    fn test_upsert_kind() {
        assert_eq!(CollectionAddOp::upsert().kind(), OperationKind::Upsert);
        assert_eq!(CollectionAddOp::default().kind(), OperationKind::Add);
    }
}
