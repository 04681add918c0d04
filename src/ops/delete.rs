use serde::Serialize;

use super::fragments::{FilterFragment, IdList};
use super::options::{IdTarget, WhereDocumentTarget, WhereTarget};
use super::{CollectionOp, OperationKind, OptionTarget};
use crate::error::{QueryError, Result};
use crate::filter::{WhereClause, WhereDocumentFilter};

/// Delete records by id and/or filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionDeleteOp {
    #[serde(skip_serializing_if = "IdList::is_empty")]
    pub ids: IdList,
    #[serde(flatten)]
    pub filter: FilterFragment,
}

impl CollectionDeleteOp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionTarget for CollectionDeleteOp {}

impl CollectionOp for CollectionDeleteOp {
    fn kind(&self) -> OperationKind {
        OperationKind::Delete
    }

    fn prepare_and_validate(&mut self) -> Result<()> {
        // An unrestricted delete would wipe the collection
        if self.ids.is_empty() && self.filter.is_empty() {
            return Err(QueryError::structural(
                "delete requires ids or a where/where_document filter",
            ));
        }
        self.filter.validate()
    }

    fn batch_len(&self) -> Option<usize> {
        Some(self.ids.len())
    }
}

impl IdTarget for CollectionDeleteOp {
    fn append_ids(&mut self, ids: &[String]) -> Result<()> {
        self.ids.append(ids)
    }
}

impl WhereTarget for CollectionDeleteOp {
    fn set_where(&mut self, clause: WhereClause) {
        self.filter.where_clause = Some(clause);
    }
}

impl WhereDocumentTarget for CollectionDeleteOp {
    fn set_where_document(&mut self, filter: WhereDocumentFilter) {
        self.filter.where_document = Some(filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{with_ids, with_where_document};
    use serde_json::json;

    #[test]
    fn test_unrestricted_delete_rejected() {
        assert!(CollectionDeleteOp::new().prepare_and_validate().is_err());
    }

    #[test]
    fn test_delete_by_filter() {
        let mut op =
            CollectionDeleteOp::from_options(&[&with_where_document(WhereDocumentFilter::contains("tmp"))])
                .unwrap();
        op.prepare_and_validate().unwrap();
        assert_eq!(op.marshal().unwrap(), json!({"where_document": {"$contains": "tmp"}}));
    }

    #[test]
    fn test_delete_by_ids() {
        let mut op = CollectionDeleteOp::from_options(&[&with_ids(["a", "b"])]).unwrap();
        op.prepare_and_validate().unwrap();
        assert_eq!(op.batch_len(), Some(2));
        assert_eq!(op.marshal().unwrap(), json!({"ids": ["a", "b"]}));
    }
}
