use serde::Serialize;

use super::fragments::{FilterFragment, IdList, Include, LimitOffset, Sort};
use super::options::{IdTarget, IncludeTarget, PageTarget, WhereDocumentTarget, WhereTarget};
use super::{CollectionOp, OperationKind, OptionTarget};
use crate::error::{QueryError, Result};
use crate::filter::{WhereClause, WhereDocumentFilter};

/// Fetch records by id and/or filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionGetOp {
    #[serde(skip_serializing_if = "IdList::is_empty")]
    pub ids: IdList,
    #[serde(flatten)]
    pub filter: FilterFragment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<Include>>,
    #[serde(flatten)]
    pub page: LimitOffset,
    #[serde(skip)]
    pub sort: Option<Sort>,
}

impl CollectionGetOp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionTarget for CollectionGetOp {}

impl CollectionOp for CollectionGetOp {
    fn kind(&self) -> OperationKind {
        OperationKind::Get
    }

    fn prepare_and_validate(&mut self) -> Result<()> {
        self.filter.validate()?;
        self.page.validate()?;
        if self.sort.is_some() {
            return Err(QueryError::structural("sort is not supported by the server yet").context("sort"));
        }
        Ok(())
    }
}

impl IdTarget for CollectionGetOp {
    fn append_ids(&mut self, ids: &[String]) -> Result<()> {
        self.ids.append(ids)
    }
}

impl WhereTarget for CollectionGetOp {
    fn set_where(&mut self, clause: WhereClause) {
        self.filter.where_clause = Some(clause);
    }
}

impl WhereDocumentTarget for CollectionGetOp {
    fn set_where_document(&mut self, filter: WhereDocumentFilter) {
        self.filter.where_document = Some(filter);
    }
}

impl IncludeTarget for CollectionGetOp {
    fn set_include(&mut self, include: Vec<Include>) {
        self.include = Some(include);
    }
}

impl PageTarget for CollectionGetOp {
    fn set_limit(&mut self, limit: usize) {
        self.page.limit = Some(limit);
    }

    fn set_offset(&mut self, offset: usize) {
        self.page.offset = Some(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{with_ids, with_include, with_limit, with_offset, with_sort, with_where};
    use serde_json::json;

    #[test]
    fn test_empty_get_encodes_empty_object() {
        let mut op = CollectionGetOp::new();
        op.prepare_and_validate().unwrap();
        assert_eq!(op.marshal().unwrap(), json!({}));
    }

    #[test]
    fn test_get_body() {
        let mut op = CollectionGetOp::from_options(&[
            &with_ids(["a"]),
            &with_where(WhereClause::eq("lang", "en")),
            &with_include([Include::Documents]),
            &with_limit(5),
            &with_offset(10),
        ])
        .unwrap();
        op.prepare_and_validate().unwrap();
        assert_eq!(
            op.marshal().unwrap(),
            json!({
                "ids": ["a"],
                "where": {"lang": {"$eq": "en"}},
                "include": ["documents"],
                "limit": 5,
                "offset": 10
            })
        );
    }

    #[test]
    fn test_invalid_where_fails_validation() {
        let mut op = CollectionGetOp::from_options(&[&with_where(WhereClause::and(Vec::<WhereClause>::new()))])
            .unwrap();
        let err = op.prepare_and_validate().unwrap_err();
        assert!(matches!(err.root(), QueryError::Arity { .. }));
        assert!(err.to_string().starts_with("where: "));
    }

    #[test]
    fn test_sort_is_reserved() {
        let mut op = CollectionGetOp::from_options(&[&with_sort(Sort::desc("year"))]).unwrap();
        assert!(op.prepare_and_validate().is_err());
    }
}
