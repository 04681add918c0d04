use crate::embedding::Embedding;
use crate::error::{QueryError, Result};
use crate::metadata::Metadata;

/// One row of an add or upsert, carried as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub id: String,
    pub document: Option<String>,
    pub embedding: Option<Embedding>,
    pub metadata: Option<Metadata>,
    pub uri: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// A record needs an id and either a document or an embedding.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(QueryError::structural("record id must not be empty"));
        }
        if self.document.is_none() && self.embedding.is_none() {
            return Err(QueryError::structural(format!(
                "record '{}' needs a document or an embedding",
                self.id
            )));
        }
        if matches!(&self.embedding, Some(e) if e.is_empty()) {
            return Err(QueryError::invalid_value(
                "embedding",
                format!("record '{}' has an empty vector", self.id),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_needs_content() {
        assert!(Record::new("a").validate().is_err());
        assert!(Record::new("a").with_document("text").validate().is_ok());
        assert!(Record::new("a").with_embedding(vec![0.5]).validate().is_ok());
    }

    #[test]
    fn test_record_rejects_empty_id_and_vector() {
        assert!(Record::new("").with_document("x").validate().is_err());
        assert!(Record::new("a").with_embedding(vec![]).validate().is_err());
    }
}
