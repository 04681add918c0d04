// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Rank expressions - how search candidates are scored
//!
//! ```text
//! {"$knn": {"query": "rust", "key": "#embedding", "limit": 16}}
//! {"$rrf": {"ranks": [{"rank": {"$knn": ...}, "weight": 0.7}, ...], "k": 60}}
//! ```
//!
//! Weights are attached to a copy of a [`Knn`] with [`Knn::with_weight`], so
//! one base rank can be fused several times with different weights.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::embedding::Embedding;
use crate::error::{QueryError, Result};
use crate::key::Key;

/// Text or vector input of a nearest-neighbour rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KnnQuery {
    Text(String),
    Vector(Embedding),
}

impl KnnQuery {
    pub fn is_empty(&self) -> bool {
        match self {
            KnnQuery::Text(text) => text.is_empty(),
            KnnQuery::Vector(vector) => vector.is_empty(),
        }
    }

    fn check(&self) -> Result<()> {
        if self.is_empty() {
            return Err(QueryError::invalid_value("knn query", "must not be empty"));
        }
        if let KnnQuery::Vector(vector) = self {
            if let Some(i) = vector.iter().position(|v| !v.is_finite()) {
                return Err(QueryError::invalid_value(
                    "knn query",
                    format!("component {i} is not a finite number"),
                ));
            }
        }
        Ok(())
    }
}

impl From<&str> for KnnQuery {
    fn from(text: &str) -> Self {
        KnnQuery::Text(text.to_string())
    }
}

impl From<String> for KnnQuery {
    fn from(text: String) -> Self {
        KnnQuery::Text(text)
    }
}

impl From<Embedding> for KnnQuery {
    fn from(vector: Embedding) -> Self {
        KnnQuery::Vector(vector)
    }
}

/// Nearest-neighbour scoring over one embedding key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Knn {
    query: KnnQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<Key>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    default_score: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    return_rank: bool,
    #[serde(skip)]
    weight: Option<f64>,
}

impl Knn {
    /// Rejects an empty text query and an empty or non-finite vector.
    pub fn new(query: impl Into<KnnQuery>) -> Result<Self> {
        let query = query.into();
        query.check()?;
        Ok(Self {
            query,
            key: None,
            limit: None,
            default_score: None,
            return_rank: false,
            weight: None,
        })
    }

    /// Candidate count; must be positive.
    pub fn limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(QueryError::invalid_value("knn limit", "must be greater than 0"));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    /// Score given to documents outside the candidate set; must be finite.
    pub fn default_score(mut self, score: f64) -> Result<Self> {
        if !score.is_finite() {
            return Err(QueryError::invalid_value(
                "knn default",
                format!("{score} is not a finite number"),
            ));
        }
        self.default_score = Some(score);
        Ok(self)
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn return_rank(mut self, return_rank: bool) -> Self {
        self.return_rank = return_rank;
        self
    }

    /// A weighted copy for use inside an [`Rrf`]; `self` is left untouched.
    #[must_use]
    pub fn with_weight(&self, weight: f64) -> Self {
        Self {
            weight: Some(weight),
            ..self.clone()
        }
    }

    pub fn query(&self) -> &KnnQuery {
        &self.query
    }

    pub fn weight(&self) -> Option<f64> {
        self.weight
    }

    pub fn validate(&self) -> Result<()> {
        self.query.check()?;
        if self.limit == Some(0) {
            return Err(QueryError::invalid_value("knn limit", "must be greater than 0"));
        }
        if matches!(&self.key, Some(key) if key.is_empty()) {
            return Err(QueryError::structural("knn key must not be empty"));
        }
        if let Some(score) = self.default_score.filter(|s| !s.is_finite()) {
            return Err(QueryError::invalid_value(
                "knn default",
                format!("{score} is not a finite number"),
            ));
        }
        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(QueryError::invalid_value(
                    "knn weight",
                    format!("{weight} is not a finite non-negative number"),
                ));
            }
        }
        Ok(())
    }
}

/// Reciprocal rank fusion over weighted [`Knn`] ranks.
#[derive(Debug, Clone, PartialEq)]
pub struct Rrf {
    ranks: Vec<Knn>,
    k: i32,
    normalize: bool,
}

impl Rrf {
    /// Requires at least one rank and `k > 0`.
    pub fn new(ranks: impl IntoIterator<Item = Knn>, k: i32) -> Result<Self> {
        let rrf = Self {
            ranks: ranks.into_iter().collect(),
            k,
            normalize: false,
        };
        rrf.validate()?;
        Ok(rrf)
    }

    /// Normalize weights to sum to 1 on the server.
    #[must_use]
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn ranks(&self) -> &[Knn] {
        &self.ranks
    }

    pub fn k(&self) -> i32 {
        self.k
    }

    pub fn validate(&self) -> Result<()> {
        if self.ranks.is_empty() {
            return Err(QueryError::arity("$rrf", "rank"));
        }
        if self.k <= 0 {
            return Err(QueryError::invalid_value(
                "k",
                format!("must be greater than 0, got {}", self.k),
            ));
        }
        for (i, rank) in self.ranks.iter().enumerate() {
            rank.validate().map_err(|e| e.context(format!("$rrf ranks[{i}]")))?;
        }
        Ok(())
    }
}

/// `{"$knn": {...}}` wrapper for a rank nested inside `$rrf`.
struct TaggedKnn<'a>(&'a Knn);

impl Serialize for TaggedKnn<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$knn", self.0)?;
        map.end()
    }
}

#[derive(Serialize)]
struct WeightedRank<'a> {
    rank: TaggedKnn<'a>,
    weight: f64,
}

#[derive(Serialize)]
struct RrfBody<'a> {
    ranks: Vec<WeightedRank<'a>>,
    k: i32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    normalize: bool,
}

impl Serialize for Rrf {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RrfBody {
            ranks: self
                .ranks
                .iter()
                .map(|knn| WeightedRank {
                    rank: TaggedKnn(knn),
                    weight: knn.weight.unwrap_or(1.0),
                })
                .collect(),
            k: self.k,
            normalize: self.normalize,
        }
        .serialize(serializer)
    }
}

/// Scoring expression of a search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Rank {
    #[serde(rename = "$knn")]
    Knn(Knn),
    #[serde(rename = "$rrf")]
    Rrf(Rrf),
}

impl Rank {
    pub fn validate(&self) -> Result<()> {
        match self {
            Rank::Knn(knn) => knn.validate(),
            Rank::Rrf(rrf) => rrf.validate(),
        }
    }
}

impl From<Knn> for Rank {
    fn from(knn: Knn) -> Self {
        Rank::Knn(knn)
    }
}

impl From<Rrf> for Rank {
    fn from(rrf: Rrf) -> Self {
        Rank::Rrf(rrf)
    }
}
