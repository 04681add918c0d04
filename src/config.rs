//! Client-side defaults for building operations.
//!
//! # Example
//!
//! ```
//! use collection_query::ClientConfig;
//!
//! // Minimal config (uses defaults)
//! let config = ClientConfig::default();
//! assert_eq!(config.default_n_results, 10);
//!
//! // Cap write batches
//! let config = ClientConfig {
//!     max_batch_size: Some(500),
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

use crate::ops::Include;

/// Limit a [`crate::Page`] starts with.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Configuration for a [`crate::Collection`].
///
/// All fields have defaults, so an empty document deserializes to
/// [`ClientConfig::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    /// Limit of pages built by `Collection::page` (default: 10)
    #[serde(default = "default_page_limit")]
    pub default_page_limit: usize,

    /// Result count for queries without `with_n_results` (default: 10)
    #[serde(default = "default_n_results")]
    pub default_n_results: usize,

    /// Candidate limit for `Knn` ranks built through the config (default: 16)
    #[serde(default = "default_knn_limit")]
    pub default_knn_limit: usize,

    /// RRF smoothing constant (default: 60)
    #[serde(default = "default_rrf_k")]
    pub default_rrf_k: i32,

    /// Largest id list a single add/upsert/update/delete may carry
    #[serde(default)]
    pub max_batch_size: Option<usize>,

    /// Projection for gets without `with_include`
    #[serde(default = "default_get_include")]
    pub get_include: Vec<Include>,

    /// Projection for queries without `with_include`
    #[serde(default = "default_query_include")]
    pub query_include: Vec<Include>,
}

fn default_page_limit() -> usize { DEFAULT_PAGE_LIMIT }
fn default_n_results() -> usize { 10 }
fn default_knn_limit() -> usize { 16 }
fn default_rrf_k() -> i32 { 60 }
fn default_get_include() -> Vec<Include> { vec![Include::Documents, Include::Metadatas] }
fn default_query_include() -> Vec<Include> {
    vec![Include::Documents, Include::Metadatas, Include::Distances]
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_page_limit: default_page_limit(),
            default_n_results: default_n_results(),
            default_knn_limit: default_knn_limit(),
            default_rrf_k: default_rrf_k(),
            max_batch_size: None,
            get_include: default_get_include(),
            query_include: default_query_include(),
        }
    }
}
