//! EvidenceSource trait — the abstraction over search backends.
//!
//! An EvidenceSource answers a query with normalized result records. The
//! pipeline treats `url` as the identity of a result: two results with the
//! same url are the same evidence item no matter which source produced them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::SearchError;

/// A single normalized search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,

    /// Deduplication key across all sources.
    pub url: String,

    /// Snippet text used as grounding evidence.
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Which engine the backend attributed this result to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_name: Option<String>,
}

impl SearchResult {
    /// A result with only the fields every backend fills in.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
            image_url: None,
            thumbnail_url: None,
            author: None,
            engine_name: None,
        }
    }
}

/// What one search call returns on success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,

    /// Query suggestions offered by the backend, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// The core EvidenceSource trait.
///
/// `categories` narrows the search to backend-specific verticals (e.g.
/// "science"); `None` means a plain web search.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// A human-readable name for this source (e.g., "searxng").
    fn name(&self) -> &str;

    async fn search(
        &self,
        query: &str,
        categories: Option<&[String]>,
        max_results: usize,
    ) -> std::result::Result<SearchResponse, SearchError>;
}
