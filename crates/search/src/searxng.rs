//! SearXNG metasearch client.
//!
//! Speaks SearXNG's JSON API (`GET /search?q=...&format=json`) and
//! normalizes its result shape into [`SearchResult`] records.

use async_trait::async_trait;
use lodestar_core::error::SearchError;
use lodestar_core::search::{EvidenceSource, SearchResponse, SearchResult};
use serde::Deserialize;
use tracing::{debug, warn};

/// Client for a SearXNG instance.
pub struct SearxngClient {
    /// Full search endpoint URL, e.g. "http://localhost:4000/search".
    endpoint: String,
    language: String,
    client: reqwest::Client,
}

impl SearxngClient {
    pub fn new(base_url: &str, language: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: normalize_endpoint(base_url),
            language: language.into(),
            client,
        }
    }
}

/// Accept both bare instance URLs and full /search endpoints.
fn normalize_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/search") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/search")
    }
}

#[async_trait]
impl EvidenceSource for SearxngClient {
    fn name(&self) -> &str {
        "searxng"
    }

    async fn search(
        &self,
        query: &str,
        categories: Option<&[String]>,
        max_results: usize,
    ) -> std::result::Result<SearchResponse, SearchError> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("language", self.language.clone()),
            ("pageno", "1".to_string()),
        ];
        if let Some(cats) = categories {
            if !cats.is_empty() {
                params.push(("categories", cats.join(",")));
            }
        }

        debug!(query, categories = ?categories, "Querying SearXNG");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "SearXNG returned an error");
            return Err(SearchError::Http {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: SearxngResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let results = body
            .results
            .into_iter()
            .take(max_results)
            .map(SearxngResult::into_result)
            .collect();

        Ok(SearchResponse {
            results,
            suggestions: body.suggestions,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngResult>,
    #[serde(default)]
    suggestions: Vec<String>,
}

/// SearXNG's per-result shape. Engines disagree on which fields they
/// fill in, and several use empty strings rather than omitting fields.
#[derive(Debug, Deserialize)]
struct SearxngResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    img_src: Option<String>,
    #[serde(default)]
    thumbnail_src: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    engine: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl SearxngResult {
    fn into_result(self) -> SearchResult {
        SearchResult {
            title: self.title,
            url: self.url,
            content: self.content,
            image_url: non_empty(self.img_src),
            thumbnail_url: non_empty(self.thumbnail_src),
            author: non_empty(self.author),
            engine_name: non_empty(self.engine),
        }
    }
}
