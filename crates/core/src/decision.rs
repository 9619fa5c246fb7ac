//! Structured decisions extracted from free-form model output.
//!
//! Models are instructed to answer in JSON but routinely wrap the object in
//! markdown fences or surround it with prose. `parse_decision` peels the
//! first fenced block off before parsing, and serde defaults fill any
//! missing fields, so a caller either gets a usable decision value or a
//! single `ExtractionFailed` error to apply its own fallback to.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::DecisionError;

/// Extract and parse a JSON decision object from raw model output.
///
/// Prefers a ```` ```json ```` fenced block, then any fenced block, then
/// the whole trimmed text. Never panics; a body that is not valid JSON
/// for `T` yields `ExtractionFailed`.
pub fn parse_decision<T: DeserializeOwned>(raw: &str) -> Result<T, DecisionError> {
    let body = extract_json_body(raw);
    serde_json::from_str(body).map_err(|e| DecisionError::ExtractionFailed(e.to_string()))
}

fn extract_json_body(raw: &str) -> &str {
    let trimmed = raw.trim();

    if let Some(body) = fenced_block(trimmed, "```json") {
        return body;
    }
    if let Some(body) = fenced_block(trimmed, "```") {
        return body;
    }
    trimmed
}

/// Content of the first complete fenced block opened by `fence`, if any.
fn fenced_block<'a>(text: &'a str, fence: &str) -> Option<&'a str> {
    let start = text.find(fence)? + fence.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Coarse category assigned to a query by the classifier.
///
/// Unknown strings from the model decay to `Factual` rather than failing
/// extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Conversational,
    Computational,
    Navigation,
    #[default]
    #[serde(other)]
    Factual,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Factual => "factual",
            QueryType::Conversational => "conversational",
            QueryType::Computational => "computational",
            QueryType::Navigation => "navigation",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the classifier model is asked to return.
///
/// Every field is optional on the wire; absent fields take these defaults
/// and the classifier substitutes request-level values for the empty ones.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationDecision {
    #[serde(default)]
    pub skip_search: bool,

    #[serde(default)]
    pub standalone_query: String,

    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub reasoning: String,

    #[serde(default)]
    pub query_type: QueryType,
}

/// The classifier's final verdict for one request.
///
/// Invariant: `sources` is a subset of the sources the caller enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub skip_search: bool,
    pub standalone_query: String,
    pub sources: Vec<String>,
    pub reasoning: String,
    pub query_type: QueryType,
}

/// What the refinement-loop model is asked to return each iteration.
#[derive(Debug, Clone, Deserialize)]
pub struct RefinementDecision {
    #[serde(default)]
    pub done: bool,

    #[serde(default)]
    pub follow_up_query: String,

    #[serde(default)]
    pub reasoning: String,
}
