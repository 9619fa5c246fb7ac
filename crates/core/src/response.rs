//! The terminal artifact one search request produces.

use serde::{Deserialize, Serialize};

use crate::decision::Classification;

/// A cited source in the final response, in evidence order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,

    /// Evidence content truncated for display.
    pub snippet: String,
}

/// What the search entry point returns to the caller.
///
/// Assembled once per request and never mutated after return. `error` is
/// set only when the request ran in a degraded mode the caller should be
/// able to distinguish (e.g. the search backend was unreachable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAgentResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub classification: Classification,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::QueryType;

    #[test]
    fn error_tag_omitted_from_json_when_absent() {
        let response = SearchAgentResponse {
            answer: "Paris is the capital of France. [1]".into(),
            sources: vec![SourceRef {
                title: "Paris".into(),
                url: "https://en.wikipedia.org/wiki/Paris".into(),
                snippet: "Capital of France...".into(),
            }],
            classification: Classification {
                skip_search: false,
                standalone_query: "capital of France".into(),
                sources: vec!["web".into()],
                reasoning: "factual lookup".into(),
                query_type: QueryType::Factual,
            },
            error: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("\"error\""));
    }
}
