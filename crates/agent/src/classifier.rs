//! Query classifier.
//!
//! One model call per request decides whether to search at all, which
//! sources to use, and how to rewrite the query so it stands alone
//! without the surrounding conversation. The classifier never fails
//! outward: any model or extraction failure collapses to a fixed
//! search-everything fallback.

use lodestar_core::decision::{parse_decision, Classification, ClassificationDecision, QueryType};
use lodestar_core::message::ChatMessage;
use lodestar_core::provider::GenerateRequest;
use lodestar_providers::ResolvedModel;
use tracing::{debug, warn};

const CLASSIFIER_TEMPERATURE: f32 = 0.1;
const HISTORY_WINDOW: usize = 3;

pub struct Classifier {
    model: ResolvedModel,
}

impl Classifier {
    pub fn new(model: ResolvedModel) -> Self {
        Self { model }
    }

    /// Classify a query against the enabled sources.
    ///
    /// Invariant on return: `sources` is a non-strict subset of
    /// `enabled_sources`, and is non-empty whenever `skip_search` is false.
    pub async fn classify(
        &self,
        query: &str,
        chat_history: &[ChatMessage],
        enabled_sources: &[String],
    ) -> Classification {
        let prompt = build_prompt(query, chat_history, enabled_sources);

        let request = GenerateRequest::new(
            &self.model.model,
            vec![
                ChatMessage::system(
                    "You are a helpful assistant that responds only in valid JSON format.",
                ),
                ChatMessage::user(prompt),
            ],
        )
        .with_temperature(CLASSIFIER_TEMPERATURE);

        let decision = match self.model.provider.generate(request).await {
            Ok(response) => match parse_decision::<ClassificationDecision>(&response.content) {
                Ok(decision) => decision,
                Err(e) => {
                    warn!(error = %e, "Classification extraction failed, using defaults");
                    return fallback(query, enabled_sources);
                }
            },
            Err(e) => {
                warn!(error = %e, "Classification model call failed, using defaults");
                return fallback(query, enabled_sources);
            }
        };

        let standalone_query = if decision.standalone_query.is_empty() {
            query.to_string()
        } else {
            decision.standalone_query
        };

        // Only ever search sources the caller enabled. An empty result with
        // search still requested falls back to everything enabled.
        let mut sources: Vec<String> = if decision.sources.is_empty() {
            enabled_sources.to_vec()
        } else {
            decision
                .sources
                .into_iter()
                .filter(|s| enabled_sources.contains(s))
                .collect()
        };
        if sources.is_empty() && !decision.skip_search {
            sources = enabled_sources.to_vec();
        }

        debug!(
            skip_search = decision.skip_search,
            query_type = %decision.query_type,
            sources = ?sources,
            "Query classified"
        );

        Classification {
            skip_search: decision.skip_search,
            standalone_query,
            sources,
            reasoning: decision.reasoning,
            query_type: decision.query_type,
        }
    }
}

fn fallback(query: &str, enabled_sources: &[String]) -> Classification {
    Classification {
        skip_search: false,
        standalone_query: query.to_string(),
        sources: enabled_sources.to_vec(),
        reasoning: "Classification failed, using defaults".to_string(),
        query_type: QueryType::Factual,
    }
}

fn build_prompt(query: &str, chat_history: &[ChatMessage], enabled_sources: &[String]) -> String {
    let recent = if chat_history.len() > HISTORY_WINDOW {
        &chat_history[chat_history.len() - HISTORY_WINDOW..]
    } else {
        chat_history
    };

    format!(
        r#"You are a query classifier. Analyze the user's query and determine:
1. Whether web search is needed (some queries can be answered from general knowledge)
2. What search sources to use (web, academic, social)
3. Generate a standalone version of the query if it references previous context

Available sources: {sources}

<chat_history>
{history}
</chat_history>

User Query: {query}

Respond in JSON format:
{{
    "skip_search": false,
    "standalone_query": "rewritten query that stands alone",
    "reasoning": "brief explanation",
    "sources": ["web", "academic"],
    "query_type": "factual|conversational|computational|navigation"
}}

Rules:
- Set skip_search to true only for simple greetings, basic math, or common knowledge
- For queries referencing previous messages (e.g., "it", "that"), rewrite as standalone
- Use academic sources for research, scientific, or scholarly topics
- Use web sources for general information"#,
        sources = enabled_sources.join(", "),
        history = format_history(recent),
    )
}

fn format_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "No previous messages".to_string();
    }
    history
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scripted_model, ScriptedProvider};
    use lodestar_core::error::ProviderError;

    fn web() -> Vec<String> {
        vec!["web".to_string()]
    }

    fn web_and_academic() -> Vec<String> {
        vec!["web".to_string(), "academic".to_string()]
    }

    #[test]
    fn prompt_renders_empty_history_placeholder() {
        let prompt = build_prompt("capital of France?", &[], &web());
        assert!(prompt.contains("No previous messages"));
        assert!(prompt.contains("Available sources: web"));
        assert!(prompt.contains("User Query: capital of France?"));
    }

    #[test]
    fn prompt_keeps_last_three_turns() {
        let history = vec![
            ChatMessage::user("one"),
            ChatMessage::assistant("two"),
            ChatMessage::user("three"),
            ChatMessage::assistant("four"),
        ];
        let prompt = build_prompt("q", &history, &web());
        assert!(!prompt.contains("User: one"));
        assert!(prompt.contains("Assistant: two"));
        assert!(prompt.contains("User: three"));
        assert!(prompt.contains("Assistant: four"));
    }

    #[tokio::test]
    async fn model_decision_is_filtered_to_enabled_sources() {
        let (provider, model) = scripted_model(ScriptedProvider::new(vec![Ok(
            ScriptedProvider::text_response(
                r#"{"skip_search": false, "standalone_query": "capital of France",
                    "sources": ["web", "social"], "query_type": "factual",
                    "reasoning": "lookup"}"#,
            ),
        )]));
        let classifier = Classifier::new(model);

        let classification = classifier.classify("capital?", &[], &web_and_academic()).await;

        assert_eq!(classification.sources, vec!["web".to_string()]);
        assert_eq!(classification.standalone_query, "capital of France");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_filtered_sources_rescue_to_enabled_set() {
        let (_, model) = scripted_model(ScriptedProvider::new(vec![Ok(
            ScriptedProvider::text_response(
                r#"{"skip_search": false, "sources": ["uploads"]}"#,
            ),
        )]));
        let classifier = Classifier::new(model);

        let classification = classifier.classify("q", &[], &web()).await;
        assert_eq!(classification.sources, web());
    }

    #[tokio::test]
    async fn empty_standalone_query_substitutes_original() {
        let (_, model) = scripted_model(ScriptedProvider::new(vec![Ok(
            ScriptedProvider::text_response(r#"{"skip_search": true, "sources": []}"#),
        )]));
        let classifier = Classifier::new(model);

        let classification = classifier.classify("what is rust", &[], &web()).await;
        assert_eq!(classification.standalone_query, "what is rust");
        assert!(classification.skip_search);
    }

    #[tokio::test]
    async fn model_failure_yields_exact_fallback() {
        let (_, model) = scripted_model(ScriptedProvider::new(vec![Err(
            ProviderError::Network("connection reset".into()),
        )]));
        let classifier = Classifier::new(model);

        let classification = classifier.classify("capital of France?", &[], &web()).await;

        assert_eq!(
            classification,
            Classification {
                skip_search: false,
                standalone_query: "capital of France?".into(),
                sources: web(),
                reasoning: "Classification failed, using defaults".into(),
                query_type: QueryType::Factual,
            }
        );
    }

    #[tokio::test]
    async fn unparseable_output_yields_fallback() {
        let (_, model) = scripted_model(ScriptedProvider::new(vec![Ok(
            ScriptedProvider::text_response("I would rather write prose."),
        )]));
        let classifier = Classifier::new(model);

        let classification = classifier.classify("q", &[], &web()).await;
        assert_eq!(classification.reasoning, "Classification failed, using defaults");
        assert!(!classification.skip_search);
    }

    #[tokio::test]
    async fn classification_is_idempotent_on_clean_input() {
        let response = r#"{"skip_search": false, "standalone_query": "rust borrow checker",
            "sources": ["web"], "query_type": "factual", "reasoning": "technical lookup"}"#;

        let mut runs = Vec::new();
        for _ in 0..3 {
            let (_, model) = scripted_model(ScriptedProvider::new(vec![Ok(
                ScriptedProvider::text_response(response),
            )]));
            let classifier = Classifier::new(model);
            runs.push(classifier.classify("borrow checker?", &[], &web()).await);
        }

        assert_eq!(runs[0], runs[1]);
        assert_eq!(runs[1], runs[2]);
    }
}
