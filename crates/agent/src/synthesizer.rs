//! Answer synthesizer.
//!
//! One model call turns the gathered evidence into a cited answer. The
//! prompt carries every evidence item as an indexed `<result>` block and
//! asks for `[index]` citations; the model's text comes back verbatim.

use lodestar_core::error::ProviderError;
use lodestar_core::message::{ChatMessage, Role};
use lodestar_core::provider::GenerateRequest;
use lodestar_core::search::SearchResult;
use lodestar_providers::ResolvedModel;
use tracing::debug;

const SYNTHESIS_TEMPERATURE: f32 = 0.7;
const HISTORY_WINDOW: usize = 5;

pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str =
    "You are a helpful AI assistant that provides accurate, well-sourced answers.";

pub struct Synthesizer {
    model: ResolvedModel,
}

impl Synthesizer {
    pub fn new(model: ResolvedModel) -> Self {
        Self { model }
    }

    pub async fn generate(
        &self,
        query: &str,
        evidence: &[SearchResult],
        chat_history: &[ChatMessage],
        system_instructions: &str,
    ) -> Result<String, ProviderError> {
        let recent = if chat_history.len() > HISTORY_WINDOW {
            &chat_history[chat_history.len() - HISTORY_WINDOW..]
        } else {
            chat_history
        };

        let prompt = build_prompt(query, evidence, recent, system_instructions);
        debug!(
            evidence = evidence.len(),
            prompt_chars = prompt.len(),
            "Synthesizing answer"
        );

        let mut messages = vec![ChatMessage::system(prompt)];
        messages.extend(recent.iter().cloned());
        messages.push(ChatMessage::user(query));

        let request = GenerateRequest::new(&self.model.model, messages)
            .with_temperature(SYNTHESIS_TEMPERATURE);

        let response = self.model.provider.generate(request).await?;
        Ok(response.content)
    }
}

fn build_prompt(
    query: &str,
    evidence: &[SearchResult],
    recent_history: &[ChatMessage],
    system_instructions: &str,
) -> String {
    format!(
        r#"{system_instructions}

You are given a user query and search results. Your task is to answer the query using information from the search results. Cite your sources using [index] notation where index corresponds to the search result number.

<search_results>
{search_context}
</search_results>

<chat_history>
{history}
</chat_history>

User Query: {query}

Provide a comprehensive answer based on the search results. Cite sources using [index] notation."#,
        search_context = format_evidence(evidence),
        history = format_history(recent_history),
    )
}

fn format_evidence(evidence: &[SearchResult]) -> String {
    if evidence.is_empty() {
        return "No search results available.".to_string();
    }
    evidence
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                r#"<result index="{}" title="{}">{}</result>"#,
                i + 1,
                r.title,
                r.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "No previous messages".to_string();
    }
    history
        .iter()
        .map(|m| {
            let label = match m.role {
                Role::User => "User",
                _ => "Assistant",
            };
            format!("{label}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{scripted_model, ScriptedProvider};
    use lodestar_core::error::ProviderError;

    fn evidence() -> Vec<SearchResult> {
        vec![
            SearchResult::new("Paris", "https://a.example/paris", "Paris is the capital."),
            SearchResult::new("France", "https://a.example/france", "France is in Europe."),
        ]
    }

    #[test]
    fn evidence_renders_as_indexed_blocks() {
        let rendered = format_evidence(&evidence());
        assert!(rendered.contains(r#"<result index="1" title="Paris">Paris is the capital.</result>"#));
        assert!(rendered.contains(r#"<result index="2" title="France">"#));
    }

    #[test]
    fn empty_evidence_renders_placeholder() {
        assert_eq!(format_evidence(&[]), "No search results available.");
    }

    #[test]
    fn history_uses_display_labels() {
        let history = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ];
        assert_eq!(format_history(&history), "User: hi\nAssistant: hello");
    }

    #[tokio::test]
    async fn prompt_is_sole_system_message_followed_by_history_and_query() {
        let (provider, model) = scripted_model(ScriptedProvider::new(vec![Ok(
            ScriptedProvider::text_response("Paris is the capital of France. [1]"),
        )]));
        let synthesizer = Synthesizer::new(model);

        let history: Vec<ChatMessage> = (0..7)
            .map(|i| ChatMessage::user(format!("turn {i}")))
            .collect();

        let answer = synthesizer
            .generate(
                "capital of France?",
                &evidence(),
                &history,
                DEFAULT_SYSTEM_INSTRUCTIONS,
            )
            .await
            .unwrap();

        assert_eq!(answer, "Paris is the capital of France. [1]");

        let requests = provider.requests();
        let messages = &requests[0].messages;
        // system prompt + last 5 history turns + the query itself
        assert_eq!(messages.len(), 7);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("<search_results>"));
        assert!(messages[0].content.contains(DEFAULT_SYSTEM_INSTRUCTIONS));
        assert_eq!(messages[1].content, "turn 2");
        assert_eq!(messages[6].content, "capital of France?");
        assert!((requests[0].temperature - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn model_failure_propagates_to_caller() {
        let (_, model) = scripted_model(ScriptedProvider::new(vec![Err(
            ProviderError::Timeout("deadline exceeded".into()),
        )]));
        let synthesizer = Synthesizer::new(model);

        let err = synthesizer
            .generate("q", &[], &[], DEFAULT_SYSTEM_INSTRUCTIONS)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }
}
