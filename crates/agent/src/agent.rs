//! SearchAgent — orchestrates one search request end to end.
//!
//! Pipeline per request: resolve the model, classify the query, gather
//! evidence, synthesize a cited answer. Only model resolution is fatal;
//! everything downstream degrades to a usable response.

use std::sync::Arc;

use lodestar_config::{Config, OptimizationMode};
use lodestar_core::error::Error;
use lodestar_core::message::ChatMessage;
use lodestar_core::response::{SearchAgentResponse, SourceRef};
use lodestar_core::search::{EvidenceSource, SearchResult};
use lodestar_providers::{ModelRegistry, ResolvedModel};
use lodestar_search::SearxngClient;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::classifier::Classifier;
use crate::researcher::Researcher;
use crate::synthesizer::{Synthesizer, DEFAULT_SYSTEM_INSTRUCTIONS};

const SNIPPET_CHARS: usize = 200;
const FALLBACK_DIGEST_ITEMS: usize = 5;

/// Tag set on the response when the search backend was unreachable.
pub const ERROR_SEARCH_UNAVAILABLE: &str = "search_unavailable";

pub struct SearchAgent {
    config: Config,
    registry: ModelRegistry,
    search: Arc<dyn EvidenceSource>,
}

impl SearchAgent {
    pub fn new(config: Config) -> Self {
        let search = Arc::new(SearxngClient::new(
            &config.search.searxng_url,
            config.search.language.clone(),
            config.search.timeout_secs,
        ));
        Self::with_evidence_source(config, search)
    }

    /// Construct against a specific evidence source backend.
    pub fn with_evidence_source(config: Config, search: Arc<dyn EvidenceSource>) -> Self {
        let registry = ModelRegistry::new(config.clone());
        Self {
            config,
            registry,
            search,
        }
    }

    /// Run one search request.
    ///
    /// Returns `Err` only when the requested (or default) model cannot be
    /// resolved; every collaborator failure past that point is absorbed
    /// into a degraded `Ok` response.
    pub async fn search(
        &self,
        query: &str,
        sources: &[String],
        mode: OptimizationMode,
        model: Option<&str>,
        chat_history: &[ChatMessage],
        system_instructions: Option<&str>,
    ) -> Result<SearchAgentResponse, Error> {
        let resolved = self.registry.resolve(model)?;

        let request_id = Uuid::new_v4();
        let span = info_span!("search_request", id = %request_id, mode = %mode);

        Ok(self
            .run_pipeline(resolved, query, sources, mode, chat_history, system_instructions)
            .instrument(span)
            .await)
    }

    pub(crate) async fn run_pipeline(
        &self,
        model: ResolvedModel,
        query: &str,
        sources: &[String],
        mode: OptimizationMode,
        chat_history: &[ChatMessage],
        system_instructions: Option<&str>,
    ) -> SearchAgentResponse {
        let instructions = system_instructions
            .or(self.config.general.system_instructions.as_deref())
            .unwrap_or(DEFAULT_SYSTEM_INSTRUCTIONS);

        let classifier = Classifier::new(model.clone());
        let classification = classifier.classify(query, chat_history, sources).await;
        info!(
            skip_search = classification.skip_search,
            query_type = %classification.query_type,
            "Query classified"
        );

        let evidence: Vec<SearchResult> = if classification.skip_search {
            Vec::new()
        } else {
            let researcher = Researcher::new(model.clone(), self.search.clone());
            match researcher
                .research(
                    &classification.standalone_query,
                    &classification.sources,
                    self.config.modes.get(mode),
                )
                .await
            {
                Ok(results) => results,
                Err(e) => {
                    // The backend is down. Skip synthesis entirely and tell
                    // the caller what happened.
                    warn!(error = %e, "Search backend unreachable, returning degraded response");
                    return SearchAgentResponse {
                        answer: "I could not reach the search backend, so no sources were \
                                 gathered for this query. Please check that the search service \
                                 is running and reachable, then try again."
                            .to_string(),
                        sources: Vec::new(),
                        classification,
                        error: Some(ERROR_SEARCH_UNAVAILABLE.to_string()),
                    };
                }
            }
        };

        let synthesizer = Synthesizer::new(model);
        let answer = match synthesizer
            .generate(query, &evidence, chat_history, instructions)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Synthesis failed, falling back to evidence digest");
                fallback_answer(&evidence)
            }
        };

        let sources_list = evidence
            .iter()
            .map(|r| SourceRef {
                title: r.title.clone(),
                url: r.url.clone(),
                snippet: truncate_snippet(&r.content),
            })
            .collect();

        SearchAgentResponse {
            answer,
            sources: sources_list,
            classification,
            error: None,
        }
    }
}

fn truncate_snippet(content: &str) -> String {
    let truncated: String = content.chars().take(SNIPPET_CHARS).collect();
    format!("{truncated}...")
}

/// Answer used when the synthesis model call fails.
fn fallback_answer(evidence: &[SearchResult]) -> String {
    if evidence.is_empty() {
        return "I was unable to generate an answer for this query. Please try again."
            .to_string();
    }

    let digest = evidence
        .iter()
        .take(FALLBACK_DIGEST_ITEMS)
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. {} ({})\n   {}",
                i + 1,
                r.title,
                r.url,
                truncate_snippet(&r.content)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "I could not generate a full answer, but here is what the search found:\n\n{digest}"
    )
}
