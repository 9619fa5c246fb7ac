//! Evidence gatherer.
//!
//! The initial fan-out runs one search per requested source and merges
//! the results with first-seen-wins url dedup. The refinement loop then
//! optionally kicks in: the model reviews a digest of what was found and
//! either stops or names one follow-up search per iteration, up to the
//! mode's budget.

use std::collections::HashSet;
use std::sync::Arc;

use lodestar_config::ModeConfig;
use lodestar_core::decision::{parse_decision, RefinementDecision};
use lodestar_core::error::SearchError;
use lodestar_core::message::ChatMessage;
use lodestar_core::provider::GenerateRequest;
use lodestar_core::search::{EvidenceSource, SearchResult};
use lodestar_providers::ResolvedModel;
use tracing::{debug, info, warn};

const REFINEMENT_TEMPERATURE: f32 = 0.1;
const DIGEST_RESULTS: usize = 10;
const DIGEST_CONTENT_CHARS: usize = 200;
const FOLLOW_UP_MAX_RESULTS: usize = 5;

pub struct Researcher {
    model: ResolvedModel,
    search: Arc<dyn EvidenceSource>,
}

impl Researcher {
    pub fn new(model: ResolvedModel, search: Arc<dyn EvidenceSource>) -> Self {
        Self { model, search }
    }

    /// Gather evidence for a standalone query.
    ///
    /// Partial source failures are absorbed. The only error this returns
    /// is the distinguished all-sources-unreachable case, which the
    /// orchestrator turns into a degraded response.
    pub async fn research(
        &self,
        standalone_query: &str,
        sources: &[String],
        mode_config: ModeConfig,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let mut results = self.initial_fan_out(standalone_query, sources, mode_config).await?;

        if mode_config.max_iterations > 0 && !results.is_empty() {
            self.refine(standalone_query, &mut results, mode_config.max_iterations)
                .await;
        }

        info!(count = results.len(), "Evidence gathering complete");
        Ok(results)
    }

    async fn initial_fan_out(
        &self,
        query: &str,
        sources: &[String],
        mode_config: ModeConfig,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let mut searches = Vec::new();
        for source in sources {
            let categories: Option<Vec<String>> = match source.as_str() {
                "web" => None,
                "academic" => Some(vec!["science".to_string()]),
                "social" => Some(vec!["social".to_string()]),
                other => {
                    debug!(source = other, "Ignoring unknown source");
                    continue;
                }
            };
            searches.push(async move {
                self.search
                    .search(query, categories.as_deref(), mode_config.max_results)
                    .await
            });
        }

        let responses = futures::future::join_all(searches).await;

        if !responses.is_empty()
            && responses
                .iter()
                .all(|r| matches!(r, Err(e) if e.is_connectivity()))
        {
            // Every attempted source was unreachable, not just misbehaving.
            return Err(SearchError::Connect(
                "all evidence sources unreachable".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for response in responses {
            match response {
                Ok(response) => merge_results(&mut results, &mut seen, response.results),
                Err(e) => {
                    warn!(error = %e, "Evidence source failed, continuing without it");
                }
            }
        }

        debug!(count = results.len(), "Initial fan-out merged");
        Ok(results)
    }

    /// Refinement loop. Mutates `results` in place; never fails outward.
    async fn refine(&self, query: &str, results: &mut Vec<SearchResult>, max_iterations: u32) {
        let mut seen: HashSet<String> = results.iter().map(|r| r.url.clone()).collect();

        for iteration in 0..max_iterations {
            let prompt = build_refinement_prompt(query, results, iteration + 1, max_iterations);

            let request = GenerateRequest::new(
                &self.model.model,
                vec![
                    ChatMessage::system(
                        "You are a research assistant. Respond only in valid JSON.",
                    ),
                    ChatMessage::user(prompt),
                ],
            )
            .with_temperature(REFINEMENT_TEMPERATURE);

            let decision = match self.model.provider.generate(request).await {
                Ok(response) => match parse_decision::<RefinementDecision>(&response.content) {
                    Ok(decision) => decision,
                    Err(e) => {
                        warn!(error = %e, iteration, "Refinement decision unparseable, stopping");
                        return;
                    }
                },
                Err(e) => {
                    warn!(error = %e, iteration, "Refinement model call failed, stopping");
                    return;
                }
            };

            if decision.done || decision.follow_up_query.is_empty() {
                debug!(iteration, reasoning = %decision.reasoning, "Refinement complete");
                return;
            }

            match self
                .search
                .search(&decision.follow_up_query, None, FOLLOW_UP_MAX_RESULTS)
                .await
            {
                Ok(response) => {
                    debug!(
                        follow_up = %decision.follow_up_query,
                        new = response.results.len(),
                        "Follow-up search merged"
                    );
                    merge_results(results, &mut seen, response.results);
                }
                Err(e) => {
                    warn!(error = %e, "Follow-up search failed, keeping gathered evidence");
                    return;
                }
            }
        }
    }
}

/// First occurrence of a url wins; results without a url are dropped.
fn merge_results(
    results: &mut Vec<SearchResult>,
    seen: &mut HashSet<String>,
    incoming: Vec<SearchResult>,
) {
    for result in incoming {
        if result.url.is_empty() || seen.contains(&result.url) {
            continue;
        }
        seen.insert(result.url.clone());
        results.push(result);
    }
}

fn build_refinement_prompt(
    query: &str,
    results: &[SearchResult],
    iteration: u32,
    max_iterations: u32,
) -> String {
    format!(
        r#"You are a research assistant. Given the current research results, determine if more information is needed.

Research Query: {query}

Current Findings:
{findings}

Iteration {iteration}/{max_iterations}

Decide:
1. Do we have enough information to answer the query comprehensively?
2. If not, what specific follow-up searches would help?

Respond in JSON format:
{{
    "done": false,
    "follow_up_query": "specific search query if needed",
    "reasoning": "why this follow-up is needed"
}}

If information is sufficient, set done to true."#,
        findings = format_digest(results),
    )
}

fn format_digest(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results yet.".to_string();
    }
    results
        .iter()
        .take(DIGEST_RESULTS)
        .enumerate()
        .map(|(i, r)| {
            let content: String = r.content.chars().take(DIGEST_CONTENT_CHARS).collect();
            format!("{}. {}\n   URL: {}\n   {}...", i + 1, r.title, r.url, content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
