//! Shared scripted mocks for pipeline tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lodestar_core::error::{ProviderError, SearchError};
use lodestar_core::provider::{GenerateRequest, GenerateResponse, ModelProvider};
use lodestar_core::search::{EvidenceSource, SearchResponse};
use lodestar_providers::ResolvedModel;

/// A mock provider that returns a sequence of scripted results.
///
/// Each call to `generate` returns the next result in the queue and
/// records the request. Panics past the end of the queue unless built
/// with `repeating_last`.
pub struct ScriptedProvider {
    responses: Vec<Result<GenerateResponse, ProviderError>>,
    requests: Mutex<Vec<GenerateRequest>>,
    call_count: Mutex<usize>,
    repeat_last: bool,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<GenerateResponse, ProviderError>>) -> Self {
        Self {
            responses,
            requests: Mutex::new(Vec::new()),
            call_count: Mutex::new(0),
            repeat_last: false,
        }
    }

    /// Past the end of the queue, keep returning the last scripted result.
    pub fn repeating_last(responses: Vec<Result<GenerateResponse, ProviderError>>) -> Self {
        Self {
            repeat_last: true,
            ..Self::new(responses)
        }
    }

    pub fn text_response(text: &str) -> GenerateResponse {
        GenerateResponse {
            content: text.to_string(),
            model: "mock-model".into(),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);

        let mut count = self.call_count.lock().unwrap();
        let index = if *count >= self.responses.len() {
            if self.repeat_last && !self.responses.is_empty() {
                self.responses.len() - 1
            } else {
                panic!(
                    "ScriptedProvider: no more responses (call #{}, have {})",
                    *count,
                    self.responses.len()
                );
            }
        } else {
            *count
        };
        *count += 1;
        self.responses[index].clone()
    }
}

/// Wrap a scripted provider into the resolved-model shape the pipeline
/// stages take, keeping a handle for call assertions.
pub fn scripted_model(provider: ScriptedProvider) -> (Arc<ScriptedProvider>, ResolvedModel) {
    let provider = Arc::new(provider);
    let model = ResolvedModel {
        provider: provider.clone(),
        model: "mock-model".into(),
    };
    (provider, model)
}

/// One recorded evidence-source call.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub query: String,
    pub categories: Option<Vec<String>>,
    pub max_results: usize,
}

/// A mock evidence source mirroring [`ScriptedProvider`].
pub struct ScriptedSearch {
    responses: Vec<Result<SearchResponse, SearchError>>,
    calls: Mutex<Vec<RecordedSearch>>,
    repeat_last: bool,
}

impl ScriptedSearch {
    pub fn new(responses: Vec<Result<SearchResponse, SearchError>>) -> Self {
        Self {
            responses,
            calls: Mutex::new(Vec::new()),
            repeat_last: false,
        }
    }

    pub fn repeating_last(responses: Vec<Result<SearchResponse, SearchError>>) -> Self {
        Self {
            repeat_last: true,
            ..Self::new(responses)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedSearch> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvidenceSource for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted_search"
    }

    async fn search(
        &self,
        query: &str,
        categories: Option<&[String]>,
        max_results: usize,
    ) -> Result<SearchResponse, SearchError> {
        let mut calls = self.calls.lock().unwrap();
        let index = if calls.len() >= self.responses.len() {
            if self.repeat_last && !self.responses.is_empty() {
                self.responses.len() - 1
            } else {
                panic!(
                    "ScriptedSearch: no more responses (call #{}, have {})",
                    calls.len(),
                    self.responses.len()
                );
            }
        } else {
            calls.len()
        };
        calls.push(RecordedSearch {
            query: query.to_string(),
            categories: categories.map(|c| c.to_vec()),
            max_results,
        });
        self.responses[index].clone()
    }
}
