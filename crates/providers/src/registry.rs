//! Model registry: resolves "provider:model" specs to provider instances.
//!
//! Providers are constructed lazily and cached for the lifetime of the
//! registry, keyed by the canonical spec string.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lodestar_config::{Config, ModelSpec};
use lodestar_core::error::RegistryError;
use lodestar_core::provider::ModelProvider;
use tracing::debug;

use crate::anthropic::AnthropicProvider;
use crate::ollama::OllamaProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// A resolved provider plus the model name to pass in requests.
#[derive(Clone)]
pub struct ResolvedModel {
    pub provider: Arc<dyn ModelProvider>,
    pub model: String,
}

impl std::fmt::Debug for ResolvedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedModel")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

/// Resolves model specs against the configuration, caching provider
/// instances so repeated resolutions reuse HTTP clients.
pub struct ModelRegistry {
    config: Config,
    cache: Mutex<HashMap<String, Arc<dyn ModelProvider>>>,
}

impl ModelRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a model spec, falling back to the configured default model
    /// when `spec` is `None`.
    pub fn resolve(&self, spec: Option<&str>) -> Result<ResolvedModel, RegistryError> {
        let raw = spec.unwrap_or(&self.config.general.default_model);
        let parsed = ModelSpec::parse(raw);

        if parsed.model.is_empty() {
            return Err(RegistryError::InvalidSpec(raw.to_string()));
        }

        let key = parsed.key();

        if let Ok(cache) = self.cache.lock() {
            if let Some(provider) = cache.get(&key) {
                return Ok(ResolvedModel {
                    provider: Arc::clone(provider),
                    model: parsed.model,
                });
            }
        }

        let provider = self.build_provider(&parsed.provider)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, Arc::clone(&provider));
        }

        debug!(provider = %parsed.provider, model = %parsed.model, "Resolved model");

        Ok(ResolvedModel {
            provider,
            model: parsed.model,
        })
    }

    fn build_provider(&self, name: &str) -> Result<Arc<dyn ModelProvider>, RegistryError> {
        match name {
            "ollama" => Ok(Arc::new(OllamaProvider::new(
                &self.config.providers.ollama.host,
            ))),
            "openai" => {
                let api_key = self
                    .config
                    .providers
                    .openai
                    .api_key
                    .clone()
                    .ok_or_else(|| RegistryError::MissingApiKey("openai".into()))?;
                Ok(Arc::new(OpenAiCompatProvider::new(
                    "openai",
                    &self.config.providers.openai.base_url,
                    api_key,
                )))
            }
            "anthropic" => {
                let api_key = self
                    .config
                    .providers
                    .anthropic
                    .api_key
                    .clone()
                    .ok_or_else(|| RegistryError::MissingApiKey("anthropic".into()))?;
                let provider = AnthropicProvider::new(api_key)
                    .with_base_url(&self.config.providers.anthropic.base_url);
                Ok(Arc::new(provider))
            }
            other => Err(RegistryError::UnknownProvider(other.to_string())),
        }
    }
}
