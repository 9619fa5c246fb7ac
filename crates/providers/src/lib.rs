//! # Lodestar Providers
//!
//! Model provider implementations and the registry that resolves
//! "provider:model" configuration strings to live provider instances.
//!
//! - **Ollama**: native `/api/chat` endpoint for local models
//! - **OpenAI-compatible**: `/chat/completions` with Bearer auth
//! - **Anthropic**: native Messages API

pub mod anthropic;
pub mod ollama;
pub mod openai_compat;
pub mod registry;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use registry::{ModelRegistry, ResolvedModel};
