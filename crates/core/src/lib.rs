//! # Lodestar Core
//!
//! Domain types, traits, and error definitions for the lodestar answer
//! engine. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The pipeline's collaborators are defined as traits here (`ModelProvider`
//! for LLM backends, `EvidenceSource` for search backends). Implementations
//! live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod decision;
pub mod error;
pub mod message;
pub mod provider;
pub mod response;
pub mod search;

// Re-export key types at crate root for ergonomics
pub use decision::{
    parse_decision, Classification, ClassificationDecision, QueryType, RefinementDecision,
};
pub use error::{DecisionError, Error, ProviderError, RegistryError, Result, SearchError};
pub use message::{ChatMessage, Role};
pub use provider::{GenerateRequest, GenerateResponse, ModelProvider, StreamChunk};
pub use response::{SearchAgentResponse, SourceRef};
pub use search::{EvidenceSource, SearchResponse, SearchResult};
