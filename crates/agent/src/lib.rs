//! # Lodestar Agent
//!
//! The answer-engine pipeline: classify the query, gather evidence from
//! search sources, synthesize a cited answer. `SearchAgent` is the
//! entry point; the stage components are public for callers that want
//! to drive them individually.

pub mod agent;
pub mod classifier;
pub mod researcher;
pub mod synthesizer;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use agent::{SearchAgent, ERROR_SEARCH_UNAVAILABLE};
pub use classifier::Classifier;
pub use researcher::Researcher;
pub use synthesizer::{Synthesizer, DEFAULT_SYSTEM_INSTRUCTIONS};
