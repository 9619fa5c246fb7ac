//! Error types for the lodestar domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. The pipeline's contract
//! is that only model resolution is fatal to a request; everything else is
//! handled by a stage-level fallback before it reaches the caller.

use thiserror::Error;

/// The top-level error type for all lodestar operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Search errors ---
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    // --- Decision extraction errors ---
    #[error("Decision error: {0}")]
    Decision(#[from] DecisionError),

    // --- Model resolution errors ---
    #[error("Resolution error: {0}")]
    Resolution(#[from] RegistryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// The backend could not be reached at all (refused, DNS, timeout).
    #[error("Search backend unreachable: {0}")]
    Connect(String),

    /// The backend answered with a non-success status.
    #[error("Search request failed with status {status_code}: {message}")]
    Http { status_code: u16, message: String },

    /// The backend answered but the body was not what we expected.
    #[error("Malformed search response: {0}")]
    Parse(String),
}

impl SearchError {
    /// Whether this failure means the backend is down, as opposed to
    /// reachable-but-misbehaving. The pipeline fast-fails a request only
    /// when every attempted source reports a connectivity failure.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SearchError::Connect(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum DecisionError {
    #[error("Could not extract a structured decision: {0}")]
    ExtractionFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Missing API key for provider: {0}")]
    MissingApiKey(String),

    #[error("Invalid model spec: {0}")]
    InvalidSpec(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn connectivity_is_distinguished_from_generic_failure() {
        assert!(SearchError::Connect("connection refused".into()).is_connectivity());
        assert!(
            !SearchError::Http {
                status_code: 500,
                message: "internal error".into()
            }
            .is_connectivity()
        );
        assert!(!SearchError::Parse("unexpected body".into()).is_connectivity());
    }

    #[test]
    fn registry_error_displays_correctly() {
        let err = Error::Resolution(RegistryError::UnknownProvider("bedrock".into()));
        assert!(err.to_string().contains("bedrock"));
    }
}
