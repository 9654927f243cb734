//! Error types for provider adapters

use thiserror::Error;

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Adapter errors
#[derive(Error, Debug)]
pub enum Error {
    /// Signature or authenticity check failed
    #[error("Authentication failed for {provider}: {reason}")]
    Authentication {
        /// Provider name
        provider: String,
        /// Failure reason
        reason: String,
    },

    /// Payload did not parse into the provider's native event shape
    #[error("Malformed {provider} payload: {reason}")]
    MalformedPayload {
        /// Provider name
        provider: String,
        /// Failure reason
        reason: String,
    },

    /// Payment intent creation failed
    #[error("Intent creation failed: {0}")]
    Intent(String),

    /// No connector registered for the provider
    #[error("No connector registered for provider {0}")]
    UnsupportedProvider(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
