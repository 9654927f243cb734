//! Error types for the reconciliation crate

use thiserror::Error;

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error (stores, taxonomy in `funding_core::Error`)
    #[error("Ledger error: {0}")]
    Ledger(#[from] funding_core::Error),

    /// Provider adapter error
    #[error("Provider error: {0}")]
    Provider(#[from] provider_adapters::Error),
}

impl Error {
    /// Whether the caller may retry the operation unchanged
    ///
    /// The webhook boundary maps this to a retry-inviting response;
    /// everything else gets a non-retry response plus an audit log entry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Ledger(e) => e.is_retryable(),
            Error::Provider(_) => false,
        }
    }
}
