//! Error taxonomy for the funding ledger
//!
//! Retryability is part of the contract: `Transient` and `Storage` invite a
//! retry from the caller (provider webhook redelivery, sweeper re-run);
//! everything else requires manual intervention and is logged for audit.

use crate::types::PledgeStatus;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Funding ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Campaign reference does not resolve
    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    /// Pledge reference does not resolve
    #[error("Pledge not found: {0}")]
    PledgeNotFound(String),

    /// Settlement amount disagrees with the pledge amount
    #[error("Settled amount {actual} does not match pledge amount {expected}")]
    AmountMismatch {
        /// Pledge amount
        expected: Decimal,
        /// Settled amount reported by the provider
        actual: Decimal,
    },

    /// Event targets a pledge in a status inconsistent with the event
    #[error("Invalid pledge transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: PledgeStatus,
        /// Requested status
        to: PledgeStatus,
    },

    /// Signature or authenticity check failed at the boundary
    #[error("Authentication failure: {0}")]
    AuthenticationFailure(String),

    /// Retryable condition: storage timeout, lock contention, shed load
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Domain policy rejection (goal cap, creator self-pledge)
    #[error("Policy violation: {0}")]
    Policy(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller may retry the operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_) | Error::Storage(_))
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
