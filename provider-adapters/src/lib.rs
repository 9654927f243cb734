//! FundRail provider adapters
//!
//! The closed set of payment-provider connectors behind one capability
//! trait, plus the normalizer that turns each provider's native webhook
//! shape into the canonical settlement event.
//!
//! The engine never talks to a provider network directly: a connector
//! creates the payment intent, authenticates inbound payloads, and issues
//! refunds. Everything past the connector boundary speaks
//! `funding_core::SettlementEvent`.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod card;
pub mod connector;
pub mod crypto;
pub mod error;
pub mod normalizer;
pub mod registry;
pub mod types;
pub mod wallet;

// Re-exports
pub use card::CardCheckoutConnector;
pub use connector::ProviderConnector;
pub use crypto::CryptoConnector;
pub use error::{Error, Result};
pub use normalizer::SettlementEventNormalizer;
pub use registry::ProviderRegistry;
pub use types::{IntentRequest, NativeEvent, RefundOutcome};
pub use wallet::WalletNetworkConnector;
