//! FundRail Funding Core
//!
//! Durable funding ledger for campaign pledges: the pledge record store,
//! the campaign aggregate store, and the primitives the reconciliation
//! engine builds on.
//!
//! # Architecture
//!
//! - **Compare-and-transition**: status changes are guarded by the expected
//!   current status; stale writers get a typed error instead of clobbering
//! - **Atomic commits**: a pledge transition, its campaign adjustment, and
//!   the idempotency record land in one storage write batch
//! - **Per-campaign serialization**: a keyed lock domain scopes mutual
//!   exclusion to the campaign, so disjoint campaigns proceed in parallel
//!
//! # Invariants
//!
//! - A campaign's raised amount equals the sum of its Completed pledges
//! - Terminal pledge statuses (Failed, Refunded) are never left
//! - Campaign status never reverses out of Successful or Failed

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod error;
pub mod locks;
pub mod metrics;
pub mod storage;
pub mod types;

// Re-exports
pub use config::{Config, GoalCapPolicy};
pub use error::{Error, Result};
pub use locks::CampaignLocks;
pub use metrics::Metrics;
pub use storage::Storage;
pub use types::{
    Campaign, CampaignStatus, Pledge, PledgeStatus, Provider, ProviderReference,
    ReconciliationResult, SettlementEvent, SettlementOutcome,
};
