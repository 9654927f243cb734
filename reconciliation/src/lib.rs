//! FundRail Reconciliation
//!
//! The funding ledger's write path: applies normalized settlement events to
//! pledge/campaign pairs with idempotency and atomicity guarantees,
//! reverses ledger effects on refund, and closes campaigns whose funding
//! window has elapsed.
//!
//! # Guarantees
//!
//! - **At-most-once effect** under at-least-once webhook delivery: duplicate
//!   events return the recorded result of the first application
//! - **Atomic commits**: a pledge transition and its campaign adjustment are
//!   one storage write; no observer sees a Completed pledge missing from the
//!   raised amount, nor the reverse
//! - **Per-campaign serialization**: settlement events for pledges of the
//!   same campaign cannot interleave their raised-amount updates
//! - **Durable before handled**: an event is never acknowledged without its
//!   effect having committed; transient failures stay retryable

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod engine;
pub mod error;
pub mod intake;
pub mod outbound;
pub mod refund;
pub mod sweeper;

// Re-exports
pub use engine::ReconciliationEngine;
pub use error::{Error, Result};
pub use intake::{PledgeIntake, PledgeRequest};
pub use outbound::{DomainEvent, DomainEventKind, OutboundEvents};
pub use refund::{RefundCoordinator, RefundResult};
pub use sweeper::{DeadlineSweeper, SweepReport};
