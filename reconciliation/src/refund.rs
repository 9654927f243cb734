//! Refund coordinator
//!
//! Provider first, ledger second: the connector must report the refund
//! settled before any ledger effect is reversed. The reversal itself goes
//! through the reconciliation engine's apply-refund path with a
//! deterministic event id, so a re-invoked refund is absorbed by the same
//! idempotency record as everything else.
//!
//! Crypto refunds cannot be confirmed synchronously. The coordinator parks
//! them as accepted-but-manual — an operator-visible inconsistency window —
//! and the ledger stays untouched until the chain watcher's confirmation
//! event arrives through `ReconciliationEngine::apply_refund`.

use crate::{engine::ReconciliationEngine, Error, Result};
use funding_core::{
    types::{
        PledgeStatus, ProviderReference, ReconciliationResult, SettlementEvent, SettlementOutcome,
    },
    Error as LedgerError, Metrics, Storage,
};
use provider_adapters::{ProviderRegistry, RefundOutcome};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of a refund request
#[derive(Debug, Clone, PartialEq)]
pub enum RefundResult {
    /// Refund settled and the ledger effect was reversed
    Refunded(ReconciliationResult),

    /// The pledge was already Refunded; no-op
    AlreadyRefunded(Option<ReconciliationResult>),

    /// Refund accepted but awaiting out-of-band confirmation;
    /// the ledger is unchanged until it arrives
    PendingManual {
        /// Pledge awaiting confirmation
        pledge_id: Uuid,
        /// Provider reference the confirmation will correlate on
        reference: ProviderReference,
    },
}

/// Refund coordinator
pub struct RefundCoordinator {
    /// Funding ledger storage
    storage: Arc<Storage>,

    /// Provider connectors
    registry: Arc<ProviderRegistry>,

    /// Apply path for the ledger reversal
    engine: Arc<ReconciliationEngine>,

    /// Metrics
    metrics: Arc<Metrics>,
}

impl RefundCoordinator {
    /// Create new refund coordinator
    pub fn new(
        storage: Arc<Storage>,
        registry: Arc<ProviderRegistry>,
        engine: Arc<ReconciliationEngine>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            storage,
            registry,
            engine,
            metrics,
        }
    }

    /// Deterministic event id for a pledge's ledger reversal
    fn reversal_event_id(pledge_id: Uuid) -> String {
        format!("refund-{}", pledge_id)
    }

    /// Refund a completed pledge
    ///
    /// `amount` may be any fraction of the pledge (at most its full value);
    /// the lifecycle model is coarse, so the pledge lands in the single
    /// terminal Refunded status and the ledger reversal subtracts the full
    /// pledge amount, keeping the raised-amount invariant exact.
    pub async fn refund(
        &self,
        pledge_id: Uuid,
        amount: Decimal,
        reason: &str,
    ) -> Result<RefundResult> {
        let pledge = self.storage.get_pledge(pledge_id)?;

        if pledge.status == PledgeStatus::Refunded {
            let prior = self
                .storage
                .recorded_result(&Self::reversal_event_id(pledge_id))?;
            return Ok(RefundResult::AlreadyRefunded(prior));
        }

        if pledge.status != PledgeStatus::Completed {
            return Err(LedgerError::InvalidTransition {
                from: pledge.status,
                to: PledgeStatus::Refunded,
            }
            .into());
        }

        if amount <= Decimal::ZERO || amount > pledge.amount {
            return Err(LedgerError::Policy(format!(
                "refund amount {} outside (0, {}]",
                amount, pledge.amount
            ))
            .into());
        }

        let reference = pledge.provider_reference.clone().ok_or_else(|| {
            Error::Ledger(LedgerError::Policy(format!(
                "pledge {} has no provider reference",
                pledge_id
            )))
        })?;

        let connector = self.registry.get(pledge.provider)?;

        info!(
            pledge_id = %pledge_id,
            provider = %pledge.provider,
            amount = %amount,
            reason,
            "Issuing provider refund"
        );

        match connector.issue_refund(&reference, amount).await? {
            RefundOutcome::Rejected { reason } => {
                // No ledger mutation on a rejected refund
                warn!(pledge_id = %pledge_id, reason = %reason, "Provider rejected refund");
                Err(LedgerError::Policy(format!("provider rejected refund: {}", reason)).into())
            }

            RefundOutcome::Pending => {
                self.metrics.manual_refunds.inc();
                warn!(
                    pledge_id = %pledge_id,
                    reference = %reference,
                    "Refund accepted but unconfirmed; ledger unchanged until \
                     out-of-band confirmation arrives"
                );
                Ok(RefundResult::PendingManual {
                    pledge_id,
                    reference,
                })
            }

            RefundOutcome::Confirmed => {
                let reversal = SettlementEvent {
                    provider_event_id: Self::reversal_event_id(pledge_id),
                    pledge_reference: reference,
                    provider: pledge.provider,
                    outcome: SettlementOutcome::Success,
                    settled_amount: pledge.amount,
                };

                let result = self.engine.apply_refund(reversal).await?;
                Ok(RefundResult::Refunded(result))
            }
        }
    }
}
