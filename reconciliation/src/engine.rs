//! Reconciliation engine
//!
//! Applies canonical settlement events to a pledge + campaign pair. All
//! checks that gate a mutation (idempotency lookup, amount comparison,
//! status validation) happen inside the campaign's serialized scope, and
//! the mutation itself is one atomic storage commit.
//!
//! Load shedding and lock waiting are bounded and surface as `Transient`
//! before the serialized scope is entered; once inside, the unit of work is
//! small and runs to completion.

use crate::{
    outbound::{DomainEventKind, OutboundEvents},
    Result,
};
use funding_core::{
    types::{PledgeStatus, ReconciliationResult, SettlementEvent, SettlementOutcome},
    CampaignLocks, Config, Error as LedgerError, Metrics, Storage,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Direction of a ledger application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApplyKind {
    /// Initial settlement of a Pending pledge
    Settlement,
    /// Reversal of a Completed pledge
    RefundReversal,
}

/// Reconciliation engine
pub struct ReconciliationEngine {
    /// Funding ledger storage
    storage: Arc<Storage>,

    /// Per-campaign serialization domain
    locks: Arc<CampaignLocks>,

    /// Post-commit domain events
    outbound: OutboundEvents,

    /// Metrics
    metrics: Arc<Metrics>,

    /// Bound on waiting to enter a campaign's serialized scope
    op_timeout: Duration,

    /// Admission control; exhaustion sheds load as a retryable error
    inflight: Semaphore,
}

impl ReconciliationEngine {
    /// Create new reconciliation engine
    pub fn new(
        storage: Arc<Storage>,
        locks: Arc<CampaignLocks>,
        outbound: OutboundEvents,
        metrics: Arc<Metrics>,
        config: &Config,
    ) -> Self {
        Self {
            storage,
            locks,
            outbound,
            metrics,
            op_timeout: Duration::from_millis(config.op_timeout_ms),
            inflight: Semaphore::new(config.max_in_flight),
        }
    }

    /// Apply a settlement event to its pledge and campaign
    ///
    /// Success transitions the pledge Pending→Completed and adds its amount
    /// to the campaign; Failure transitions Pending→Failed with no campaign
    /// mutation. Duplicate deliveries return the recorded result of the
    /// first application.
    pub async fn apply(&self, event: SettlementEvent) -> Result<ReconciliationResult> {
        let _timer = self.metrics.apply_duration.start_timer();
        self.apply_inner(event, ApplyKind::Settlement).await
    }

    /// Apply a settlement-style refund reversal
    ///
    /// Transitions the pledge Completed→Refunded and subtracts its amount
    /// from the campaign. Entry point for the refund coordinator and for
    /// out-of-band crypto refund confirmations.
    pub async fn apply_refund(&self, event: SettlementEvent) -> Result<ReconciliationResult> {
        self.apply_inner(event, ApplyKind::RefundReversal).await
    }

    async fn apply_inner(
        &self,
        event: SettlementEvent,
        kind: ApplyKind,
    ) -> Result<ReconciliationResult> {
        let _permit = self.inflight.try_acquire().map_err(|_| {
            LedgerError::Transient("reconciliation at capacity, retry later".to_string())
        })?;

        // Resolve outside the lock: a pledge's campaign never changes
        let resolved = self.storage.get_pledge_by_reference(&event.pledge_reference)?;

        let _guard = tokio::time::timeout(self.op_timeout, self.locks.acquire(resolved.campaign_id))
            .await
            .map_err(|_| {
                LedgerError::Transient(format!(
                    "timed out waiting on campaign {} lock",
                    resolved.campaign_id
                ))
            })?;

        // Idempotency lookup shares the serialized scope with the commit
        if let Some(prior) = self.storage.recorded_result(&event.provider_event_id)? {
            self.metrics.duplicate_events.inc();
            debug!(
                provider_event_id = %event.provider_event_id,
                pledge_id = %prior.pledge_id,
                "Duplicate settlement event suppressed"
            );
            return Ok(prior);
        }

        // Re-read the pledge inside the scope
        let pledge = self.storage.get_pledge(resolved.id)?;

        if event.settled_amount != pledge.amount {
            self.metrics.amount_mismatches.inc();
            warn!(
                provider_event_id = %event.provider_event_id,
                pledge_id = %pledge.id,
                pledge_amount = %pledge.amount,
                settled_amount = %event.settled_amount,
                "Settled amount disagrees with pledge; manual reconciliation required"
            );
            return Err(LedgerError::AmountMismatch {
                expected: pledge.amount,
                actual: event.settled_amount,
            }
            .into());
        }

        let (new_status, delta) = match kind {
            ApplyKind::Settlement => match event.outcome {
                SettlementOutcome::Success => (PledgeStatus::Completed, pledge.amount),
                SettlementOutcome::Failure => (PledgeStatus::Failed, Decimal::ZERO),
            },
            ApplyKind::RefundReversal => {
                if event.outcome != SettlementOutcome::Success {
                    warn!(
                        provider_event_id = %event.provider_event_id,
                        pledge_id = %pledge.id,
                        "Refund reversal reported failure; ledger unchanged"
                    );
                    return Err(LedgerError::Policy(
                        "refund reversal event did not settle".to_string(),
                    )
                    .into());
                }
                (PledgeStatus::Refunded, -pledge.amount)
            }
        };

        if !pledge.status.can_transition(new_status) {
            self.metrics.invalid_transitions.inc();
            warn!(
                provider_event_id = %event.provider_event_id,
                pledge_id = %pledge.id,
                from = %pledge.status,
                to = %new_status,
                "Event targets pledge in inconsistent status; flagged for audit"
            );
            return Err(LedgerError::InvalidTransition {
                from: pledge.status,
                to: new_status,
            }
            .into());
        }

        let result =
            self.storage
                .commit_reconciliation(&pledge, new_status, delta, &event.provider_event_id)?;

        self.metrics.events_applied.inc();
        if new_status == PledgeStatus::Refunded {
            self.metrics.refunds.inc();
        }

        // Emitted only after the commit has durably landed
        self.publish_for(&result);

        Ok(result)
    }

    fn publish_for(&self, result: &ReconciliationResult) {
        let kind = match result.pledge_status {
            PledgeStatus::Completed => DomainEventKind::PledgeCompleted {
                pledge_id: result.pledge_id,
                campaign_id: result.campaign_id,
                amount: result.amount,
            },
            PledgeStatus::Failed => DomainEventKind::PledgeFailed {
                pledge_id: result.pledge_id,
                campaign_id: result.campaign_id,
            },
            PledgeStatus::Refunded => DomainEventKind::PledgeRefunded {
                pledge_id: result.pledge_id,
                campaign_id: result.campaign_id,
                amount: result.amount,
            },
            PledgeStatus::Pending => return,
        };
        self.outbound.publish(kind);
    }
}
