//! Outbound domain events
//!
//! Fire-and-forget notifications for the messaging subsystem, published
//! after the ledger mutation commits. The core owes no delivery guarantee:
//! a lagging or absent subscriber never blocks or fails a mutation.

use chrono::{DateTime, Utc};
use funding_core::types::CampaignStatus;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Domain event envelope
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent {
    /// Event ID (UUIDv7 for ordering)
    pub id: Uuid,

    /// Emission timestamp
    pub occurred_at: DateTime<Utc>,

    /// Payload
    pub kind: DomainEventKind,
}

/// Domain event payloads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DomainEventKind {
    /// A pledge settled and was counted into the raised amount
    PledgeCompleted {
        /// Pledge
        pledge_id: Uuid,
        /// Owning campaign
        campaign_id: Uuid,
        /// Amount counted
        amount: Decimal,
    },

    /// A pledge's settlement failed
    PledgeFailed {
        /// Pledge
        pledge_id: Uuid,
        /// Owning campaign
        campaign_id: Uuid,
    },

    /// A completed pledge was reversed
    PledgeRefunded {
        /// Pledge
        pledge_id: Uuid,
        /// Owning campaign
        campaign_id: Uuid,
        /// Amount subtracted
        amount: Decimal,
    },

    /// A campaign left Active status
    CampaignClosed {
        /// Campaign
        campaign_id: Uuid,
        /// Terminal status
        status: CampaignStatus,
        /// Raised amount at close
        raised_amount: Decimal,
        /// Funding goal
        goal_amount: Decimal,
    },
}

/// Handle for publishing and subscribing to domain events
#[derive(Clone)]
pub struct OutboundEvents {
    tx: broadcast::Sender<DomainEvent>,
}

impl OutboundEvents {
    /// Create a channel retaining up to `capacity` undelivered events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to domain events
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Publish an event, ignoring the absence of subscribers
    pub fn publish(&self, kind: DomainEventKind) {
        let event = DomainEvent {
            id: Uuid::now_v7(),
            occurred_at: Utc::now(),
            kind,
        };

        if self.tx.send(event).is_err() {
            tracing::trace!("No domain event subscribers");
        }
    }
}

impl Default for OutboundEvents {
    fn default() -> Self {
        Self::new(256)
    }
}
