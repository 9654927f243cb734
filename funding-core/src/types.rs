//! Core types for the funding ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)
//! - Explicit status machines with terminal states

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque reference assigned by a payment provider at intent creation
/// (checkout session id, wallet payment id, deposit address).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderReference(String);

impl ProviderReference {
    /// Create new provider reference
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment provider a pledge settles through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Card-network checkout
    CardCheckout,
    /// Third-party wallet network
    WalletNetwork,
    /// On-chain crypto flow
    Crypto,
}

impl Provider {
    /// All providers, in dispatch order
    pub const ALL: [Provider; 3] = [
        Provider::CardCheckout,
        Provider::WalletNetwork,
        Provider::Crypto,
    ];
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::CardCheckout => write!(f, "card-checkout"),
            Provider::WalletNetwork => write!(f, "wallet-network"),
            Provider::Crypto => write!(f, "crypto"),
        }
    }
}

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CampaignStatus {
    /// Accepting pledges, funding window open
    Active = 1,
    /// Window closed with goal met (terminal)
    Successful = 2,
    /// Window closed short of goal (terminal)
    Failed = 3,
}

impl CampaignStatus {
    /// Check if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Successful | CampaignStatus::Failed)
    }
}

/// Campaign aggregate
///
/// `raised_amount` is mutated only by the reconciliation engine;
/// `status` only by the deadline sweeper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Campaign ID
    pub id: Uuid,

    /// Display title
    pub title: String,

    /// Creator (cannot pledge to their own campaign)
    pub creator_id: Uuid,

    /// Funding goal (positive)
    pub goal_amount: Decimal,

    /// Sum of Completed pledge amounts (non-negative)
    pub raised_amount: Decimal,

    /// End of the funding window
    pub deadline: DateTime<Utc>,

    /// Lifecycle status
    pub status: CampaignStatus,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Create a new Active campaign with nothing raised
    pub fn new(
        title: impl Into<String>,
        creator_id: Uuid,
        goal_amount: Decimal,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            creator_id,
            goal_amount,
            raised_amount: Decimal::ZERO,
            deadline,
            status: CampaignStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// Check whether the funding goal has been met
    pub fn goal_met(&self) -> bool {
        self.raised_amount >= self.goal_amount
    }

    /// Check whether the funding window has elapsed at `now`
    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.deadline <= now
    }
}

/// Pledge settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PledgeStatus {
    /// Created, awaiting settlement
    Pending = 1,
    /// Settled successfully, counted in raised amount
    Completed = 2,
    /// Settlement failed (terminal)
    Failed = 3,
    /// Reversed after completion (terminal)
    Refunded = 4,
}

impl PledgeStatus {
    /// Check if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, PledgeStatus::Failed | PledgeStatus::Refunded)
    }

    /// Check whether a transition to `next` is permitted
    pub fn can_transition(&self, next: PledgeStatus) -> bool {
        matches!(
            (self, next),
            (PledgeStatus::Pending, PledgeStatus::Completed)
                | (PledgeStatus::Pending, PledgeStatus::Failed)
                | (PledgeStatus::Completed, PledgeStatus::Refunded)
        )
    }
}

impl fmt::Display for PledgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PledgeStatus::Pending => write!(f, "pending"),
            PledgeStatus::Completed => write!(f, "completed"),
            PledgeStatus::Failed => write!(f, "failed"),
            PledgeStatus::Refunded => write!(f, "refunded"),
        }
    }
}

/// A backer's pledge to a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pledge {
    /// Pledge ID
    pub id: Uuid,

    /// Campaign this pledge funds
    pub campaign_id: Uuid,

    /// Backer
    pub backer_id: Uuid,

    /// Pledged amount (positive, immutable after creation)
    pub amount: Decimal,

    /// Provider the pledge settles through
    pub provider: Provider,

    /// Provider-assigned reference (absent until intent creation)
    pub provider_reference: Option<ProviderReference>,

    /// Settlement status
    pub status: PledgeStatus,

    /// Reward tier chosen by the backer, if any
    pub reward_tier: Option<String>,

    /// Hide backer identity on public listings
    pub anonymous: bool,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Pledge {
    /// Create a new Pending pledge
    pub fn new(campaign_id: Uuid, backer_id: Uuid, amount: Decimal, provider: Provider) -> Self {
        Self {
            id: Uuid::now_v7(),
            campaign_id,
            backer_id,
            amount,
            provider,
            provider_reference: None,
            status: PledgeStatus::Pending,
            reward_tier: None,
            anonymous: false,
            created_at: Utc::now(),
        }
    }

    /// Attach the provider reference assigned at intent creation
    pub fn with_reference(mut self, reference: ProviderReference) -> Self {
        self.provider_reference = Some(reference);
        self
    }

    /// Set the reward tier
    pub fn with_reward_tier(mut self, tier: impl Into<String>) -> Self {
        self.reward_tier = Some(tier.into());
        self
    }

    /// Mark the pledge anonymous
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

/// Settlement outcome reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    /// Funds moved
    Success,
    /// Funds did not move
    Failure,
}

/// Canonical settlement event, normalized from a provider-native shape
///
/// Ephemeral: not persisted as an entity beyond the idempotency record
/// keyed by `provider_event_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementEvent {
    /// Provider-unique event id (the idempotency key)
    pub provider_event_id: String,

    /// Correlation key resolving to exactly one pledge
    pub pledge_reference: ProviderReference,

    /// Originating provider
    pub provider: Provider,

    /// Settlement outcome
    pub outcome: SettlementOutcome,

    /// Settled amount; must equal the pledge amount
    pub settled_amount: Decimal,
}

/// Durable record of one applied settlement event
///
/// Stored under the event's `provider_event_id` so duplicate deliveries
/// return the identical result without touching the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Event that produced this result
    pub provider_event_id: String,

    /// Pledge the event resolved to
    pub pledge_id: Uuid,

    /// Owning campaign
    pub campaign_id: Uuid,

    /// Pledge status after the transition
    pub pledge_status: PledgeStatus,

    /// Pledge amount the event settled
    pub amount: Decimal,

    /// Campaign raised amount after the commit
    pub raised_after: Decimal,

    /// Commit timestamp
    pub applied_at: DateTime<Utc>,
}
