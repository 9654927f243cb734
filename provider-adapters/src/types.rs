//! Shared types for provider adapters

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Payment intent request (sent to a provider at pledge creation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRequest {
    /// Pledge being funded
    pub pledge_id: Uuid,
    /// Campaign the pledge targets
    pub campaign_id: Uuid,
    /// Backer making the pledge
    pub backer_id: Uuid,
    /// Amount to collect
    pub amount: Decimal,
    /// Opaque metadata echoed back in settlement events
    pub metadata: HashMap<String, String>,
}

impl IntentRequest {
    /// Build an intent request for a pledge
    pub fn new(pledge_id: Uuid, campaign_id: Uuid, backer_id: Uuid, amount: Decimal) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("pledge_id".to_string(), pledge_id.to_string());
        metadata.insert("campaign_id".to_string(), campaign_id.to_string());

        Self {
            pledge_id,
            campaign_id,
            backer_id,
            amount,
            metadata,
        }
    }
}

/// Provider-native event after authentication and parsing
///
/// Connectors reduce their wire shapes to this common form; the
/// normalizer maps it onto the canonical `SettlementEvent`.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvent {
    /// Provider-unique event id
    pub event_id: String,
    /// Reference correlating the event to a pledge
    pub reference: String,
    /// Whether funds moved
    pub succeeded: bool,
    /// Settled amount
    pub amount: Decimal,
}

/// Outcome of a refund instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundOutcome {
    /// Provider confirmed the refund settled
    Confirmed,
    /// Refund accepted but cannot be confirmed synchronously
    /// (on-chain refunds settle out-of-band)
    Pending,
    /// Provider rejected the refund
    Rejected {
        /// Provider-supplied reason
        reason: String,
    },
}
