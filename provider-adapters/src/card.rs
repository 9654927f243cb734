//! Card-network checkout connector
//!
//! Wire format: amounts travel in integer minor units (cents); webhook
//! payloads are signed with a shared secret, signature header carries the
//! hex digest.

use crate::{connector::ProviderConnector, types::*, Error, Result};
use async_trait::async_trait;
use funding_core::types::{Provider, ProviderReference};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Checkout session event as delivered by the card network
#[derive(Debug, Deserialize)]
struct CardCheckoutPayload {
    /// Provider-unique event id
    id: String,
    /// Event type discriminator
    #[serde(rename = "type")]
    event_type: String,
    /// Checkout session (the reference handed out at intent creation)
    session_id: String,
    /// Amount in minor units
    amount_cents: i64,
}

/// Card-checkout connector
pub struct CardCheckoutConnector {
    webhook_secret: String,
}

impl CardCheckoutConnector {
    /// Create new card-checkout connector
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    fn expected_signature(&self, payload: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.webhook_secret.as_bytes());
        hasher.update(b".");
        hasher.update(payload);
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ProviderConnector for CardCheckoutConnector {
    fn provider(&self) -> Provider {
        Provider::CardCheckout
    }

    async fn create_intent(&self, request: &IntentRequest) -> Result<ProviderReference> {
        let reference = ProviderReference::new(format!("cs_{}", request.pledge_id.simple()));

        info!(
            pledge_id = %request.pledge_id,
            amount = %request.amount,
            reference = %reference,
            "Card checkout session created"
        );

        Ok(reference)
    }

    fn verify_and_parse(&self, raw_payload: &[u8], signature_header: &str) -> Result<NativeEvent> {
        let expected = self.expected_signature(raw_payload);
        if signature_header != expected {
            return Err(Error::Authentication {
                provider: self.name().to_string(),
                reason: "signature digest mismatch".to_string(),
            });
        }

        let payload: CardCheckoutPayload =
            serde_json::from_slice(raw_payload).map_err(|e| Error::MalformedPayload {
                provider: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let succeeded = match payload.event_type.as_str() {
            "checkout.session.completed" => true,
            "checkout.session.failed" => false,
            other => {
                return Err(Error::MalformedPayload {
                    provider: self.name().to_string(),
                    reason: format!("unhandled event type {}", other),
                })
            }
        };

        debug!(event_id = %payload.id, session = %payload.session_id, "Card event verified");

        Ok(NativeEvent {
            event_id: payload.id,
            reference: payload.session_id,
            succeeded,
            amount: Decimal::new(payload.amount_cents, 2),
        })
    }

    async fn issue_refund(
        &self,
        reference: &ProviderReference,
        amount: Decimal,
    ) -> Result<RefundOutcome> {
        if amount <= Decimal::ZERO {
            return Ok(RefundOutcome::Rejected {
                reason: "refund amount must be positive".to_string(),
            });
        }

        info!(reference = %reference, amount = %amount, "Card refund confirmed");
        Ok(RefundOutcome::Confirmed)
    }

    fn name(&self) -> &str {
        "card-checkout"
    }
}
