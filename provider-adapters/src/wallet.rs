//! Wallet-network connector
//!
//! Wire format: amounts travel as decimal strings; notifications are
//! signed by appending the shared secret to the body and hashing.

use crate::{connector::ProviderConnector, types::*, Error, Result};
use async_trait::async_trait;
use funding_core::types::{Provider, ProviderReference};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::str::FromStr;
use tracing::{debug, info};

/// Payment notification as delivered by the wallet network
#[derive(Debug, Deserialize)]
struct WalletPayload {
    /// Provider-unique notification id
    notification_id: String,
    /// Wallet payment id (the reference handed out at intent creation)
    payment_id: String,
    /// Payment state
    state: String,
    /// Total as a decimal string
    total: String,
}

/// Wallet-network connector
pub struct WalletNetworkConnector {
    webhook_secret: String,
}

impl WalletNetworkConnector {
    /// Create new wallet-network connector
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    fn expected_signature(&self, payload: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        hasher.update(self.webhook_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ProviderConnector for WalletNetworkConnector {
    fn provider(&self) -> Provider {
        Provider::WalletNetwork
    }

    async fn create_intent(&self, request: &IntentRequest) -> Result<ProviderReference> {
        let reference = ProviderReference::new(format!("wal-{}", request.pledge_id.simple()));

        info!(
            pledge_id = %request.pledge_id,
            amount = %request.amount,
            reference = %reference,
            "Wallet payment created"
        );

        Ok(reference)
    }

    fn verify_and_parse(&self, raw_payload: &[u8], signature_header: &str) -> Result<NativeEvent> {
        let expected = self.expected_signature(raw_payload);
        if signature_header != expected {
            return Err(Error::Authentication {
                provider: self.name().to_string(),
                reason: "transmission signature mismatch".to_string(),
            });
        }

        let payload: WalletPayload =
            serde_json::from_slice(raw_payload).map_err(|e| Error::MalformedPayload {
                provider: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let succeeded = match payload.state.as_str() {
            "COMPLETED" => true,
            "DENIED" | "FAILED" => false,
            other => {
                return Err(Error::MalformedPayload {
                    provider: self.name().to_string(),
                    reason: format!("unhandled payment state {}", other),
                })
            }
        };

        let amount = Decimal::from_str(&payload.total).map_err(|e| Error::MalformedPayload {
            provider: self.name().to_string(),
            reason: format!("bad total {:?}: {}", payload.total, e),
        })?;

        debug!(
            notification_id = %payload.notification_id,
            payment_id = %payload.payment_id,
            "Wallet event verified"
        );

        Ok(NativeEvent {
            event_id: payload.notification_id,
            reference: payload.payment_id,
            succeeded,
            amount,
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

        info!(reference = %reference, amount = %amount, "Wallet refund confirmed");
        Ok(RefundOutcome::Confirmed)
    }

    fn name(&self) -> &str {
        "wallet-network"
    }
}
