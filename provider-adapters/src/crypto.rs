//! On-chain crypto connector
//!
//! Intents hand out a deposit address derived from the pledge id; the
//! chain watcher feeds confirmation events through the same signed-webhook
//! shape as the other providers. Refunds cannot be confirmed synchronously:
//! `issue_refund` always reports `Pending` and the actual reversal arrives
//! later as an out-of-band confirmation event.

use crate::{connector::ProviderConnector, types::*, Error, Result};
use async_trait::async_trait;
use funding_core::types::{Provider, ProviderReference};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Chain watcher notification
#[derive(Debug, Deserialize)]
struct ChainPayload {
    /// Transaction hash (provider-unique event id)
    tx_hash: String,
    /// Deposit address (the reference handed out at intent creation)
    address: String,
    /// Whether the transaction reached finality
    confirmed: bool,
    /// Amount as a decimal string
    amount: String,
}

/// Crypto connector
pub struct CryptoConnector {
    feed_secret: String,
}

impl CryptoConnector {
    /// Create new crypto connector
    pub fn new(feed_secret: impl Into<String>) -> Self {
        Self {
            feed_secret: feed_secret.into(),
        }
    }

    fn expected_signature(&self, payload: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.feed_secret.as_bytes());
        hasher.update(payload);
        hex::encode(hasher.finalize())
    }

    /// Derive a deposit address for a pledge
    fn deposit_address(&self, request: &IntentRequest) -> String {
        let mut hasher = Sha256::new();
        hasher.update(request.pledge_id.as_bytes());
        hasher.update(self.feed_secret.as_bytes());
        let digest = hasher.finalize();
        format!("fnd1{}", hex::encode(&digest[..20]))
    }
}

#[async_trait]
impl ProviderConnector for CryptoConnector {
    fn provider(&self) -> Provider {
        Provider::Crypto
    }

    async fn create_intent(&self, request: &IntentRequest) -> Result<ProviderReference> {
        let address = self.deposit_address(request);

        info!(
            pledge_id = %request.pledge_id,
            amount = %request.amount,
            address = %address,
            "Crypto deposit address generated"
        );

        Ok(ProviderReference::new(address))
    }

    fn verify_and_parse(&self, raw_payload: &[u8], signature_header: &str) -> Result<NativeEvent> {
        let expected = self.expected_signature(raw_payload);
        if signature_header != expected {
            return Err(Error::Authentication {
                provider: self.name().to_string(),
                reason: "feed signature mismatch".to_string(),
            });
        }

        let payload: ChainPayload =
            serde_json::from_slice(raw_payload).map_err(|e| Error::MalformedPayload {
                provider: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let amount = Decimal::from_str(&payload.amount).map_err(|e| Error::MalformedPayload {
            provider: self.name().to_string(),
            reason: format!("bad amount {:?}: {}", payload.amount, e),
        })?;

        debug!(tx_hash = %payload.tx_hash, address = %payload.address, "Chain event verified");

        Ok(NativeEvent {
            event_id: payload.tx_hash,
            reference: payload.address,
            succeeded: payload.confirmed,
            amount,
        })
    }

    async fn issue_refund(
        &self,
        reference: &ProviderReference,
        amount: Decimal,
    ) -> Result<RefundOutcome> {
        // On-chain refunds are broadcast manually; confirmation arrives
        // through the chain watcher feed, not this call.
        warn!(
            reference = %reference,
            amount = %amount,
            "Crypto refund accepted for manual broadcast"
        );
        Ok(RefundOutcome::Pending)
    }

    fn name(&self) -> &str {
        "crypto"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn connector() -> CryptoConnector {
        CryptoConnector::new("crypto-secret")
    }

    #[tokio::test]
    async fn test_deposit_address_deterministic() {
        let request = IntentRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Decimal::new(10_000, 2),
        );

        let first = connector().create_intent(&request).await.unwrap();
        let second = connector().create_intent(&request).await.unwrap();

        assert_eq!(first, second);
        assert!(first.as_str().starts_with("fnd1"));
        assert_eq!(first.as_str().len(), 4 + 40);
    }

    #[test]
    fn test_verify_and_parse_confirmed() {
        let body = r#"{"tx_hash":"0xabc","address":"fnd1deadbeef","confirmed":true,"amount":"100.00"}"#;
        let sig = connector().expected_signature(body.as_bytes());

        let event = connector().verify_and_parse(body.as_bytes(), &sig).unwrap();
        assert_eq!(event.event_id, "0xabc");
        assert_eq!(event.reference, "fnd1deadbeef");
        assert!(event.succeeded);
        assert_eq!(event.amount, Decimal::new(10_000, 2));
    }

    #[test]
    fn test_bad_signature_rejected() {
        let body = r#"{"tx_hash":"0xabc","address":"fnd1deadbeef","confirmed":true,"amount":"100.00"}"#;

        let result = connector().verify_and_parse(body.as_bytes(), "tampered");
        assert!(matches!(result, Err(Error::Authentication { .. })));
    }

    #[tokio::test]
    async fn test_refund_is_always_pending() {
        let outcome = connector()
            .issue_refund(&ProviderReference::new("fnd1deadbeef"), Decimal::new(100, 0))
            .await
            .unwrap();
        assert_eq!(outcome, RefundOutcome::Pending);
    }
}
