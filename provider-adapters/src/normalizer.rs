//! Settlement event normalizer
//!
//! Pure translation: authenticate a provider-native payload through its
//! connector, then map the native shape onto the canonical
//! `SettlementEvent`. Rejections happen here, before the reconciliation
//! engine is reached, so a malformed or unauthenticated delivery never
//! consumes an idempotency slot.

use crate::{registry::ProviderRegistry, Result};
use funding_core::types::{Provider, ProviderReference, SettlementEvent, SettlementOutcome};
use std::sync::Arc;
use tracing::debug;

/// Settlement event normalizer
pub struct SettlementEventNormalizer {
    registry: Arc<ProviderRegistry>,
}

impl SettlementEventNormalizer {
    /// Create new normalizer over a connector registry
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Authenticate and translate one raw webhook delivery
    pub fn normalize(
        &self,
        provider: Provider,
        raw_payload: &[u8],
        signature_header: &str,
    ) -> Result<SettlementEvent> {
        let connector = self.registry.get(provider)?;
        let native = connector.verify_and_parse(raw_payload, signature_header)?;

        let event = SettlementEvent {
            provider_event_id: native.event_id,
            pledge_reference: ProviderReference::new(native.reference),
            provider,
            outcome: if native.succeeded {
                SettlementOutcome::Success
            } else {
                SettlementOutcome::Failure
            },
            settled_amount: native.amount,
        };

        debug!(
            provider = %provider,
            provider_event_id = %event.provider_event_id,
            outcome = ?event.outcome,
            "Settlement event normalized"
        );

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardCheckoutConnector;
    use crate::connector::ProviderConnector;
    use funding_core::config::ProviderConfig;
    use rust_decimal::Decimal;
    use sha2::{Digest, Sha256};

    fn normalizer() -> SettlementEventNormalizer {
        let registry = ProviderRegistry::from_config(&ProviderConfig::default());
        SettlementEventNormalizer::new(Arc::new(registry))
    }

    fn card_signature(body: &str) -> String {
        // Matches the card connector's scheme for the default dev secret
        let mut hasher = Sha256::new();
        hasher.update(b"card-secret-dev");
        hasher.update(b".");
        hasher.update(body.as_bytes());
        hex::encode(hasher.finalize())
    }

    #[test]
    fn test_normalize_card_success() {
        let body = r#"{"id":"evt_9","type":"checkout.session.completed","session_id":"cs_xyz","amount_cents":7500}"#;

        let event = normalizer()
            .normalize(Provider::CardCheckout, body.as_bytes(), &card_signature(body))
            .unwrap();

        assert_eq!(event.provider_event_id, "evt_9");
        assert_eq!(event.pledge_reference.as_str(), "cs_xyz");
        assert_eq!(event.provider, Provider::CardCheckout);
        assert_eq!(event.outcome, SettlementOutcome::Success);
        assert_eq!(event.settled_amount, Decimal::new(7_500, 2));
    }

    #[test]
    fn test_normalize_card_failure_outcome() {
        let body = r#"{"id":"evt_10","type":"checkout.session.failed","session_id":"cs_xyz","amount_cents":7500}"#;

        let event = normalizer()
            .normalize(Provider::CardCheckout, body.as_bytes(), &card_signature(body))
            .unwrap();

        assert_eq!(event.outcome, SettlementOutcome::Failure);
    }

    #[test]
    fn test_normalize_rejects_unauthenticated_payload() {
        let body = r#"{"id":"evt_11","type":"checkout.session.completed","session_id":"cs_xyz","amount_cents":7500}"#;

        let result = normalizer().normalize(Provider::CardCheckout, body.as_bytes(), "forged");
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_uses_per_provider_verification() {
        // A validly-signed card payload must not pass as a wallet payload
        let body = r#"{"id":"evt_12","type":"checkout.session.completed","session_id":"cs_xyz","amount_cents":7500}"#;

        let result = normalizer().normalize(Provider::WalletNetwork, body.as_bytes(), &card_signature(body));
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_connector_signature_matches_helper() {
        // Guards the test helper against drift from the connector scheme
        let connector = CardCheckoutConnector::new("card-secret-dev");
        let body = r#"{"id":"evt_13","type":"checkout.session.completed","session_id":"cs_k","amount_cents":100}"#;
        assert!(connector.verify_and_parse(body.as_bytes(), &card_signature(body)).is_ok());
    }
}
