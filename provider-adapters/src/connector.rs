//! Provider connector interface

use crate::{types::*, Result};
use async_trait::async_trait;
use funding_core::types::{Provider, ProviderReference};
use rust_decimal::Decimal;

/// Provider connector trait
///
/// One implementation per provider in the closed set. `verify_and_parse`
/// is the authenticity boundary: nothing unverified crosses it.
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    /// Provider this connector serves
    fn provider(&self) -> Provider;

    /// Create a payment intent, returning the provider's reference
    async fn create_intent(&self, request: &IntentRequest) -> Result<ProviderReference>;

    /// Authenticate a raw webhook payload and parse the native event
    fn verify_and_parse(&self, raw_payload: &[u8], signature_header: &str) -> Result<NativeEvent>;

    /// Instruct the provider to refund a settled payment
    async fn issue_refund(
        &self,
        reference: &ProviderReference,
        amount: Decimal,
    ) -> Result<RefundOutcome>;

    /// Get connector name
    fn name(&self) -> &str;
}
