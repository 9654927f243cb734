//! Connector registry
//!
//! Maps each provider in the closed set to its connector. Built once from
//! configuration and shared behind an `Arc`.

use crate::{
    card::CardCheckoutConnector, connector::ProviderConnector, crypto::CryptoConnector,
    wallet::WalletNetworkConnector, Error, Result,
};
use funding_core::config::ProviderConfig;
use funding_core::types::Provider;
use std::collections::HashMap;
use std::sync::Arc;

/// Provider connector registry
pub struct ProviderRegistry {
    connectors: HashMap<Provider, Arc<dyn ProviderConnector>>,
}

impl ProviderRegistry {
    /// Build the full registry from provider configuration
    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut connectors: HashMap<Provider, Arc<dyn ProviderConnector>> = HashMap::new();

        connectors.insert(
            Provider::CardCheckout,
            Arc::new(CardCheckoutConnector::new(&config.card_webhook_secret)),
        );
        connectors.insert(
            Provider::WalletNetwork,
            Arc::new(WalletNetworkConnector::new(&config.wallet_webhook_secret)),
        );
        connectors.insert(
            Provider::Crypto,
            Arc::new(CryptoConnector::new(&config.crypto_webhook_secret)),
        );

        Self { connectors }
    }

    /// Create an empty registry (connectors registered individually)
    pub fn empty() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }

    /// Register a connector, replacing any existing one for its provider
    pub fn register(&mut self, connector: Arc<dyn ProviderConnector>) {
        self.connectors.insert(connector.provider(), connector);
    }

    /// Look up the connector for a provider
    pub fn get(&self, provider: Provider) -> Result<Arc<dyn ProviderConnector>> {
        self.connectors
            .get(&provider)
            .cloned()
            .ok_or_else(|| Error::UnsupportedProvider(provider.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_from_config_covers_all_providers() {
        let registry = ProviderRegistry::from_config(&ProviderConfig::default());

        for provider in Provider::ALL {
            let connector = registry.get(provider).unwrap();
            assert_eq!(connector.provider(), provider);
        }
    }

    #[test]
    fn test_empty_registry_rejects_lookup() {
        let registry = ProviderRegistry::empty();
        let result = registry.get(Provider::CardCheckout);
        assert!(matches!(result, Err(Error::UnsupportedProvider(_))));
    }
}
