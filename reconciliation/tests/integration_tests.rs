//! End-to-end flows: raw webhook bytes through the normalizer, engine,
//! refund coordinator, and sweeper against a real storage directory.

use anyhow::Result;
use chrono::Utc;
use funding_core::{
    types::{Campaign, CampaignStatus, PledgeStatus, Provider},
    CampaignLocks, Config, GoalCapPolicy, Metrics, Storage,
};
use provider_adapters::{ProviderRegistry, SettlementEventNormalizer};
use reconciliation::{
    DeadlineSweeper, OutboundEvents, PledgeIntake, PledgeRequest, ReconciliationEngine,
    RefundCoordinator, RefundResult,
};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct System {
    intake: PledgeIntake,
    normalizer: SettlementEventNormalizer,
    engine: Arc<ReconciliationEngine>,
    refunds: RefundCoordinator,
    sweeper: DeadlineSweeper,
    storage: Arc<Storage>,
    config: Config,
    _dir: tempfile::TempDir,
}

fn system() -> System {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = dir.path().to_path_buf();

    let storage = Arc::new(Storage::open(&config).unwrap());
    let locks = Arc::new(CampaignLocks::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    let outbound = OutboundEvents::new(256);
    let registry = Arc::new(ProviderRegistry::from_config(&config.providers));

    let engine = Arc::new(ReconciliationEngine::new(
        storage.clone(),
        locks.clone(),
        outbound.clone(),
        metrics.clone(),
        &config,
    ));

    System {
        intake: PledgeIntake::new(storage.clone(), registry.clone(), GoalCapPolicy::AllowOverfunding),
        normalizer: SettlementEventNormalizer::new(registry.clone()),
        engine: engine.clone(),
        refunds: RefundCoordinator::new(storage.clone(), registry, engine, metrics.clone()),
        sweeper: DeadlineSweeper::new(
            storage.clone(),
            locks,
            outbound,
            metrics,
            Duration::from_secs(60),
        ),
        storage,
        config,
        _dir: dir,
    }
}

fn seed_campaign(system: &System, goal_cents: i64) -> Campaign {
    let campaign = Campaign::new(
        "Integration campaign",
        Uuid::new_v4(),
        Decimal::new(goal_cents, 2),
        Utc::now() + chrono::Duration::days(30),
    );
    system.storage.create_campaign(&campaign).unwrap();
    campaign
}

fn card_signature(config: &Config, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config.providers.card_webhook_secret.as_bytes());
    hasher.update(b".");
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

fn wallet_signature(config: &Config, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher.update(config.providers.wallet_webhook_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn crypto_signature(config: &Config, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config.providers.crypto_webhook_secret.as_bytes());
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

#[tokio::test]
async fn test_card_pledge_settles_refunds_and_campaign_closes() -> Result<()> {
    let system = system();
    let campaign = seed_campaign(&system, 5_000);

    // Backer pledges the full goal through card checkout
    let pledge = system
        .intake
        .create_pledge(PledgeRequest {
            campaign_id: campaign.id,
            backer_id: Uuid::new_v4(),
            amount: Decimal::new(5_000, 2),
            provider: Provider::CardCheckout,
            reward_tier: Some("supporter".to_string()),
            anonymous: false,
        })
        .await?;
    let reference = pledge.provider_reference.clone().unwrap();

    // Provider webhook: checkout completed
    let body = serde_json::json!({
        "id": "evt_int_1",
        "type": "checkout.session.completed",
        "session_id": reference.as_str(),
        "amount_cents": 5000,
    })
    .to_string();
    let event = system.normalizer.normalize(
        Provider::CardCheckout,
        body.as_bytes(),
        &card_signature(&system.config, &body),
    )?;

    let result = system.engine.apply(event).await?;
    assert_eq!(result.pledge_status, PledgeStatus::Completed);
    assert_eq!(
        system.storage.get_campaign(campaign.id).unwrap().raised_amount,
        Decimal::new(5_000, 2)
    );

    // Goal met: a sweep after the deadline closes the campaign Successful
    let report = system
        .sweeper
        .sweep_once(Utc::now() + chrono::Duration::days(31))
        .await?;
    assert_eq!(report.successful, 1);
    assert_eq!(
        system.storage.get_campaign(campaign.id).unwrap().status,
        CampaignStatus::Successful
    );

    // Refund reverses the ledger exactly; the campaign status stays closed
    let refund = system
        .refunds
        .refund(pledge.id, pledge.amount, "order cancelled")
        .await?;
    assert!(matches!(refund, RefundResult::Refunded(_)));
    let closed = system.storage.get_campaign(campaign.id).unwrap();
    assert_eq!(closed.raised_amount, Decimal::ZERO);
    assert_eq!(closed.status, CampaignStatus::Successful);

    Ok(())
}

#[tokio::test]
async fn test_wallet_denial_fails_pledge_and_campaign_fails_at_deadline() -> Result<()> {
    let system = system();
    let campaign = seed_campaign(&system, 10_000);

    let pledge = system
        .intake
        .create_pledge(PledgeRequest {
            campaign_id: campaign.id,
            backer_id: Uuid::new_v4(),
            amount: Decimal::new(10_000, 2),
            provider: Provider::WalletNetwork,
            reward_tier: None,
            anonymous: true,
        })
        .await?;
    let reference = pledge.provider_reference.clone().unwrap();

    let body = serde_json::json!({
        "notification_id": "WH-int-1",
        "payment_id": reference.as_str(),
        "state": "DENIED",
        "total": "100.00",
    })
    .to_string();
    let event = system.normalizer.normalize(
        Provider::WalletNetwork,
        body.as_bytes(),
        &wallet_signature(&system.config, &body),
    )?;

    let result = system.engine.apply(event).await?;
    assert_eq!(result.pledge_status, PledgeStatus::Failed);
    assert_eq!(
        system.storage.get_campaign(campaign.id).unwrap().raised_amount,
        Decimal::ZERO
    );

    // Nothing raised: the sweep fails the campaign
    let report = system
        .sweeper
        .sweep_once(Utc::now() + chrono::Duration::days(31))
        .await?;
    assert_eq!(report.failed, 1);
    assert_eq!(
        system.storage.get_campaign(campaign.id).unwrap().status,
        CampaignStatus::Failed
    );

    Ok(())
}

#[tokio::test]
async fn test_crypto_flow_with_manual_refund_window() -> Result<()> {
    let system = system();
    let campaign = seed_campaign(&system, 20_000);

    let pledge = system
        .intake
        .create_pledge(PledgeRequest {
            campaign_id: campaign.id,
            backer_id: Uuid::new_v4(),
            amount: Decimal::new(20_000, 2),
            provider: Provider::Crypto,
            reward_tier: None,
            anonymous: false,
        })
        .await?;
    let address = pledge.provider_reference.clone().unwrap();
    assert!(address.as_str().starts_with("fnd1"));

    // Chain watcher confirms the deposit
    let body = serde_json::json!({
        "tx_hash": "0xint_deposit",
        "address": address.as_str(),
        "confirmed": true,
        "amount": "200.00",
    })
    .to_string();
    let event = system.normalizer.normalize(
        Provider::Crypto,
        body.as_bytes(),
        &crypto_signature(&system.config, &body),
    )?;
    system.engine.apply(event).await?;
    assert_eq!(
        system.storage.get_campaign(campaign.id).unwrap().raised_amount,
        Decimal::new(20_000, 2)
    );

    // On-chain refunds cannot confirm synchronously: ledger stays put
    let refund = system
        .refunds
        .refund(pledge.id, pledge.amount, "project abandoned")
        .await?;
    assert!(matches!(refund, RefundResult::PendingManual { .. }));
    assert_eq!(
        system.storage.get_pledge(pledge.id).unwrap().status,
        PledgeStatus::Completed
    );

    // The out-of-band confirmation arrives through the same signed feed
    let body = serde_json::json!({
        "tx_hash": "0xint_refund",
        "address": address.as_str(),
        "confirmed": true,
        "amount": "200.00",
    })
    .to_string();
    let confirmation = system.normalizer.normalize(
        Provider::Crypto,
        body.as_bytes(),
        &crypto_signature(&system.config, &body),
    )?;
    let result = system.engine.apply_refund(confirmation).await?;

    assert_eq!(result.pledge_status, PledgeStatus::Refunded);
    assert_eq!(
        system.storage.get_campaign(campaign.id).unwrap().raised_amount,
        Decimal::ZERO
    );

    Ok(())
}

#[tokio::test]
async fn test_forged_webhook_never_reaches_the_ledger() -> Result<()> {
    let system = system();
    let campaign = seed_campaign(&system, 5_000);

    let pledge = system
        .intake
        .create_pledge(PledgeRequest {
            campaign_id: campaign.id,
            backer_id: Uuid::new_v4(),
            amount: Decimal::new(5_000, 2),
            provider: Provider::CardCheckout,
            reward_tier: None,
            anonymous: false,
        })
        .await?;
    let reference = pledge.provider_reference.clone().unwrap();

    let body = serde_json::json!({
        "id": "evt_forged",
        "type": "checkout.session.completed",
        "session_id": reference.as_str(),
        "amount_cents": 5000,
    })
    .to_string();

    let result = system
        .normalizer
        .normalize(Provider::CardCheckout, body.as_bytes(), "forged-signature");
    assert!(result.is_err());

    // Rejected before the engine: no idempotency slot, no state change
    assert!(system.storage.recorded_result("evt_forged").unwrap().is_none());
    assert_eq!(
        system.storage.get_pledge(pledge.id).unwrap().status,
        PledgeStatus::Pending
    );

    Ok(())
}
