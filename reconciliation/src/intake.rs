//! Pledge intake
//!
//! Creates a Pending pledge with a provider-specific payment intent. The
//! goal-cap decision lives here, not in the engine: once a pledge exists,
//! its settlement event is applied even past the goal.

use crate::Result;
use funding_core::{
    types::{CampaignStatus, Pledge, Provider},
    Error as LedgerError, GoalCapPolicy, Storage,
};
use provider_adapters::{IntentRequest, ProviderRegistry};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A backer's request to pledge
#[derive(Debug, Clone)]
pub struct PledgeRequest {
    /// Campaign to fund
    pub campaign_id: Uuid,

    /// Backer making the pledge
    pub backer_id: Uuid,

    /// Pledged amount
    pub amount: Decimal,

    /// Provider to settle through
    pub provider: Provider,

    /// Reward tier chosen, if any
    pub reward_tier: Option<String>,

    /// Hide backer identity on public listings
    pub anonymous: bool,
}

/// Pledge intake flow
pub struct PledgeIntake {
    /// Funding ledger storage
    storage: Arc<Storage>,

    /// Provider connectors
    registry: Arc<ProviderRegistry>,

    /// Over-goal handling
    goal_cap_policy: GoalCapPolicy,
}

impl PledgeIntake {
    /// Create new pledge intake
    pub fn new(
        storage: Arc<Storage>,
        registry: Arc<ProviderRegistry>,
        goal_cap_policy: GoalCapPolicy,
    ) -> Self {
        Self {
            storage,
            registry,
            goal_cap_policy,
        }
    }

    /// Create a Pending pledge with its payment intent
    pub async fn create_pledge(&self, request: PledgeRequest) -> Result<Pledge> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::Policy("pledge amount must be positive".to_string()).into());
        }

        let campaign = self.storage.get_campaign(request.campaign_id)?;

        if campaign.status != CampaignStatus::Active {
            return Err(LedgerError::Policy(format!(
                "campaign {} is not accepting pledges",
                campaign.id
            ))
            .into());
        }

        if campaign.creator_id == request.backer_id {
            return Err(LedgerError::Policy(
                "campaign creator cannot pledge to their own campaign".to_string(),
            )
            .into());
        }

        if campaign.raised_amount + request.amount > campaign.goal_amount {
            match self.goal_cap_policy {
                GoalCapPolicy::AllowOverfunding => {
                    warn!(
                        campaign_id = %campaign.id,
                        amount = %request.amount,
                        raised = %campaign.raised_amount,
                        goal = %campaign.goal_amount,
                        "Pledge exceeds campaign goal"
                    );
                }
                GoalCapPolicy::RejectOverGoal => {
                    return Err(LedgerError::Policy(format!(
                        "pledge of {} would exceed campaign goal",
                        request.amount
                    ))
                    .into());
                }
            }
        }

        let mut pledge = Pledge::new(
            request.campaign_id,
            request.backer_id,
            request.amount,
            request.provider,
        );
        if let Some(tier) = request.reward_tier {
            pledge = pledge.with_reward_tier(tier);
        }
        if request.anonymous {
            pledge = pledge.anonymous();
        }

        let intent = IntentRequest::new(
            pledge.id,
            request.campaign_id,
            request.backer_id,
            request.amount,
        );
        let connector = self.registry.get(request.provider)?;
        let reference = connector.create_intent(&intent).await?;

        let pledge = pledge.with_reference(reference);
        self.storage.create_pledge(&pledge)?;

        info!(
            pledge_id = %pledge.id,
            campaign_id = %pledge.campaign_id,
            provider = %pledge.provider,
            amount = %pledge.amount,
            "Pledge created"
        );

        Ok(pledge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::Utc;
    use funding_core::types::{Campaign, PledgeStatus};
    use funding_core::Config;

    struct Harness {
        intake: PledgeIntake,
        storage: Arc<Storage>,
        _dir: tempfile::TempDir,
    }

    fn harness(policy: GoalCapPolicy) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = dir.path().to_path_buf();

        let storage = Arc::new(Storage::open(&config).unwrap());
        let registry = Arc::new(ProviderRegistry::from_config(&config.providers));
        let intake = PledgeIntake::new(storage.clone(), registry, policy);

        Harness {
            intake,
            storage,
            _dir: dir,
        }
    }

    fn seed_campaign(h: &Harness, creator_id: Uuid, goal_cents: i64) -> Campaign {
        let campaign = Campaign::new(
            "Intake test",
            creator_id,
            Decimal::new(goal_cents, 2),
            Utc::now() + chrono::Duration::days(30),
        );
        h.storage.create_campaign(&campaign).unwrap();
        campaign
    }

    fn request(campaign_id: Uuid, amount_cents: i64) -> PledgeRequest {
        PledgeRequest {
            campaign_id,
            backer_id: Uuid::new_v4(),
            amount: Decimal::new(amount_cents, 2),
            provider: Provider::CardCheckout,
            reward_tier: None,
            anonymous: false,
        }
    }

    #[tokio::test]
    async fn test_pledge_created_pending_with_reference() {
        let h = harness(GoalCapPolicy::AllowOverfunding);
        let campaign = seed_campaign(&h, Uuid::new_v4(), 100_000);

        let pledge = h.intake.create_pledge(request(campaign.id, 5_000)).await.unwrap();

        assert_eq!(pledge.status, PledgeStatus::Pending);
        let reference = pledge.provider_reference.clone().unwrap();
        assert!(reference.as_str().starts_with("cs_"));

        // Persisted and resolvable by reference
        let stored = h.storage.get_pledge_by_reference(&reference).unwrap();
        assert_eq!(stored.id, pledge.id);
    }

    #[tokio::test]
    async fn test_creator_cannot_pledge_own_campaign() {
        let h = harness(GoalCapPolicy::AllowOverfunding);
        let creator_id = Uuid::new_v4();
        let campaign = seed_campaign(&h, creator_id, 100_000);

        let mut req = request(campaign.id, 5_000);
        req.backer_id = creator_id;

        let result = h.intake.create_pledge(req).await;
        assert!(matches!(result, Err(Error::Ledger(LedgerError::Policy(_)))));
    }

    #[tokio::test]
    async fn test_over_goal_allowed_by_default_policy() {
        let h = harness(GoalCapPolicy::AllowOverfunding);
        let campaign = seed_campaign(&h, Uuid::new_v4(), 1_000);

        // Exceeds the goal; accepted with a warning under the default policy
        let pledge = h.intake.create_pledge(request(campaign.id, 5_000)).await.unwrap();
        assert_eq!(pledge.amount, Decimal::new(5_000, 2));
    }

    #[tokio::test]
    async fn test_over_goal_rejected_under_cap_policy() {
        let h = harness(GoalCapPolicy::RejectOverGoal);
        let campaign = seed_campaign(&h, Uuid::new_v4(), 1_000);

        let result = h.intake.create_pledge(request(campaign.id, 5_000)).await;
        assert!(matches!(result, Err(Error::Ledger(LedgerError::Policy(_)))));
    }

    #[tokio::test]
    async fn test_closed_campaign_rejects_pledges() {
        let h = harness(GoalCapPolicy::AllowOverfunding);
        let campaign = seed_campaign(&h, Uuid::new_v4(), 100_000);
        h.storage
            .compare_and_transition_campaign(
                campaign.id,
                CampaignStatus::Active,
                CampaignStatus::Failed,
            )
            .unwrap();

        let result = h.intake.create_pledge(request(campaign.id, 5_000)).await;
        assert!(matches!(result, Err(Error::Ledger(LedgerError::Policy(_)))));
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let h = harness(GoalCapPolicy::AllowOverfunding);
        let campaign = seed_campaign(&h, Uuid::new_v4(), 100_000);

        let result = h.intake.create_pledge(request(campaign.id, 0)).await;
        assert!(matches!(result, Err(Error::Ledger(LedgerError::Policy(_)))));
    }
}
