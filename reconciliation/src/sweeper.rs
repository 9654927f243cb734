//! Deadline sweeper
//!
//! Closes out campaigns whose funding window has elapsed: Active with the
//! goal met becomes Successful, Active short of the goal becomes Failed.
//! The sweep is stateless and idempotent — the Active precondition guards
//! re-fire, and the raised amount is re-read under the campaign lock at
//! transition time, so sweeping concurrently with ongoing reconciliation is
//! safe.
//!
//! `sweep_once` is invokable on any schedule or on demand; `run` drives it
//! on a fixed interval.

use crate::{
    outbound::{DomainEventKind, OutboundEvents},
    Result,
};
use chrono::{DateTime, Utc};
use funding_core::{types::CampaignStatus, CampaignLocks, Metrics, Storage};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Outcome of one sweep pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Campaigns whose deadline had passed
    pub examined: usize,

    /// Transitions to Successful
    pub successful: usize,

    /// Transitions to Failed
    pub failed: usize,

    /// Sweep timestamp
    pub swept_at: DateTime<Utc>,
}

/// Deadline sweeper
pub struct DeadlineSweeper {
    /// Funding ledger storage
    storage: Arc<Storage>,

    /// Per-campaign serialization domain (shared with the engine)
    locks: Arc<CampaignLocks>,

    /// Post-commit domain events
    outbound: OutboundEvents,

    /// Metrics
    metrics: Arc<Metrics>,

    /// Sweep period for `run`
    interval: Duration,

    /// Most recent report
    last_report: RwLock<Option<SweepReport>>,
}

impl DeadlineSweeper {
    /// Create new deadline sweeper
    pub fn new(
        storage: Arc<Storage>,
        locks: Arc<CampaignLocks>,
        outbound: OutboundEvents,
        metrics: Arc<Metrics>,
        interval: Duration,
    ) -> Self {
        Self {
            storage,
            locks,
            outbound,
            metrics,
            interval,
            last_report: RwLock::new(None),
        }
    }

    /// Sweep all Active campaigns whose deadline has passed at `now`
    ///
    /// Each campaign's transition is an independent atomic update; a
    /// failure on one campaign is logged and does not stop the pass.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let candidates = self.storage.active_campaigns()?;

        let mut report = SweepReport {
            examined: 0,
            successful: 0,
            failed: 0,
            swept_at: now,
        };

        for campaign in candidates {
            if !campaign.deadline_passed(now) {
                continue;
            }
            report.examined += 1;

            let _guard = self.locks.acquire(campaign.id).await;

            // Re-read under the lock: the raised amount may have moved
            // since the scan, and another sweep may have closed it already
            let current = match self.storage.get_campaign(campaign.id) {
                Ok(current) => current,
                Err(e) => {
                    error!(campaign_id = %campaign.id, error = %e, "Sweep re-read failed");
                    continue;
                }
            };
            if current.status != CampaignStatus::Active {
                continue;
            }

            let target = if current.goal_met() {
                CampaignStatus::Successful
            } else {
                CampaignStatus::Failed
            };

            match self.storage.compare_and_transition_campaign(
                campaign.id,
                CampaignStatus::Active,
                target,
            ) {
                Ok(closed) => {
                    self.metrics.campaigns_closed.inc();
                    match target {
                        CampaignStatus::Successful => report.successful += 1,
                        _ => report.failed += 1,
                    }
                    self.outbound.publish(DomainEventKind::CampaignClosed {
                        campaign_id: closed.id,
                        status: closed.status,
                        raised_amount: closed.raised_amount,
                        goal_amount: closed.goal_amount,
                    });
                }
                Err(e) => {
                    error!(campaign_id = %campaign.id, error = %e, "Campaign close failed");
                }
            }
        }

        *self.last_report.write() = Some(report.clone());
        Ok(report)
    }

    /// Most recent sweep report, if any pass has run
    pub fn last_report(&self) -> Option<SweepReport> {
        self.last_report.read().clone()
    }

    /// Drive `sweep_once` on the configured interval
    pub async fn run(self: Arc<Self>) {
        info!(interval_secs = self.interval.as_secs(), "Deadline sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match self.sweep_once(Utc::now()).await {
                Ok(report) if report.examined > 0 => {
                    info!(
                        examined = report.examined,
                        successful = report.successful,
                        failed = report.failed,
                        "Sweep pass complete"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Sweep pass failed");
                }
            }
        }
    }
}
