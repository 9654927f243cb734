//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `campaigns` - Campaign aggregates (key: campaign id)
//! - `pledges` - Pledge records (key: pledge id)
//! - `pledge_refs` - Secondary index provider reference -> pledge id
//! - `idempotency` - Applied settlement events (key: provider event id,
//!   value: the recorded `ReconciliationResult`)
//!
//! The reconciliation commit (`commit_reconciliation`) writes the pledge
//! transition, the campaign adjustment, and the idempotency record in one
//! `WriteBatch`: either all three persist or none do.

use crate::{
    error::{Error, Result},
    types::{
        Campaign, CampaignStatus, Pledge, PledgeStatus, ProviderReference, ReconciliationResult,
    },
    Config,
};
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_CAMPAIGNS: &str = "campaigns";
const CF_PLEDGES: &str = "pledges";
const CF_PLEDGE_REFS: &str = "pledge_refs";
const CF_IDEMPOTENCY: &str = "idempotency";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_CAMPAIGNS, Self::cf_options_hot()),
            ColumnFamilyDescriptor::new(CF_PLEDGES, Self::cf_options_hot()),
            ColumnFamilyDescriptor::new(CF_PLEDGE_REFS, Self::cf_options_index()),
            ColumnFamilyDescriptor::new(CF_IDEMPOTENCY, Self::cf_options_cold()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened funding ledger storage");

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_hot() -> Options {
        let mut opts = Options::default();
        // Campaigns and pledges are read on every reconciliation, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_index() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_options_cold() -> Options {
        let mut opts = Options::default();
        // Idempotency records are written once and rarely read back
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Campaign operations

    /// Create campaign
    pub fn create_campaign(&self, campaign: &Campaign) -> Result<()> {
        let cf = self.cf_handle(CF_CAMPAIGNS)?;
        let key = campaign.id.as_bytes();

        if self.db.get_cf(cf, key)?.is_some() {
            return Err(Error::Storage(format!(
                "Campaign already exists: {}",
                campaign.id
            )));
        }

        let value = bincode::serialize(campaign)?;
        self.db.put_cf(cf, key, &value)?;

        tracing::info!(campaign_id = %campaign.id, goal = %campaign.goal_amount, "Campaign created");

        Ok(())
    }

    /// Get campaign by ID
    pub fn get_campaign(&self, campaign_id: Uuid) -> Result<Campaign> {
        let cf = self.cf_handle(CF_CAMPAIGNS)?;

        let value = self
            .db
            .get_cf(cf, campaign_id.as_bytes())?
            .ok_or_else(|| Error::CampaignNotFound(campaign_id.to_string()))?;

        let campaign: Campaign = bincode::deserialize(&value)?;
        Ok(campaign)
    }

    /// Compare-and-transition a campaign's lifecycle status
    ///
    /// The status is re-read here; if another writer already moved it off
    /// `expected`, the call returns a retryable error and writes nothing.
    pub fn compare_and_transition_campaign(
        &self,
        campaign_id: Uuid,
        expected: CampaignStatus,
        new_status: CampaignStatus,
    ) -> Result<Campaign> {
        let cf = self.cf_handle(CF_CAMPAIGNS)?;
        let mut campaign = self.get_campaign(campaign_id)?;

        if campaign.status != expected {
            return Err(Error::Transient(format!(
                "Campaign {} status is {:?}, expected {:?}",
                campaign_id, campaign.status, expected
            )));
        }

        campaign.status = new_status;
        let value = bincode::serialize(&campaign)?;
        self.db.put_cf(cf, campaign_id.as_bytes(), &value)?;

        tracing::info!(
            campaign_id = %campaign_id,
            status = ?new_status,
            raised = %campaign.raised_amount,
            goal = %campaign.goal_amount,
            "Campaign status transitioned"
        );

        Ok(campaign)
    }

    /// All campaigns currently in Active status
    pub fn active_campaigns(&self) -> Result<Vec<Campaign>> {
        let cf = self.cf_handle(CF_CAMPAIGNS)?;
        let iter = self.db.iterator_cf(cf, IteratorMode::Start);

        let mut campaigns = Vec::new();
        for item in iter {
            let (_, value) = item?;
            let campaign: Campaign = bincode::deserialize(&value)?;
            if campaign.status == CampaignStatus::Active {
                campaigns.push(campaign);
            }
        }

        Ok(campaigns)
    }

    // Pledge operations

    /// Create pledge, indexing its provider reference when present
    pub fn create_pledge(&self, pledge: &Pledge) -> Result<()> {
        let cf_pledges = self.cf_handle(CF_PLEDGES)?;
        let cf_refs = self.cf_handle(CF_PLEDGE_REFS)?;

        if self.db.get_cf(cf_pledges, pledge.id.as_bytes())?.is_some() {
            return Err(Error::Storage(format!("Pledge already exists: {}", pledge.id)));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_pledges, pledge.id.as_bytes(), &bincode::serialize(pledge)?);

        if let Some(reference) = &pledge.provider_reference {
            if self.db.get_cf(cf_refs, reference.as_str().as_bytes())?.is_some() {
                return Err(Error::Storage(format!(
                    "Provider reference already indexed: {}",
                    reference
                )));
            }
            batch.put_cf(cf_refs, reference.as_str().as_bytes(), pledge.id.as_bytes());
        }

        self.db.write(batch)?;

        tracing::debug!(
            pledge_id = %pledge.id,
            campaign_id = %pledge.campaign_id,
            amount = %pledge.amount,
            provider = %pledge.provider,
            "Pledge created"
        );

        Ok(())
    }

    /// Get pledge by ID
    pub fn get_pledge(&self, pledge_id: Uuid) -> Result<Pledge> {
        let cf = self.cf_handle(CF_PLEDGES)?;

        let value = self
            .db
            .get_cf(cf, pledge_id.as_bytes())?
            .ok_or_else(|| Error::PledgeNotFound(pledge_id.to_string()))?;

        let pledge: Pledge = bincode::deserialize(&value)?;
        Ok(pledge)
    }

    /// Resolve a provider reference to its pledge
    pub fn get_pledge_by_reference(&self, reference: &ProviderReference) -> Result<Pledge> {
        let cf_refs = self.cf_handle(CF_PLEDGE_REFS)?;

        let id_bytes = self
            .db
            .get_cf(cf_refs, reference.as_str().as_bytes())?
            .ok_or_else(|| Error::PledgeNotFound(reference.to_string()))?;

        let id_bytes: [u8; 16] = id_bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::Storage(format!("Corrupt reference index for {}", reference)))?;

        self.get_pledge(Uuid::from_bytes(id_bytes))
    }

    // Reconciliation operations

    /// Look up the recorded result for an already-applied settlement event
    pub fn recorded_result(&self, provider_event_id: &str) -> Result<Option<ReconciliationResult>> {
        let cf = self.cf_handle(CF_IDEMPOTENCY)?;

        match self.db.get_cf(cf, provider_event_id.as_bytes())? {
            Some(value) => {
                let result: ReconciliationResult = bincode::deserialize(&value)?;
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// Atomically commit one reconciliation effect
    ///
    /// Writes the pledge status transition, the campaign raised-amount
    /// adjustment, and the idempotency record in a single `WriteBatch`.
    /// `pledge` must carry the status read inside the campaign's serialized
    /// scope; the transition is re-checked here so a stale caller cannot
    /// clobber a terminal state.
    pub fn commit_reconciliation(
        &self,
        pledge: &Pledge,
        new_status: PledgeStatus,
        campaign_delta: Decimal,
        provider_event_id: &str,
    ) -> Result<ReconciliationResult> {
        if !pledge.status.can_transition(new_status) {
            return Err(Error::InvalidTransition {
                from: pledge.status,
                to: new_status,
            });
        }

        let mut campaign = self.get_campaign(pledge.campaign_id)?;
        campaign.raised_amount += campaign_delta;

        let mut updated = pledge.clone();
        updated.status = new_status;

        let result = ReconciliationResult {
            provider_event_id: provider_event_id.to_string(),
            pledge_id: pledge.id,
            campaign_id: pledge.campaign_id,
            pledge_status: new_status,
            amount: pledge.amount,
            raised_after: campaign.raised_amount,
            applied_at: Utc::now(),
        };

        let cf_pledges = self.cf_handle(CF_PLEDGES)?;
        let cf_campaigns = self.cf_handle(CF_CAMPAIGNS)?;
        let cf_idempotency = self.cf_handle(CF_IDEMPOTENCY)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_pledges, updated.id.as_bytes(), &bincode::serialize(&updated)?);
        batch.put_cf(
            cf_campaigns,
            campaign.id.as_bytes(),
            &bincode::serialize(&campaign)?,
        );
        batch.put_cf(
            cf_idempotency,
            provider_event_id.as_bytes(),
            &bincode::serialize(&result)?,
        );

        // Atomic commit
        self.db.write(batch)?;

        tracing::info!(
            provider_event_id = %provider_event_id,
            pledge_id = %pledge.id,
            campaign_id = %pledge.campaign_id,
            status = %new_status,
            delta = %campaign_delta,
            raised = %campaign.raised_amount,
            "Reconciliation committed"
        );

        Ok(result)
    }
}
