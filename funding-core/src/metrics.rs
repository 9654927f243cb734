//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the reconciliation pipeline.
//!
//! # Metrics
//!
//! - `funding_events_applied_total` - Settlement events applied to the ledger
//! - `funding_duplicate_events_total` - Duplicate deliveries suppressed
//! - `funding_amount_mismatch_total` - Events rejected for amount mismatch
//! - `funding_invalid_transition_total` - Events rejected for status conflicts
//! - `funding_refunds_total` - Completed refund reversals
//! - `funding_manual_refunds_total` - Crypto refunds parked for manual confirmation
//! - `funding_campaigns_closed_total` - Sweeper transitions out of Active
//! - `funding_apply_duration_seconds` - Reconciliation apply latency

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Settlement events applied
    pub events_applied: IntCounter,

    /// Duplicate deliveries suppressed by the idempotency record
    pub duplicate_events: IntCounter,

    /// Amount-mismatch rejections (manual reconciliation required)
    pub amount_mismatches: IntCounter,

    /// Invalid-transition rejections (flagged for audit)
    pub invalid_transitions: IntCounter,

    /// Refund reversals committed
    pub refunds: IntCounter,

    /// Crypto refunds awaiting out-of-band confirmation
    pub manual_refunds: IntCounter,

    /// Campaigns transitioned out of Active by the sweeper
    pub campaigns_closed: IntCounter,

    /// Apply latency histogram
    pub apply_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let events_applied = IntCounter::with_opts(Opts::new(
            "funding_events_applied_total",
            "Settlement events applied to the ledger",
        ))?;
        registry.register(Box::new(events_applied.clone()))?;

        let duplicate_events = IntCounter::with_opts(Opts::new(
            "funding_duplicate_events_total",
            "Duplicate deliveries suppressed",
        ))?;
        registry.register(Box::new(duplicate_events.clone()))?;

        let amount_mismatches = IntCounter::with_opts(Opts::new(
            "funding_amount_mismatch_total",
            "Events rejected for amount mismatch",
        ))?;
        registry.register(Box::new(amount_mismatches.clone()))?;

        let invalid_transitions = IntCounter::with_opts(Opts::new(
            "funding_invalid_transition_total",
            "Events rejected for status conflicts",
        ))?;
        registry.register(Box::new(invalid_transitions.clone()))?;

        let refunds = IntCounter::with_opts(Opts::new(
            "funding_refunds_total",
            "Completed refund reversals",
        ))?;
        registry.register(Box::new(refunds.clone()))?;

        let manual_refunds = IntCounter::with_opts(Opts::new(
            "funding_manual_refunds_total",
            "Crypto refunds parked for manual confirmation",
        ))?;
        registry.register(Box::new(manual_refunds.clone()))?;

        let campaigns_closed = IntCounter::with_opts(Opts::new(
            "funding_campaigns_closed_total",
            "Campaigns transitioned out of Active",
        ))?;
        registry.register(Box::new(campaigns_closed.clone()))?;

        let apply_duration = Histogram::with_opts(
            HistogramOpts::new(
                "funding_apply_duration_seconds",
                "Reconciliation apply latency",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(apply_duration.clone()))?;

        Ok(Self {
            events_applied,
            duplicate_events,
            amount_mismatches,
            invalid_transitions,
            refunds,
            manual_refunds,
            campaigns_closed,
            apply_duration,
            registry,
        })
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.events_applied.get(), 0);
        assert_eq!(metrics.duplicate_events.get(), 0);
    }

    #[test]
    fn test_counters_increment() {
        let metrics = Metrics::new().unwrap();
        metrics.events_applied.inc();
        metrics.events_applied.inc();
        metrics.duplicate_events.inc();

        assert_eq!(metrics.events_applied.get(), 2);
        assert_eq!(metrics.duplicate_events.get(), 1);
    }

    #[test]
    fn test_independent_registries() {
        // Two collectors must not collide on registration
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.events_applied.inc();
        assert_eq!(b.events_applied.get(), 0);
    }
}
