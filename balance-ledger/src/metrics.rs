//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for reconciliation passes.
//!
//! # Metrics
//!
//! - `balance_reconciliations_total` - Successful reconciliation passes
//! - `balance_reconciliation_failures_total` - Passes aborted by a parse error
//! - `balance_entries_dropped_total` - Chain transfers dropped before the first transfer-in
//! - `balance_reconcile_duration_seconds` - Histogram of pass latencies

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
///
/// Each collector owns its registry, so several can coexist in one process.
#[derive(Clone)]
pub struct Metrics {
    /// Successful passes
    pub reconciliations_total: IntCounter,

    /// Aborted passes
    pub failures_total: IntCounter,

    /// Truncated chain transfers
    pub entries_dropped: IntCounter,

    /// Pass duration histogram
    pub reconcile_duration: Histogram,

    registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> crate::Result<Self> {
        let registry = Arc::new(Registry::new());

        let reconciliations_total = IntCounter::new(
            "balance_reconciliations_total",
            "Total number of successful reconciliation passes",
        )?;
        registry.register(Box::new(reconciliations_total.clone()))?;

        let failures_total = IntCounter::new(
            "balance_reconciliation_failures_total",
            "Total number of reconciliation passes aborted by malformed input",
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        let entries_dropped = IntCounter::new(
            "balance_entries_dropped_total",
            "Chain transfers dropped for preceding the first transfer-in",
        )?;
        registry.register(Box::new(entries_dropped.clone()))?;

        let reconcile_duration = Histogram::with_opts(
            HistogramOpts::new(
                "balance_reconcile_duration_seconds",
                "Histogram of reconciliation latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]),
        )?;
        registry.register(Box::new(reconcile_duration.clone()))?;

        Ok(Self {
            reconciliations_total,
            failures_total,
            entries_dropped,
            reconcile_duration,
            registry,
        })
    }

    /// Record a successful pass
    pub fn record_reconciliation(&self, dropped: usize, duration_seconds: f64) {
        self.reconciliations_total.inc();
        self.entries_dropped.inc_by(dropped as u64);
        self.reconcile_duration.observe(duration_seconds);
    }

    /// Record an aborted pass
    pub fn record_failure(&self) {
        self.failures_total.inc();
    }

    /// Render in the Prometheus text exposition format
    pub fn encode_text(&self) -> crate::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| crate::Error::Metrics(e.to_string()))
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("reconciliations_total", &self.reconciliations_total.get())
            .field("failures_total", &self.failures_total.get())
            .field("entries_dropped", &self.entries_dropped.get())
            .finish_non_exhaustive()
    }
}
