//! Balance reconciliation
//!
//! Merges on-chain transfers (credits) with transfer-in requests (debits)
//! into one ledger with a running balance.
//!
//! # Algorithm
//!
//! 1. Map chain transfers to `+amount` and transfer-ins to `-amount`
//! 2. Stable-sort ascending by instant (transfer-ins win ties)
//! 3. Drop everything before the first transfer-in; no transfer-in → empty
//! 4. Accumulate the running balance from zero, oldest first
//! 5. Reverse for most-recent-first display
//!
//! Any malformed amount or date aborts the pass. A partial ledger would
//! carry a wrong running balance on every later row.

use crate::{
    amount::parse_token_amount,
    metrics::Metrics,
    time::parse_iso8601,
    types::{
        AccountTransfers, ChainTransferEvent, EntryId, EntryOrigin, EntrySource, Ledger,
        LedgerEntry, TransferInEvent,
    },
    Error, Result,
};
use chrono::{DateTime, Utc};
use num_bigint::{BigInt, BigUint};
use std::time::Instant;
use tracing::{debug, warn};

/// Ledger builder with optional metrics
#[derive(Debug, Clone, Default)]
pub struct BalanceReconciler {
    metrics: Option<Metrics>,
}

impl BalanceReconciler {
    /// Create reconciler without metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every pass into `metrics`
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Attached metrics, if any
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Reconcile both event lists into a ledger, most recent entry first
    pub fn reconcile(
        &self,
        chain_transfers: &[ChainTransferEvent],
        transfers_in: &[TransferInEvent],
    ) -> Result<Ledger> {
        let started = Instant::now();

        match reconcile(chain_transfers, transfers_in) {
            Ok(ledger) => {
                debug!(
                    entries = ledger.len(),
                    dropped = ledger.dropped(),
                    "Reconciled balance ledger"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_reconciliation(ledger.dropped(), started.elapsed().as_secs_f64());
                }
                Ok(ledger)
            }
            Err(err) => {
                warn!(error = %err, "Reconciliation aborted");
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure();
                }
                Err(err)
            }
        }
    }

    /// Reconcile a `GET /account/{account}/in` response body
    pub fn reconcile_account(&self, transfers: &AccountTransfers) -> Result<Ledger> {
        self.reconcile(&transfers.chain_transfers, &transfers.transfers_in)
    }
}

/// Entry before the running balance is known
struct Candidate {
    date: DateTime<Utc>,
    delta: BigInt,
    origin: EntryOrigin,
}

/// Reconcile without metrics or logging
pub fn reconcile(
    chain_transfers: &[ChainTransferEvent],
    transfers_in: &[TransferInEvent],
) -> Result<Ledger> {
    let mut candidates = Vec::with_capacity(chain_transfers.len() + transfers_in.len());

    for event in transfers_in {
        let entry_id = event.entry_id();

        candidates.push(Candidate {
            date: parse_date(entry_id, &event.requested_date)?,
            delta: -BigInt::from(parse_amount(entry_id, &event.token_amount)?),
            origin: EntryOrigin::TransferIn(event.clone()),
        });
    }

    for event in chain_transfers {
        let entry_id = event.entry_id();
        let raw_date = event
            .blockchain_date
            .as_deref()
            .ok_or(Error::MissingDate { entry_id })?;

        candidates.push(Candidate {
            date: parse_date(entry_id, raw_date)?,
            delta: BigInt::from(parse_amount(entry_id, &event.token_amount)?),
            origin: EntryOrigin::ChainTransfer(event.clone()),
        });
    }

    // Stable: at equal instants transfer-ins stay ahead of chain transfers
    candidates.sort_by_key(|candidate| candidate.date);

    let first_transfer_in = candidates
        .iter()
        .position(|candidate| candidate.origin.source() == EntrySource::TransferIn);

    let Some(first_transfer_in) = first_transfer_in else {
        return Ok(Ledger::from_entries(Vec::new(), candidates.len()));
    };

    let mut balance = BigInt::default();
    let mut entries: Vec<LedgerEntry> = candidates
        .into_iter()
        .skip(first_transfer_in)
        .map(|candidate| {
            balance += &candidate.delta;
            LedgerEntry {
                id: candidate.origin.entry_id(),
                date: candidate.date,
                delta: candidate.delta,
                running_balance: balance.clone(),
                origin: candidate.origin,
            }
        })
        .collect();

    entries.reverse();

    Ok(Ledger::from_entries(entries, first_transfer_in))
}

fn parse_amount(entry_id: EntryId, raw: &str) -> Result<BigUint> {
    parse_token_amount(raw).ok_or_else(|| Error::InvalidAmount {
        entry_id,
        value: raw.to_string(),
    })
}

fn parse_date(entry_id: EntryId, raw: &str) -> Result<DateTime<Utc>> {
    parse_iso8601(raw).ok_or_else(|| Error::InvalidDate {
        entry_id,
        value: raw.to_string(),
    })
}
