//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Running balance: last balance == Σ(included deltas)
//! - Deterministic: same inputs → same ledger
//! - Truncation: no chain transfer precedes the earliest transfer-in
//! - Fail fast: one malformed amount aborts the pass

use balance_ledger::{
    reconcile::reconcile, ChainTransferEvent, EntrySource, Error, TransferInEvent,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use num_bigint::BigInt;
use proptest::prelude::*;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Render an offset from the base instant, sometimes with a non-UTC offset
fn date_string(offset_secs: i64, shifted: bool) -> String {
    let instant = base_time() + Duration::seconds(offset_secs);
    if shifted {
        let tz = chrono::FixedOffset::east_opt(5 * 3600).unwrap();
        instant.with_timezone(&tz).to_rfc3339()
    } else {
        instant.to_rfc3339()
    }
}

/// Strategy for generating (date offset, shifted, amount)
fn raw_event_strategy() -> impl Strategy<Value = (i64, bool, u64)> {
    (0i64..10_000, any::<bool>(), 0u64..1_000_000_000_000)
}

fn chain_transfers_strategy() -> impl Strategy<Value = Vec<ChainTransferEvent>> {
    prop::collection::vec(raw_event_strategy(), 0..15).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(idx, (offset, shifted, amount))| {
                ChainTransferEvent::new(idx as i64, date_string(offset, shifted), amount.to_string())
            })
            .collect()
    })
}

fn transfers_in_strategy() -> impl Strategy<Value = Vec<TransferInEvent>> {
    prop::collection::vec(raw_event_strategy(), 0..15).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(idx, (offset, shifted, amount))| {
                TransferInEvent::new(idx as i64, date_string(offset, shifted), amount.to_string())
            })
            .collect()
    })
}

fn instant(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: the newest balance equals the sum of all included deltas
    #[test]
    fn prop_balance_is_sum_of_deltas(
        chain in chain_transfers_strategy(),
        transfers_in in transfers_in_strategy(),
    ) {
        let ledger = reconcile(&chain, &transfers_in).unwrap();

        let total: BigInt = ledger.entries().iter().map(|e| e.delta.clone()).sum();
        prop_assert_eq!(ledger.current_balance(), total);

        if let Some(last) = ledger.chronological().last() {
            prop_assert_eq!(&last.running_balance, &ledger.current_balance());
        }
    }

    /// Property: each running balance is the previous one plus its delta
    #[test]
    fn prop_running_balance_recurrence(
        chain in chain_transfers_strategy(),
        transfers_in in transfers_in_strategy(),
    ) {
        let ledger = reconcile(&chain, &transfers_in).unwrap();

        let mut previous = BigInt::default();
        for entry in ledger.chronological() {
            prop_assert_eq!(&entry.running_balance, &(previous.clone() + &entry.delta));
            previous = entry.running_balance.clone();
        }
    }

    /// Property: reconciliation is deterministic
    #[test]
    fn prop_idempotent(
        chain in chain_transfers_strategy(),
        transfers_in in transfers_in_strategy(),
    ) {
        let first = reconcile(&chain, &transfers_in).unwrap();
        let second = reconcile(&chain, &transfers_in).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: chronological view is sorted and starts with a transfer-in
    #[test]
    fn prop_chronological_order(
        chain in chain_transfers_strategy(),
        transfers_in in transfers_in_strategy(),
    ) {
        let ledger = reconcile(&chain, &transfers_in).unwrap();

        let dates: Vec<_> = ledger.chronological().map(|e| e.date).collect();
        prop_assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));

        let first = ledger.chronological().next();
        if let Some(first) = first {
            prop_assert_eq!(first.source(), EntrySource::TransferIn);
        }
    }

    /// Property: no chain transfer strictly before the earliest transfer-in survives
    #[test]
    fn prop_truncation(
        chain in chain_transfers_strategy(),
        transfers_in in transfers_in_strategy(),
    ) {
        let ledger = reconcile(&chain, &transfers_in).unwrap();

        match transfers_in.iter().map(|t| instant(&t.requested_date)).min() {
            None => {
                prop_assert!(ledger.is_empty());
                prop_assert_eq!(ledger.dropped(), chain.len());
            }
            Some(earliest) => {
                let expected_dropped = chain
                    .iter()
                    .filter(|c| instant(c.blockchain_date.as_deref().unwrap()) < earliest)
                    .count();

                prop_assert_eq!(ledger.dropped(), expected_dropped);
                prop_assert_eq!(ledger.len(), transfers_in.len() + chain.len() - expected_dropped);
                prop_assert!(ledger.entries().iter().all(|e| e.date >= earliest));
            }
        }
    }

    /// Property: a single malformed amount anywhere aborts the pass
    #[test]
    fn prop_malformed_amount_fails_fast(
        chain in chain_transfers_strategy(),
        mut transfers_in in transfers_in_strategy(),
        junk in "[0-9]{0,3}[.,eE _+-][0-9]{0,3}",
        position in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!transfers_in.is_empty());

        let idx = position.index(transfers_in.len());
        transfers_in[idx].token_amount = junk.clone();

        match reconcile(&chain, &transfers_in) {
            Err(Error::InvalidAmount { entry_id, value }) => {
                prop_assert_eq!(entry_id, transfers_in[idx].entry_id());
                prop_assert_eq!(value, junk);
            }
            other => prop_assert!(false, "expected InvalidAmount, got {:?}", other),
        }
    }
}
