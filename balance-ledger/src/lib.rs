//! Balance Ledger
//!
//! Reconciles on-chain token transfers with off-chain transfer-in requests
//! into a single ledger with a running balance.
//!
//! # Architecture
//!
//! - **Pure reconciliation**: the ledger is a function of its two inputs
//! - **Exact arithmetic**: token amounts are arbitrary-precision integers
//! - **Fail fast**: one malformed event aborts the whole pass
//!
//! # Invariants
//!
//! - Chronological order: entries sorted ascending by instant before display
//! - Running balance: `balance[i] == balance[i - 1] + delta[i]`, starting at zero
//! - Truncation: no chain transfer precedes the earliest transfer-in
//! - Deterministic: same inputs → same ledger
//!
//! # Example
//!
//! ```
//! use balance_ledger::{BalanceReconciler, ChainTransferEvent, TransferInEvent};
//!
//! let transfers_in = vec![TransferInEvent::new(1, "2024-01-01T00:00:00Z", "100")];
//! let chain_transfers = vec![ChainTransferEvent::new(1, "2024-01-02T00:00:00Z", "50")];
//!
//! let ledger = BalanceReconciler::new()
//!     .reconcile(&chain_transfers, &transfers_in)
//!     .unwrap();
//!
//! assert_eq!(ledger.len(), 2);
//! assert_eq!(ledger.current_balance().to_string(), "-50");
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod amount;
pub mod error;
pub mod metrics;
pub mod reconcile;
pub mod time;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use reconcile::BalanceReconciler;
pub use types::{
    AccountAddress, AccountTransfers, ChainTransferEvent, EntryId, EntryOrigin, EntrySource,
    Ledger, LedgerEntry, LedgerSummary, TransferInEvent,
};
