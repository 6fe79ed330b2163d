//! Error types for balance reconciliation

use crate::types::EntryId;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Token amount is not a non-negative decimal integer
    #[error("Invalid token amount {value:?} in {entry_id}")]
    InvalidAmount {
        /// Offending event
        entry_id: EntryId,
        /// Raw amount as received
        value: String,
    },

    /// Date is not a recognizable ISO-8601 timestamp
    #[error("Invalid date {value:?} in {entry_id}")]
    InvalidDate {
        /// Offending event
        entry_id: EntryId,
        /// Raw date as received
        value: String,
    },

    /// Event carries no date at all
    #[error("Missing date in {entry_id}")]
    MissingDate {
        /// Offending event
        entry_id: EntryId,
    },

    /// Account address is not 20 hex-encoded bytes
    #[error("Invalid account address: {0}")]
    InvalidAccount(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl Error {
    /// Entry that caused a parse failure, if any
    pub fn entry_id(&self) -> Option<&EntryId> {
        match self {
            Error::InvalidAmount { entry_id, .. }
            | Error::InvalidDate { entry_id, .. }
            | Error::MissingDate { entry_id } => Some(entry_id),
            _ => None,
        }
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
}
