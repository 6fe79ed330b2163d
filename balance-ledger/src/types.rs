//! Core types for balance reconciliation
//!
//! Wire events keep their amounts and dates as the strings the backend sent.
//! Parsing happens during reconciliation so that a failure can name the
//! event it came from.

use crate::amount::decimal_string;
use chrono::{DateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Account address (20 bytes, hex encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AccountAddress(String);

impl AccountAddress {
    /// Validate and normalize to lowercase `0x`-prefixed form
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(crate::Error::InvalidAccount(raw.to_string()));
        }

        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountAddress {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tokens observed arriving on-chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTransferEvent {
    /// Indexer row ID
    pub id: i64,

    /// Block timestamp (ISO-8601); null until the block date is known
    pub blockchain_date: Option<String>,

    /// Amount in base units (decimal string)
    pub token_amount: String,

    /// Chain ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<i64>,

    /// Chain transaction row ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_tx_id: Option<i64>,

    /// Sender address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_addr: Option<String>,

    /// Receiver address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_addr: Option<String>,

    /// Token contract address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_addr: Option<String>,
}

impl ChainTransferEvent {
    /// Create event with only the fields reconciliation needs
    pub fn new(id: i64, blockchain_date: impl Into<String>, token_amount: impl Into<String>) -> Self {
        Self {
            id,
            blockchain_date: Some(blockchain_date.into()),
            token_amount: token_amount.into(),
            chain_id: None,
            chain_tx_id: None,
            from_addr: None,
            receiver_addr: None,
            token_addr: None,
        }
    }

    /// Ledger row ID
    pub fn entry_id(&self) -> EntryId {
        EntryId::new(EntrySource::ChainTransfer, self.id)
    }
}

/// Off-chain request to credit an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInEvent {
    /// Request row ID
    pub id: i64,

    /// When the transfer was requested (ISO-8601)
    pub requested_date: String,

    /// Amount in base units (decimal string)
    pub token_amount: String,

    /// External payment ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,

    /// Sender address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_addr: Option<String>,

    /// Receiver address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_addr: Option<String>,

    /// Chain ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<i64>,

    /// Token contract address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_addr: Option<String>,

    /// Hash of the transaction that fulfilled the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,

    /// When the tokens were seen on-chain (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_date: Option<String>,
}

impl TransferInEvent {
    /// Create event with only the fields reconciliation needs
    pub fn new(id: i64, requested_date: impl Into<String>, token_amount: impl Into<String>) -> Self {
        Self {
            id,
            requested_date: requested_date.into(),
            token_amount: token_amount.into(),
            payment_id: None,
            from_addr: None,
            receiver_addr: None,
            chain_id: None,
            token_addr: None,
            tx_hash: None,
            received_date: None,
        }
    }

    /// Ledger row ID
    pub fn entry_id(&self) -> EntryId {
        EntryId::new(EntrySource::TransferIn, self.id)
    }
}

/// Body of `GET /account/{account}/in`
///
/// Either list may be absent; absent means empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTransfers {
    /// Transfer-in requests
    #[serde(default)]
    pub transfers_in: Vec<TransferInEvent>,

    /// On-chain transfers
    #[serde(default)]
    pub chain_transfers: Vec<ChainTransferEvent>,
}

/// Kind of event a ledger row was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntrySource {
    /// On-chain transfer (credit)
    ChainTransfer,
    /// Transfer-in request (debit)
    TransferIn,
}

impl EntrySource {
    /// Row ID prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            EntrySource::ChainTransfer => "chain_transfer",
            EntrySource::TransferIn => "transfer_in",
        }
    }

    /// Human-readable row title
    pub fn title(&self) -> &'static str {
        match self {
            EntrySource::ChainTransfer => "Chain transfer",
            EntrySource::TransferIn => "Transfer in",
        }
    }
}

/// Ledger row ID, e.g. `transfer_in_42`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    /// Source kind
    pub source: EntrySource,
    /// Source event ID
    pub id: i64,
}

impl EntryId {
    /// Create new entry ID
    pub fn new(source: EntrySource, id: i64) -> Self {
        Self { source, id }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.source.prefix(), self.id)
    }
}

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Event a ledger row was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "event", rename_all = "camelCase")]
pub enum EntryOrigin {
    /// On-chain transfer
    ChainTransfer(ChainTransferEvent),
    /// Transfer-in request
    TransferIn(TransferInEvent),
}

impl EntryOrigin {
    /// Source kind
    pub fn source(&self) -> EntrySource {
        match self {
            EntryOrigin::ChainTransfer(_) => EntrySource::ChainTransfer,
            EntryOrigin::TransferIn(_) => EntrySource::TransferIn,
        }
    }

    /// Ledger row ID
    pub fn entry_id(&self) -> EntryId {
        match self {
            EntryOrigin::ChainTransfer(event) => event.entry_id(),
            EntryOrigin::TransferIn(event) => event.entry_id(),
        }
    }
}

/// One reconciled ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Row ID
    pub id: EntryId,

    /// Instant the row is ordered by
    pub date: DateTime<Utc>,

    /// Signed change: +amount for chain transfers, -amount for transfer-ins
    #[serde(with = "decimal_string")]
    pub delta: BigInt,

    /// Balance after applying this row and everything before it
    #[serde(with = "decimal_string")]
    pub running_balance: BigInt,

    /// Source event
    pub origin: EntryOrigin,
}

impl LedgerEntry {
    /// Source kind
    pub fn source(&self) -> EntrySource {
        self.id.source
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} - balance: {}",
            self.source().title(),
            self.date.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.delta,
            self.running_balance
        )
    }
}

/// Reconciled ledger, most recent entry first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    dropped: usize,
}

impl Ledger {
    /// Build from display-ordered entries
    pub(crate) fn from_entries(entries: Vec<LedgerEntry>, dropped: usize) -> Self {
        Self { entries, dropped }
    }

    /// Entries, most recent first
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Entries, oldest first
    pub fn chronological(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.entries.iter().rev()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no transfer-in exists
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chain transfers dropped for preceding the first transfer-in
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Balance after the most recent entry (zero when empty)
    pub fn current_balance(&self) -> BigInt {
        self.entries
            .first()
            .map(|entry| entry.running_balance.clone())
            .unwrap_or_default()
    }

    /// Totals over the whole ledger
    pub fn summary(&self) -> LedgerSummary {
        let mut credited = BigInt::default();
        let mut debited = BigInt::default();

        for entry in &self.entries {
            match entry.source() {
                EntrySource::ChainTransfer => credited += &entry.delta,
                EntrySource::TransferIn => debited -= &entry.delta,
            }
        }

        LedgerSummary {
            credited,
            debited,
            balance: self.current_balance(),
            entries: self.entries.len(),
            dropped: self.dropped,
        }
    }
}

/// Totals derived from a ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    /// Sum of chain transfer amounts
    #[serde(with = "decimal_string")]
    pub credited: BigInt,

    /// Sum of transfer-in amounts (positive)
    #[serde(with = "decimal_string")]
    pub debited: BigInt,

    /// Final running balance
    #[serde(with = "decimal_string")]
    pub balance: BigInt,

    /// Number of entries
    pub entries: usize,

    /// Chain transfers dropped by truncation
    pub dropped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_address_normalized() {
        let addr = AccountAddress::parse("0xAbCdEf0123456789aBcDeF0123456789AbCdEf01").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");

        let bare: AccountAddress = "ABCDEF0123456789ABCDEF0123456789ABCDEF01".parse().unwrap();
        assert_eq!(bare, addr);
    }

    #[test]
    fn test_account_address_rejects_bad_input() {
        for raw in ["", "0x", "0x1234", "0xzz23456789abcdef0123456789abcdef01234567", "0x0123456789abcdef0123456789abcdef012345678"] {
            assert!(AccountAddress::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn test_entry_id_display() {
        assert_eq!(EntryId::new(EntrySource::ChainTransfer, 3).to_string(), "chain_transfer_3");
        assert_eq!(EntryId::new(EntrySource::TransferIn, 9).to_string(), "transfer_in_9");
    }

    #[test]
    fn test_account_transfers_missing_lists() {
        let body = r#"{"transfersIn":[{"id":1,"paymentId":"p-1","fromAddr":"0x01","receiverAddr":"0x02","chainId":17000,"tokenAddr":null,"tokenAmount":"100","txHash":null,"requestedDate":"2024-01-01T00:00:00Z","receivedDate":null}]}"#;
        let transfers: AccountTransfers = serde_json::from_str(body).unwrap();

        assert_eq!(transfers.transfers_in.len(), 1);
        assert!(transfers.chain_transfers.is_empty());

        let transfer_in = &transfers.transfers_in[0];
        assert_eq!(transfer_in.payment_id.as_deref(), Some("p-1"));
        assert_eq!(transfer_in.chain_id, Some(17000));
        assert_eq!(transfer_in.token_amount, "100");

        let empty: AccountTransfers = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, AccountTransfers::default());
    }

    #[test]
    fn test_chain_transfer_null_date() {
        let body = r#"{"id":5,"fromAddr":"0x01","receiverAddr":"0x02","chainId":1,"tokenAddr":null,"tokenAmount":"7","chainTxId":11,"feePaid":null,"blockchainDate":null}"#;
        let event: ChainTransferEvent = serde_json::from_str(body).unwrap();

        assert_eq!(event.blockchain_date, None);
        assert_eq!(event.chain_tx_id, Some(11));
        assert_eq!(event.entry_id().to_string(), "chain_transfer_5");
    }

    #[test]
    fn test_entry_display_row() {
        let event = TransferInEvent::new(1, "2024-01-01T00:00:00Z", "100");
        let entry = LedgerEntry {
            id: event.entry_id(),
            date: crate::time::parse_iso8601(&event.requested_date).unwrap(),
            delta: BigInt::from(-100),
            running_balance: BigInt::from(-100),
            origin: EntryOrigin::TransferIn(event),
        };

        assert_eq!(entry.to_string(), "Transfer in 2024-01-01T00:00:00.000Z -100 - balance: -100");

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "transfer_in_1");
        assert_eq!(json["delta"], "-100");
        assert_eq!(json["runningBalance"], "-100");
        assert_eq!(json["origin"]["kind"], "transferIn");
        assert_eq!(json["origin"]["event"]["requestedDate"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_empty_ledger_balance_is_zero() {
        let ledger = Ledger::default();
        assert!(ledger.is_empty());
        assert_eq!(ledger.current_balance(), BigInt::default());
        assert_eq!(ledger.summary().entries, 0);
    }
}
