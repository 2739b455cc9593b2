//! Strong type definitions for votechain.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::Record;

/// Default number of hex characters shown when displaying a receipt.
pub const RECEIPT_DISPLAY_LEN: usize = 16;

/// Proof of inclusion handed to a voter: the hash of their record.
///
/// The full value can be checked against an exported ledger; the display
/// form is a truncated prefix.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Receipt(String);

impl Receipt {
    /// The receipt for a sealed record.
    pub fn for_record(record: &Record) -> Self {
        Self(record.hash.clone())
    }

    /// The full hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first `len` characters of the hash.
    pub fn prefix(&self, len: usize) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(len)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// The default display prefix.
    pub fn short(&self) -> &str {
        self.prefix(RECEIPT_DISPLAY_LEN)
    }

    /// Whether this receipt appears in `records`.
    pub fn is_included_in(&self, records: &[Record]) -> bool {
        records.iter().any(|r| r.hash == self.0)
    }
}

impl fmt::Debug for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Receipt({})", self.short())
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

impl AsRef<str> for Receipt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{seal, VotePayload, GENESIS};

    fn record() -> Record {
        seal(
            GENESIS,
            VotePayload {
                voter_id_masked: "****".into(),
                candidate: "Chloe Singh".into(),
                salt: "9-9-9-9".into(),
                timestamp: 42,
            },
        )
    }

    #[test]
    fn test_receipt_display() {
        let r = record();
        let receipt = Receipt::for_record(&r);
        assert_eq!(format!("{}", receipt), &r.hash[..16]);
        assert_eq!(receipt.as_str(), r.hash);
    }

    #[test]
    fn test_receipt_prefix_longer_than_hash() {
        let receipt = Receipt::for_record(&record());
        assert_eq!(receipt.prefix(100).len(), 64);
    }

    #[test]
    fn test_receipt_inclusion() {
        let r = record();
        let receipt = Receipt::for_record(&r);
        assert!(receipt.is_included_in(&[r]));
        assert!(!receipt.is_included_in(&[]));
    }

    #[test]
    fn test_receipt_debug() {
        let debug = format!("{:?}", Receipt::for_record(&record()));
        assert!(debug.starts_with("Receipt("));
    }
}
