//! Chain verification: digest and linkage checks over a whole ledger.

use crate::error::ChainFault;
use crate::record::{Record, GENESIS};

/// Outcome of verifying a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Every record's digest and link checks out (vacuously true when empty).
    Valid,
    /// The first record that fails, and why.
    Broken { index: usize, fault: ChainFault },
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }

    /// Index of the first bad record, if any.
    pub fn failing_index(&self) -> Option<usize> {
        match self {
            Verification::Valid => None,
            Verification::Broken { index, .. } => Some(*index),
        }
    }
}

/// Check a single record against the hash expected of its predecessor.
///
/// The digest is checked before the link.
pub fn validate_record(record: &Record, expected_prev: &str) -> Result<(), ChainFault> {
    if record.compute_hash() != record.hash {
        return Err(ChainFault::DigestMismatch);
    }
    if record.prev_hash != expected_prev {
        return Err(if expected_prev == GENESIS {
            ChainFault::BadGenesis
        } else {
            ChainFault::BrokenLink
        });
    }
    Ok(())
}

/// Verify a ledger from index 0, stopping at the first failure.
pub fn verify_chain(records: &[Record]) -> Verification {
    let mut expected_prev = GENESIS;
    for (index, record) in records.iter().enumerate() {
        if let Err(fault) = validate_record(record, expected_prev) {
            return Verification::Broken { index, fault };
        }
        expected_prev = &record.hash;
    }
    Verification::Valid
}
