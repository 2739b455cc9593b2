//! Golden test vectors for deterministic verification.
//!
//! A three-record chain whose canonical bytes and digests are fixed. Any
//! implementation that reproduces these hashes can verify an exported
//! ledger produced by this one.

use votechain_core::{canonicalize, seal, Record, VotePayload, GENESIS};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub voter_id_masked: &'static str,
    pub candidate: &'static str,
    pub salt: &'static str,
    pub timestamp: i64,
    /// Expected canonical bytes (hex). Empty means not pinned.
    pub expected_canonical: &'static str,
    /// Expected record hash (hex).
    pub expected_hash: &'static str,
}

impl GoldenVector {
    pub fn payload(&self) -> VotePayload {
        VotePayload {
            voter_id_masked: self.voter_id_masked.to_string(),
            candidate: self.candidate.to_string(),
            salt: self.salt.to_string(),
            timestamp: self.timestamp,
        }
    }
}

/// Get all golden test vectors, in chain order.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "genesis record",
            voter_id_masked: "vo***45",
            candidate: "Alice Johnson",
            salt: "1-2-3-4",
            timestamp: 1736870400000,
            expected_canonical: "766f7465636861696e2f7265636f72642f76318567766f2a2a2a34356d416c69\
                                 6365204a6f686e736f6e67312d322d332d341b00000194658b10006747454e45\
                                 534953",
            expected_hash: "bae3f93ab47e73ac0123ff8d3c49d4572df01b85e4ec9d84cf8307664ac3cd06",
        },
        GoldenVector {
            name: "short id fully masked",
            voter_id_masked: "****",
            candidate: "Ben Carter",
            salt: "5-6-7-8",
            timestamp: 1736870460000,
            expected_canonical: "",
            expected_hash: "103af96781eb5dabe30baa04706018a202f393cedcf080d82aeaa415381d2ac9",
        },
        GoldenVector {
            name: "negative timestamp",
            voter_id_masked: "AB***YZ",
            candidate: "Chloe Singh",
            salt: "9-10-11-12",
            timestamp: -1,
            expected_canonical: "766f7465636861696e2f7265636f72642f7631856741422a2a2a595a6b43686c\
                                 6f652053696e67686a392d31302d31312d31322078403130336166393637383165\
                                 6235646162653330626161303437303630313861323032663339336365646366\
                                 303830643832616561613431353338316432616339",
            expected_hash: "95c2ec8dc38c0e6857e9ddde77e8da3fde0659205604cd11f488b4f084b8614f",
        },
    ]
}

/// Seal every vector in order into one chain.
pub fn golden_chain() -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();
    for vector in all_vectors() {
        let prev = records.last().map(|r| r.hash.clone()).unwrap_or_else(|| GENESIS.to_string());
        records.push(seal(&prev, vector.payload()));
    }
    records
}

/// Check every vector against this implementation.
///
/// Returns `(name, matches, actual_hash)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .zip(golden_chain())
        .map(|(v, record)| {
            let canonical = hex::encode(canonicalize(&v.payload(), &record.prev_hash));
            let canonical_ok =
                v.expected_canonical.is_empty() || canonical == v.expected_canonical;
            let matches = canonical_ok && record.hash == v.expected_hash;
            (v.name.to_string(), matches, record.hash)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use votechain_core::verify_chain;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, actual) in verify_all_vectors() {
            assert!(matches, "vector '{}' produced {}", name, actual);
        }
    }

    #[test]
    fn test_golden_chain_verifies() {
        assert!(verify_chain(&golden_chain()).is_valid());
    }
}
