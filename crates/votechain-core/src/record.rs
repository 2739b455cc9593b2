//! Record: one cast vote, bound to its predecessor by hash.
//!
//! A record is created exactly once by [`seal`] and never edited. Field
//! names on the wire are camelCase (`voterIdMasked`, `prevHash`).

use serde::{Deserialize, Serialize};

use crate::canonical::canonicalize;
use crate::crypto::digest;

/// The `prev_hash` of the first record in every ledger.
pub const GENESIS: &str = "GENESIS";

/// The caller-supplied part of a record.
///
/// The voter id must already be masked and the salt freshly drawn before a
/// payload reaches the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    /// Redacted voter identifier.
    pub voter_id_masked: String,
    /// Chosen candidate.
    pub candidate: String,
    /// Per-record random salt.
    pub salt: String,
    /// Unix milliseconds, caller-supplied.
    pub timestamp: i64,
}

/// A sealed ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub voter_id_masked: String,
    pub candidate: String,
    pub salt: String,
    pub timestamp: i64,
    /// Hash of the preceding record, or [`GENESIS`].
    pub prev_hash: String,
    /// Hex SHA-256 of the canonical encoding of every other field.
    pub hash: String,
}

impl Record {
    /// The caller-supplied fields of this record.
    pub fn payload(&self) -> VotePayload {
        VotePayload {
            voter_id_masked: self.voter_id_masked.clone(),
            candidate: self.candidate.clone(),
            salt: self.salt.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Recompute the digest from the record's fields.
    pub fn compute_hash(&self) -> String {
        digest(&canonicalize(&self.payload(), &self.prev_hash))
    }

    /// Whether this record claims to be the first in its chain.
    pub fn is_genesis(&self) -> bool {
        self.prev_hash == GENESIS
    }
}

/// Seal a payload onto the chain whose tail hash is `prev_hash`.
///
/// Pure: `(tail, payload) -> record`. Persisting the result is the caller's
/// job.
pub fn seal(prev_hash: &str, payload: VotePayload) -> Record {
    let hash = digest(&canonicalize(&payload, prev_hash));
    Record {
        voter_id_masked: payload.voter_id_masked,
        candidate: payload.candidate,
        salt: payload.salt,
        timestamp: payload.timestamp,
        prev_hash: prev_hash.to_string(),
        hash,
    }
}

/// Seal a payload after `tail` (or at genesis when the chain is empty).
pub fn seal_after(tail: Option<&Record>, payload: VotePayload) -> Record {
    let prev = tail.map(|r| r.hash.as_str()).unwrap_or(GENESIS);
    seal(prev, payload)
}
