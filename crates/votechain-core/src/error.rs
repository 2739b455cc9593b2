//! Error types for votechain core.

use thiserror::Error;

/// Core errors that can occur while encoding or decoding records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("malformed ledger document: {0}")]
    MalformedDocument(String),
}

/// Why a chain failed verification at a given index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChainFault {
    /// The stored hash does not match the digest of the record's fields.
    #[error("stored hash does not match record contents")]
    DigestMismatch,

    /// The first record does not carry the genesis sentinel.
    #[error("first record does not link to GENESIS")]
    BadGenesis,

    /// The record's prev_hash is not its predecessor's hash.
    #[error("prev_hash does not match predecessor hash")]
    BrokenLink,
}
