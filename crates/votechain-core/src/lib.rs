//! # votechain core
//!
//! Pure primitives for a hash-chained ledger of vote records: record
//! sealing, canonical encoding, digesting, verification, identity masking
//! and tallying.
//!
//! This crate contains no I/O, no storage, no locking. Persistence and the
//! single-writer discipline live in `votechain-store` and `votechain`.
//!
//! ## Key Types
//!
//! - [`Record`] - One sealed vote, linked to its predecessor by `prev_hash`
//! - [`VotePayload`] - The caller-supplied fields of a record
//! - [`Verification`] - Result of checking a chain end to end
//! - [`Receipt`] - A record's hash, handed to the voter
//! - [`LedgerDocument`] - The `{"ledger": [...]}` transfer format
//!
//! ## Canonicalization
//!
//! Record digests are SHA-256 over a fixed-order, length-prefixed encoding.
//! See the [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod mask;
pub mod record;
pub mod tally;
pub mod types;
pub mod validation;
pub mod wire;

pub use canonical::{canonical_bytes, canonicalize, RECORD_DOMAIN};
pub use crypto::{digest, generate_salt, Digest};
pub use error::{ChainFault, CoreError};
pub use mask::mask_voter_id;
pub use record::{seal, seal_after, Record, VotePayload, GENESIS};
pub use tally::{CandidateSet, Tally};
pub use types::{Receipt, RECEIPT_DISPLAY_LEN};
pub use validation::{validate_record, verify_chain, Verification};
pub use wire::LedgerDocument;
