//! # votechain
//!
//! A tamper-evident vote ledger: every cast vote becomes a record bound to
//! its predecessor by a SHA-256 hash, so any later edit is detectable.
//!
//! ## Overview
//!
//! - **Ledger**: single-writer handle over a [`store::LedgerStore`]. Appends,
//!   verifies, imports and exports.
//! - **OTP gate**: short-lived single-use codes that yield a
//!   [`VerifiedVoter`].
//! - **Ballot box**: checks the candidate and device flag, masks the voter
//!   id, salts and appends.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use votechain::{BallotBox, CandidateSet, CapturingSink, Device, Ledger, OtpGate, OtpPolicy};
//! use votechain::store::SqliteStore;
//!
//! async fn example() {
//!     let ledger = Arc::new(Ledger::new(SqliteStore::open("votechain.db").unwrap()));
//!     let gate = OtpGate::with_sink(OtpPolicy::default(), CapturingSink::new());
//!     let ballot_box = BallotBox::new(Arc::clone(&ledger), CandidateSet::default());
//!
//!     gate.request("voter12345").await.unwrap();
//!     let code = gate.sink().last_code("voter12345").unwrap();
//!     let voter = gate.verify("voter12345", code.as_str()).await.unwrap();
//!
//!     let mut device = Device::new();
//!     let receipt = ballot_box.cast_vote(&mut device, voter, "Ben Carter").await.unwrap();
//!     println!("receipt {}", receipt);
//!
//!     assert!(ledger.verify().await.unwrap().is_valid());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `votechain::core` - records, canonical encoding, verification
//! - `votechain::store` - storage abstraction and backends

pub mod ballot;
pub mod config;
pub mod error;
pub mod ledger;
pub mod otp;

// Re-export component crates
pub use votechain_core as core;
pub use votechain_store as store;

pub use ballot::{BallotBox, CastVote, Device};
pub use config::{LogConfig, LogFormat, StoreBackend, VotechainConfig};
pub use error::{BallotError, ConfigError, LedgerError, OtpError, Result};
pub use ledger::{ImportOutcome, Ledger};
pub use otp::{CapturingSink, CodeSink, LogSink, OtpCode, OtpGate, OtpPolicy, VerifiedVoter};

// Re-export commonly used core types
pub use votechain_core::{
    mask_voter_id, verify_chain, CandidateSet, ChainFault, LedgerDocument, Receipt, Record,
    Tally, Verification, VotePayload, GENESIS,
};
