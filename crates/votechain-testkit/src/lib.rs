//! # votechain testkit
//!
//! Testing utilities for votechain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: fixed records with expected canonical bytes and
//!   hashes, for cross-implementation verification
//! - **Generators**: Proptest strategies for payloads and valid chains
//! - **Fixtures**: a wired ledger, gate and ballot box, plus a store that
//!   fails on demand
//!
//! ## Golden Vectors
//!
//! ```rust
//! use votechain_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, hash) in verify_all_vectors() {
//!     assert!(ok, "{}: {}", name, hash);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use votechain_testkit::generators::chain;
//!
//! proptest! {
//!     #[test]
//!     fn chains_verify(records in chain(10)) {
//!         prop_assert!(votechain_core::verify_chain(&records).is_valid());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{vote_payload, FailingStore, TestFixture};
pub use generators::{chain, PayloadParams};
pub use vectors::{all_vectors, golden_chain, verify_all_vectors, GoldenVector};
