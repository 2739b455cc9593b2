//! # votechain store
//!
//! Storage abstraction for votechain. Provides a trait-based interface for
//! ledger persistence with SQLite, JSON file and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`LedgerStore`] trait,
//! so the chain engine is storage-agnostic. The primary implementation is
//! [`SqliteStore`]; [`JsonFileStore`] keeps the ledger in its export format;
//! [`MemoryStore`] is for tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use votechain_store::{LedgerStore, SqliteStore, StoreExt};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let records = store.load().await.unwrap();
//!     let document = store.export().await.unwrap();
//!     assert_eq!(records, document.ledger);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Whole-sequence contract**: `load` returns the full chain, `save`
//!   replaces it atomically.
//! - **Stateless engine**: stores never compute hashes or verify; that is the
//!   chain engine's job.

pub mod error;
pub mod file;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{LedgerStore, StoreExt};
