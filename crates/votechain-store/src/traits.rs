//! Store trait: the abstract capability for ledger persistence.
//!
//! The chain engine never touches a backend directly; it is handed a
//! `LedgerStore` and only ever asks it to load or save a whole sequence.
//! Implementations include in-memory (tests), SQLite and a JSON file.

use std::sync::Arc;

use async_trait::async_trait;
use votechain_core::{LedgerDocument, Record, GENESIS};

use crate::error::{Result, StoreError};

/// The LedgerStore trait: async load/save of an ordered record sequence.
///
/// # Design Notes
///
/// - **Whole-sequence semantics**: `save` replaces everything previously
///   stored. Readers must never observe a partially written sequence.
/// - **Compare-and-append**: `push` only accepts a record whose `prev_hash`
///   is the stored tail hash (or `GENESIS` on an empty store), checked
///   atomically with the write. Writers that raced on a stale tail get
///   [`StoreError::StaleTail`] and must reseal.
/// - **Optional fast paths**: `tail` and `push` default to `load`/`save`;
///   backends that can do better override them.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the full sequence in chain order (empty if nothing persisted).
    async fn load(&self) -> Result<Vec<Record>>;

    /// Persist `records`, overwriting prior content as one atomic unit.
    async fn save(&self, records: &[Record]) -> Result<()>;

    /// The last record, if any.
    async fn tail(&self) -> Result<Option<Record>> {
        Ok(self.load().await?.pop())
    }

    /// Append one record after the current tail.
    ///
    /// The default is a load/check/save cycle and is only atomic if nothing
    /// else writes in between; backends shared between handles override it.
    async fn push(&self, record: &Record) -> Result<()> {
        let mut records = self.load().await?;
        check_extends(records.last().map(|r| r.hash.as_str()), record)?;
        records.push(record.clone());
        self.save(&records).await
    }

    /// Number of stored records.
    async fn len(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }
}

/// Reject `record` unless it links to `tail_hash` (`None` for an empty store).
pub(crate) fn check_extends(tail_hash: Option<&str>, record: &Record) -> Result<()> {
    let tail = tail_hash.unwrap_or(GENESIS);
    if record.prev_hash != tail {
        return Err(StoreError::StaleTail {
            prev_hash: record.prev_hash.clone(),
            tail: tail.to_string(),
        });
    }
    Ok(())
}

/// Extension trait for common store patterns.
pub trait StoreExt: LedgerStore {
    /// Wrap the current sequence for external transfer.
    fn export(&self) -> impl std::future::Future<Output = Result<LedgerDocument>> + Send;
}

impl<S: LedgerStore + ?Sized> StoreExt for S {
    async fn export(&self) -> Result<LedgerDocument> {
        Ok(LedgerDocument::new(self.load().await?))
    }
}

macro_rules! forward_store {
    ($ptr:ident) => {
        #[async_trait]
        impl<S: LedgerStore + ?Sized> LedgerStore for $ptr<S> {
            async fn load(&self) -> Result<Vec<Record>> {
                (**self).load().await
            }

            async fn save(&self, records: &[Record]) -> Result<()> {
                (**self).save(records).await
            }

            async fn tail(&self) -> Result<Option<Record>> {
                (**self).tail().await
            }

            async fn push(&self, record: &Record) -> Result<()> {
                (**self).push(record).await
            }

            async fn len(&self) -> Result<usize> {
                (**self).len().await
            }
        }
    };
}

forward_store!(Arc);
forward_store!(Box);
