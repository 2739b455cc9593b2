//! In-memory implementation of the LedgerStore trait.
//!
//! This is primarily for testing. It has the same semantics as the
//! persistent backends but keeps everything in memory.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use votechain_core::Record;

use crate::error::{Result, StoreError};
use crate::traits::{check_extends, LedgerStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// every read clones the whole sequence under the read lock, so readers
/// always see a complete snapshot.
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a store pre-seeded with `records` (not verified).
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Record>>> {
        self.records
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Record>>> {
        self.records
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Record>> {
        Ok(self.read()?.clone())
    }

    async fn save(&self, records: &[Record]) -> Result<()> {
        let mut guard = self.write()?;
        *guard = records.to_vec();
        Ok(())
    }

    async fn tail(&self) -> Result<Option<Record>> {
        Ok(self.read()?.last().cloned())
    }

    async fn push(&self, record: &Record) -> Result<()> {
        let mut guard = self.write()?;
        check_extends(guard.last().map(|r| r.hash.as_str()), record)?;
        guard.push(record.clone());
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use votechain_core::{seal_after, VotePayload};

    fn make_record(tail: Option<&Record>, candidate: &str) -> Record {
        seal_after(
            tail,
            VotePayload {
                voter_id_masked: "vo***45".into(),
                candidate: candidate.into(),
                salt: "1-2-3-4".into(),
                timestamp: 1234567890000,
            },
        )
    }

    #[tokio::test]
    async fn test_memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load().await.unwrap().is_empty());
        assert!(store.tail().await.unwrap().is_none());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_store_push_and_tail() {
        let store = MemoryStore::new();
        let r1 = make_record(None, "Alice Johnson");
        let r2 = make_record(Some(&r1), "Ben Carter");

        store.push(&r1).await.unwrap();
        store.push(&r2).await.unwrap();

        assert_eq!(store.tail().await.unwrap(), Some(r2.clone()));
        assert_eq!(store.load().await.unwrap(), vec![r1, r2]);
    }

    #[tokio::test]
    async fn test_memory_store_push_rejects_stale_tail() {
        let store = MemoryStore::new();
        let r1 = make_record(None, "Alice Johnson");
        let fork = make_record(None, "Ben Carter");

        store.push(&r1).await.unwrap();
        let err = store.push(&fork).await.unwrap_err();
        match err {
            StoreError::StaleTail { prev_hash, tail } => {
                assert_eq!(prev_hash, "GENESIS");
                assert_eq!(tail, r1.hash);
            }
            other => panic!("expected stale tail, got {other:?}"),
        }
        assert_eq!(store.load().await.unwrap(), vec![r1]);
    }

    #[tokio::test]
    async fn test_memory_store_save_overwrites() {
        let r1 = make_record(None, "Alice Johnson");
        let store = MemoryStore::with_records(vec![r1.clone(), r1.clone()]);

        let replacement = make_record(None, "Chloe Singh");
        store.save(std::slice::from_ref(&replacement)).await.unwrap();

        assert_eq!(store.load().await.unwrap(), vec![replacement]);
    }

    #[tokio::test]
    async fn test_memory_store_export() {
        let r1 = make_record(None, "Alice Johnson");
        let store = MemoryStore::with_records(vec![r1.clone()]);
        let doc = store.export().await.unwrap();
        assert_eq!(doc.ledger, vec![r1]);
    }
}
