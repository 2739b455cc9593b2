//! The Ledger: single-writer handle around a store.
//!
//! A `Ledger` serializes its own mutations (append, import) with an async
//! mutex. Handles that share a store, in this process or another, are
//! serialized by the store: `push` is a compare-and-append that refuses a
//! record sealed against a tail that has since moved, and `append` then
//! reseals on the new tail. Reads take no lock.

use std::sync::Arc;

use tokio::sync::Mutex;
use votechain_core::{
    seal_after, verify_chain, CandidateSet, LedgerDocument, Receipt, Record, Tally, Verification,
    VotePayload,
};
use votechain_store::{LedgerStore, StoreError, StoreExt};

use crate::error::{LedgerError, Result};

/// Reseal attempts before an append gives up on a contended tail.
const MAX_APPEND_ATTEMPTS: u32 = 32;

/// Summary of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Records held before the import.
    pub replaced: usize,
    /// Records held now.
    pub imported: usize,
}

/// The main ledger handle.
pub struct Ledger<S: LedgerStore> {
    store: Arc<S>,
    writer: Mutex<()>,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Wrap a store that is shared with other owners.
    pub fn from_arc(store: Arc<S>) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Seal `payload` onto the tail and persist it.
    ///
    /// The payload must already carry a masked voter id and a fresh salt. On
    /// a store error nothing was appended. If another writer moves the tail
    /// between the read and the push, the payload is resealed on the new
    /// tail.
    pub async fn append(&self, payload: VotePayload) -> Result<Record> {
        let _guard = self.writer.lock().await;

        let mut attempt = 1;
        let record = loop {
            let tail = self.store.tail().await?;
            let record = seal_after(tail.as_ref(), payload.clone());
            match self.store.push(&record).await {
                Ok(()) => break record,
                Err(StoreError::StaleTail { .. }) if attempt < MAX_APPEND_ATTEMPTS => {
                    tracing::debug!(attempt, "tail moved during append, resealing");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            receipt = %Receipt::for_record(&record),
            candidate = %record.candidate,
            voter = %record.voter_id_masked,
            "appended record"
        );
        Ok(record)
    }

    /// Replace the whole ledger with `records` if they form a valid chain.
    ///
    /// Replace-or-reject: on an integrity failure the store is untouched.
    pub async fn import_ledger(&self, records: Vec<Record>) -> Result<ImportOutcome> {
        if let Verification::Broken { index, fault } = verify_chain(&records) {
            tracing::warn!(index, %fault, "rejected import");
            return Err(LedgerError::Integrity { index, fault });
        }

        let _guard = self.writer.lock().await;
        let replaced = self.store.len().await?;
        self.store.save(&records).await?;

        tracing::info!(replaced, imported = records.len(), "imported ledger");
        Ok(ImportOutcome {
            replaced,
            imported: records.len(),
        })
    }

    /// Parse a `{"ledger": [...]}` document and import it.
    pub async fn import_json(&self, text: &str) -> Result<ImportOutcome> {
        let doc = LedgerDocument::from_json(text)?;
        self.import_ledger(doc.into_records()).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify the current contents.
    ///
    /// A broken chain is reported in the returned value, not as an error.
    pub async fn verify(&self) -> Result<Verification> {
        let records = self.store.load().await?;
        let result = verify_chain(&records);
        match result {
            Verification::Valid => {
                tracing::debug!(count = records.len(), "ledger verified");
            }
            Verification::Broken { index, fault } => {
                tracing::warn!(index, %fault, "ledger integrity failure");
            }
        }
        Ok(result)
    }

    pub async fn records(&self) -> Result<Vec<Record>> {
        Ok(self.store.load().await?)
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.store.len().await?)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub async fn export(&self) -> Result<LedgerDocument> {
        Ok(self.store.export().await?)
    }

    /// The export document as pretty-printed JSON.
    pub async fn export_json(&self) -> Result<String> {
        Ok(self.export().await?.to_json_pretty()?)
    }

    pub async fn tally(&self, candidates: &CandidateSet) -> Result<Tally> {
        let records = self.store.load().await?;
        Ok(Tally::count(&records, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use votechain_core::{ChainFault, GENESIS};
    use votechain_store::MemoryStore;

    /// Memory store where another writer lands a record just before the
    /// next `push`, leaving the caller's tail stale.
    struct InterleavedStore {
        inner: MemoryStore,
        foreign: StdMutex<Option<VotePayload>>,
    }

    #[async_trait]
    impl LedgerStore for InterleavedStore {
        async fn load(&self) -> std::result::Result<Vec<Record>, StoreError> {
            self.inner.load().await
        }

        async fn save(&self, records: &[Record]) -> std::result::Result<(), StoreError> {
            self.inner.save(records).await
        }

        async fn push(&self, record: &Record) -> std::result::Result<(), StoreError> {
            let foreign = self.foreign.lock().unwrap().take();
            if let Some(foreign) = foreign {
                let tail = self.inner.tail().await?;
                self.inner.push(&seal_after(tail.as_ref(), foreign)).await?;
            }
            self.inner.push(record).await
        }
    }

    fn payload(candidate: &str, ts: i64) -> VotePayload {
        VotePayload {
            voter_id_masked: "vo***45".into(),
            candidate: candidate.into(),
            salt: format!("{ts}-0-0-0"),
            timestamp: ts,
        }
    }

    #[tokio::test]
    async fn test_append_links_records() {
        let ledger = Ledger::new(MemoryStore::new());
        let r1 = ledger.append(payload("Ben Carter", 1)).await.unwrap();
        let r2 = ledger.append(payload("Chloe Singh", 2)).await.unwrap();

        assert_eq!(r1.prev_hash, GENESIS);
        assert_eq!(r2.prev_hash, r1.hash);
        assert_eq!(ledger.len().await.unwrap(), 2);
        assert!(ledger.verify().await.unwrap().is_valid());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_handles_sharing_a_store_do_not_fork() {
        let store = Arc::new(MemoryStore::new());
        let ledgers = [
            Arc::new(Ledger::from_arc(Arc::clone(&store))),
            Arc::new(Ledger::from_arc(Arc::clone(&store))),
        ];

        let mut handles = Vec::new();
        for (n, ledger) in ledgers.iter().enumerate() {
            let ledger = Arc::clone(ledger);
            handles.push(tokio::spawn(async move {
                for i in 0..20 {
                    ledger.append(payload("Ben Carter", (n * 100 + i) as i64)).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await.unwrap(), 40);
        assert_eq!(ledgers[0].verify().await.unwrap(), Verification::Valid);
    }

    #[tokio::test]
    async fn test_handles_sharing_a_store_extend_each_other() {
        let store = Arc::new(MemoryStore::new());
        let ours = Ledger::from_arc(Arc::clone(&store));
        let theirs = Ledger::from_arc(Arc::clone(&store));

        let first = ours.append(payload("Alice Johnson", 1)).await.unwrap();
        let second = theirs.append(payload("Ben Carter", 2)).await.unwrap();
        let third = ours.append(payload("Chloe Singh", 3)).await.unwrap();

        assert_eq!(second.prev_hash, first.hash);
        assert_eq!(third.prev_hash, second.hash);
        assert!(ours.verify().await.unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_append_reseals_when_tail_moves() {
        let store = InterleavedStore {
            inner: MemoryStore::new(),
            foreign: StdMutex::new(None),
        };
        let ledger = Ledger::new(store);
        let first = ledger.append(payload("Alice Johnson", 1)).await.unwrap();

        *ledger.store().foreign.lock().unwrap() = Some(payload("Ben Carter", 2));
        let ours = ledger.append(payload("Chloe Singh", 3)).await.unwrap();

        let records = ledger.records().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].prev_hash, first.hash);
        assert_eq!(records[1].candidate, "Ben Carter");
        assert_eq!(ours.prev_hash, records[1].hash);
        assert_eq!(records[2], ours);
        assert!(ledger.verify().await.unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_empty_ledger_is_valid() {
        let ledger = Ledger::new(MemoryStore::new());
        assert!(ledger.is_empty().await.unwrap());
        assert_eq!(ledger.verify().await.unwrap(), Verification::Valid);
    }

    #[tokio::test]
    async fn test_verify_reports_tampering_without_repair() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Ledger::from_arc(Arc::clone(&store));
        for ts in 0..3 {
            ledger.append(payload("Alice Johnson", ts)).await.unwrap();
        }

        let mut records = store.load().await.unwrap();
        records[1].candidate = "Ben Carter".into();
        store.save(&records).await.unwrap();

        let result = ledger.verify().await.unwrap();
        assert_eq!(
            result,
            Verification::Broken {
                index: 1,
                fault: ChainFault::DigestMismatch
            }
        );
        // Still broken: verification never rewrites the store.
        assert_eq!(ledger.records().await.unwrap(), records);
    }

    #[tokio::test]
    async fn test_import_rejects_and_keeps_current() {
        let ledger = Ledger::new(MemoryStore::new());
        let original = ledger.append(payload("Chloe Singh", 1)).await.unwrap();

        let other = Ledger::new(MemoryStore::new());
        other.append(payload("Ben Carter", 10)).await.unwrap();
        other.append(payload("Ben Carter", 11)).await.unwrap();
        let mut candidate = other.records().await.unwrap();
        candidate[1].prev_hash = "0".repeat(64);

        let err = ledger.import_ledger(candidate).await.unwrap_err();
        assert!(matches!(err, LedgerError::Integrity { index: 1, .. }));
        assert_eq!(ledger.records().await.unwrap(), vec![original]);
    }

    #[tokio::test]
    async fn test_import_replaces_wholesale() {
        let ledger = Ledger::new(MemoryStore::new());
        ledger.append(payload("Chloe Singh", 1)).await.unwrap();

        let other = Ledger::new(MemoryStore::new());
        for ts in 0..3 {
            other.append(payload("Ben Carter", ts)).await.unwrap();
        }
        let json = other.export_json().await.unwrap();

        let outcome = ledger.import_json(&json).await.unwrap();
        assert_eq!(
            outcome,
            ImportOutcome {
                replaced: 1,
                imported: 3
            }
        );
        assert_eq!(ledger.records().await.unwrap(), other.records().await.unwrap());
    }

    #[tokio::test]
    async fn test_import_malformed_is_validation_error() {
        let ledger = Ledger::new(MemoryStore::new());
        let err = ledger.import_json(r#"{"ledger": 5}"#).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = ledger
            .import_json(r#"{"ledger": [{"candidate": "Ben Carter"}]}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_import_empty_clears() {
        let ledger = Ledger::new(MemoryStore::new());
        ledger.append(payload("Chloe Singh", 1)).await.unwrap();
        ledger.import_json(r#"{"ledger": []}"#).await.unwrap();
        assert!(ledger.is_empty().await.unwrap());
    }

    proptest::proptest! {
        #[test]
        fn prop_appends_always_verify(
            candidates in proptest::collection::vec("[A-Za-z ]{1,12}", 0..12)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let ledger = Ledger::new(MemoryStore::new());
                for (ts, c) in candidates.iter().enumerate() {
                    ledger.append(payload(c, ts as i64)).await.unwrap();
                }
                assert_eq!(ledger.len().await.unwrap(), candidates.len());
                assert!(ledger.verify().await.unwrap().is_valid());
            });
        }
    }

    #[tokio::test]
    async fn test_tally() {
        let ledger = Ledger::new(MemoryStore::new());
        ledger.append(payload("Ben Carter", 1)).await.unwrap();
        ledger.append(payload("Ben Carter", 2)).await.unwrap();
        let tally = ledger.tally(&CandidateSet::default()).await.unwrap();
        assert_eq!(tally.get("Ben Carter"), 2);
        assert_eq!(tally.get("Alice Johnson"), 0);
    }
}
