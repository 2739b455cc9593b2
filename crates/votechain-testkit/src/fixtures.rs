//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use votechain::{BallotBox, CandidateSet, CapturingSink, Ledger, OtpGate, OtpPolicy, VerifiedVoter};
use votechain_core::{generate_salt, mask_voter_id, Record, VotePayload};
use votechain_store::{LedgerStore, MemoryStore, StoreError};

/// Build a payload the way the ballot box would.
pub fn vote_payload(voter_id: &str, candidate: &str, timestamp: i64) -> VotePayload {
    VotePayload {
        voter_id_masked: mask_voter_id(voter_id),
        candidate: candidate.to_string(),
        salt: generate_salt(),
        timestamp,
    }
}

/// A ledger over a shared memory store, plus a gate and ballot box wired
/// to it.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub ledger: Arc<Ledger<Arc<MemoryStore>>>,
    pub gate: OtpGate<CapturingSink>,
    pub ballot_box: BallotBox<Arc<MemoryStore>>,
}

impl TestFixture {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(Ledger::new(Arc::clone(&store)));
        Self {
            ballot_box: BallotBox::new(Arc::clone(&ledger), CandidateSet::default()),
            gate: OtpGate::with_sink(OtpPolicy::default(), CapturingSink::new()),
            store,
            ledger,
        }
    }

    /// Run the OTP round trip for `voter_id`.
    pub async fn verified_voter(&self, voter_id: &str) -> VerifiedVoter {
        self.gate.request(voter_id).await.expect("otp request");
        let code = self.gate.sink().last_code(voter_id).expect("code delivered");
        self.gate
            .verify(voter_id, code.as_str())
            .await
            .expect("otp verify")
    }

    /// Append one vote per candidate name, timestamps 1, 2, 3...
    pub async fn append_votes(&self, candidates: &[&str]) -> Vec<Record> {
        let mut out = Vec::with_capacity(candidates.len());
        for (i, candidate) in candidates.iter().enumerate() {
            let voter = format!("voter{:05}", i);
            let record = self
                .ledger
                .append(vote_payload(&voter, candidate, i as i64 + 1))
                .await
                .expect("append");
            out.push(record);
        }
        out
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A memory store whose reads or writes can be made to fail on demand.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            inner: MemoryStore::with_records(records),
            ..Self::default()
        }
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    /// Contents of the underlying store, bypassing injected failures.
    pub async fn snapshot(&self) -> Vec<Record> {
        self.inner.load().await.expect("memory load")
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected {} failure", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for FailingStore {
    async fn load(&self) -> Result<Vec<Record>, StoreError> {
        self.check(&self.fail_reads, "read")?;
        self.inner.load().await
    }

    async fn save(&self, records: &[Record]) -> Result<(), StoreError> {
        self.check(&self.fail_writes, "write")?;
        self.inner.save(records).await
    }

    async fn tail(&self) -> Result<Option<Record>, StoreError> {
        self.check(&self.fail_reads, "read")?;
        self.inner.tail().await
    }

    async fn push(&self, record: &Record) -> Result<(), StoreError> {
        self.check(&self.fail_writes, "write")?;
        self.inner.push(record).await
    }
}
