//! Casting ballots: candidate check, device flag, mask, salt, append.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use votechain_core::{generate_salt, CandidateSet, Receipt, VotePayload};
use votechain_store::LedgerStore;

use crate::error::BallotError;
use crate::ledger::Ledger;
use crate::otp::VerifiedVoter;

/// What a device remembers about its vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVote {
    pub candidate: String,
    pub receipt: Receipt,
}

/// The "one vote per device" flag.
///
/// Serializable so a front end can keep it across restarts. This is a
/// convenience check, not double-vote prevention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    voted: Option<CastVote>,
}

impl Device {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self) -> bool {
        self.voted.is_some()
    }

    pub fn vote(&self) -> Option<&CastVote> {
        self.voted.as_ref()
    }

    /// Forget the recorded vote (demo reset). The ledger is unaffected.
    pub fn reset(&mut self) {
        self.voted = None;
    }
}

/// Turns a verified voter's choice into a ledger record.
pub struct BallotBox<S: LedgerStore> {
    ledger: Arc<Ledger<S>>,
    candidates: CandidateSet,
}

impl<S: LedgerStore> BallotBox<S> {
    pub fn new(ledger: Arc<Ledger<S>>, candidates: CandidateSet) -> Self {
        Self { ledger, candidates }
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Cast a vote stamped with the current time.
    pub async fn cast_vote(
        &self,
        device: &mut Device,
        voter: VerifiedVoter,
        candidate: &str,
    ) -> Result<Receipt, BallotError> {
        self.cast_vote_at(device, voter, candidate, now_millis()).await
    }

    /// Cast a vote with an explicit Unix-millisecond timestamp.
    ///
    /// The device flag is set only once the record is persisted; a store
    /// failure leaves the device free to retry.
    pub async fn cast_vote_at(
        &self,
        device: &mut Device,
        voter: VerifiedVoter,
        candidate: &str,
        timestamp: i64,
    ) -> Result<Receipt, BallotError> {
        if device.has_voted() {
            return Err(BallotError::AlreadyVoted);
        }
        if voter.voter_id().trim().is_empty() {
            return Err(BallotError::MissingVoterId);
        }
        if !self.candidates.contains(candidate) {
            return Err(BallotError::UnknownCandidate(candidate.to_string()));
        }

        let payload = VotePayload {
            voter_id_masked: voter.masked_id(),
            candidate: candidate.to_string(),
            salt: generate_salt(),
            timestamp,
        };
        let record = self.ledger.append(payload).await?;
        let receipt = Receipt::for_record(&record);

        device.voted = Some(CastVote {
            candidate: record.candidate,
            receipt: receipt.clone(),
        });
        Ok(receipt)
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::{CapturingSink, OtpGate, OtpPolicy};
    use votechain_store::MemoryStore;

    async fn verified(gate: &OtpGate<CapturingSink>, voter_id: &str) -> VerifiedVoter {
        gate.request(voter_id).await.unwrap();
        let code = gate.sink().last_code(voter_id).unwrap();
        gate.verify(voter_id, code.as_str()).await.unwrap()
    }

    fn ballot_box() -> BallotBox<MemoryStore> {
        BallotBox::new(
            Arc::new(Ledger::new(MemoryStore::new())),
            CandidateSet::default(),
        )
    }

    #[tokio::test]
    async fn test_cast_records_masked_vote() {
        let gate = OtpGate::with_sink(OtpPolicy::default(), CapturingSink::new());
        let bb = ballot_box();
        let mut device = Device::new();

        let voter = verified(&gate, "voter12345").await;
        let receipt = bb
            .cast_vote_at(&mut device, voter, "Ben Carter", 1_700_000_000_000)
            .await
            .unwrap();

        let records = bb.ledger().records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].voter_id_masked, "vo***45");
        assert_eq!(records[0].candidate, "Ben Carter");
        assert_eq!(records[0].timestamp, 1_700_000_000_000);
        assert_eq!(records[0].salt.split('-').count(), 4);
        assert_eq!(receipt.as_str(), records[0].hash);
        assert_eq!(device.vote().unwrap().receipt, receipt);
    }

    #[tokio::test]
    async fn test_second_vote_on_device_rejected() {
        let gate = OtpGate::with_sink(OtpPolicy::default(), CapturingSink::new());
        let bb = ballot_box();
        let mut device = Device::new();

        let first = verified(&gate, "voter12345").await;
        bb.cast_vote(&mut device, first, "Ben Carter").await.unwrap();

        let second = verified(&gate, "other-voter-9").await;
        let err = bb
            .cast_vote(&mut device, second, "Chloe Singh")
            .await
            .unwrap_err();
        assert!(matches!(err, BallotError::AlreadyVoted));
        assert_eq!(bb.ledger().len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_candidate_rejected() {
        let gate = OtpGate::with_sink(OtpPolicy::default(), CapturingSink::new());
        let bb = ballot_box();
        let mut device = Device::new();

        let voter = verified(&gate, "voter12345").await;
        let err = bb
            .cast_vote(&mut device, voter, "Nobody")
            .await
            .unwrap_err();
        assert!(matches!(err, BallotError::UnknownCandidate(name) if name == "Nobody"));
        assert!(!device.has_voted());
        assert!(bb.ledger().is_empty().await.unwrap());
    }

    #[test]
    fn test_device_serde() {
        let device = Device::new();
        let json = serde_json::to_string(&device).unwrap();
        assert_eq!(serde_json::from_str::<Device>(&json).unwrap(), device);
    }
}
