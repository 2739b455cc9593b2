//! Proptest generators for property-based testing.

use proptest::prelude::*;

use votechain_core::{mask_voter_id, seal_after, Record, VotePayload};

/// Raw voter ids, including punctuation and short ids.
pub fn voter_id() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .-]{0,16}".prop_map(String::from)
}

/// Candidate names, not restricted to the default ballot.
pub fn candidate() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Alice Johnson".to_string()),
        Just("Ben Carter".to_string()),
        Just("Chloe Singh".to_string()),
        "[A-Za-z ]{1,24}".prop_map(String::from),
    ]
}

/// Salts in the four-word format.
pub fn salt() -> impl Strategy<Value = String> {
    any::<[u32; 4]>().prop_map(|w| format!("{}-{}-{}-{}", w[0], w[1], w[2], w[3]))
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=4_102_444_800_000i64
}

/// Parameters for generating a vote payload.
#[derive(Debug, Clone)]
pub struct PayloadParams {
    pub voter_id: String,
    pub candidate: String,
    pub salt: String,
    pub timestamp: i64,
}

impl PayloadParams {
    pub fn payload(&self) -> VotePayload {
        VotePayload {
            voter_id_masked: mask_voter_id(&self.voter_id),
            candidate: self.candidate.clone(),
            salt: self.salt.clone(),
            timestamp: self.timestamp,
        }
    }
}

impl Arbitrary for PayloadParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (voter_id(), candidate(), salt(), timestamp())
            .prop_map(|(voter_id, candidate, salt, timestamp)| PayloadParams {
                voter_id,
                candidate,
                salt,
                timestamp,
            })
            .boxed()
    }
}

/// A valid chain of `1..=max_len` records.
pub fn chain(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(any::<PayloadParams>(), 1..=max_len).prop_map(|params| {
        let mut records: Vec<Record> = Vec::with_capacity(params.len());
        for p in params {
            let next = seal_after(records.last(), p.payload());
            records.push(next);
        }
        records
    })
}
