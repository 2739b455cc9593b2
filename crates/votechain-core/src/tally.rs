//! Candidate set and vote tally.

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// The fixed, ordered list of candidates on the ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateSet(Vec<String>);

impl CandidateSet {
    /// Build a set, dropping duplicate names while keeping first-seen order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self(out)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CandidateSet {
    fn default() -> Self {
        Self::new(["Alice Johnson", "Ben Carter", "Chloe Singh"])
    }
}

/// Per-candidate counts, in ballot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    counts: Vec<(String, u64)>,
}

impl Tally {
    /// Count votes for each candidate in `candidates`.
    ///
    /// Every candidate is present (zero if unvoted). Records naming a
    /// candidate outside the set are not counted.
    pub fn count(records: &[Record], candidates: &CandidateSet) -> Self {
        let mut counts: Vec<(String, u64)> =
            candidates.iter().map(|c| (c.to_string(), 0)).collect();
        for record in records {
            if let Some(entry) = counts.iter_mut().find(|(c, _)| *c == record.candidate) {
                entry.1 += 1;
            }
        }
        Self { counts }
    }

    /// Votes for one candidate (zero when absent from the set).
    pub fn get(&self, candidate: &str) -> u64 {
        self.counts
            .iter()
            .find(|(c, _)| c == candidate)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(c, n)| (c.as_str(), *n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{seal_after, VotePayload};

    fn ledger(candidates: &[&str]) -> Vec<Record> {
        let mut records: Vec<Record> = Vec::new();
        for (i, c) in candidates.iter().enumerate() {
            let payload = VotePayload {
                voter_id_masked: "****".into(),
                candidate: c.to_string(),
                salt: i.to_string(),
                timestamp: i as i64,
            };
            let next = seal_after(records.last(), payload);
            records.push(next);
        }
        records
    }

    #[test]
    fn test_tally_in_ballot_order_with_zeros() {
        let records = ledger(&["Alice Johnson", "Ben Carter", "Alice Johnson"]);
        let tally = Tally::count(&records, &CandidateSet::default());
        let rows: Vec<_> = tally.iter().collect();
        assert_eq!(
            rows,
            vec![("Alice Johnson", 2), ("Ben Carter", 1), ("Chloe Singh", 0)]
        );
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_unknown_candidates_ignored() {
        let records = ledger(&["Write In", "Ben Carter"]);
        let tally = Tally::count(&records, &CandidateSet::default());
        assert_eq!(tally.get("Ben Carter"), 1);
        assert_eq!(tally.get("Write In"), 0);
        assert_eq!(tally.total(), 1);
    }

    #[test]
    fn test_candidate_set_dedup() {
        let set = CandidateSet::new(["A", "B", "A"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("B"));
        assert!(!set.contains("C"));
    }
}
