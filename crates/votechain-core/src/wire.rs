//! The export/import document: `{ "ledger": [ ...records ] }`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::record::Record;

/// A ledger wrapped for external transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub ledger: Vec<Record>,
}

impl LedgerDocument {
    pub fn new(ledger: Vec<Record>) -> Self {
        Self { ledger }
    }

    /// Parse a document, rejecting a missing or non-array `ledger` and
    /// records with missing or mistyped fields.
    ///
    /// No integrity checking happens here.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(|e| CoreError::MalformedDocument(e.to_string()))
    }

    /// Pretty-printed JSON, two-space indented.
    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    pub fn into_records(self) -> Vec<Record> {
        self.ledger
    }
}
