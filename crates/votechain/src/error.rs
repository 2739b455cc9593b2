//! Error types for the ledger, OTP gate and ballot box.

use thiserror::Error;
use votechain_core::{ChainFault, CoreError};
use votechain_store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The import payload was malformed; nothing was checked or stored.
    #[error("validation error: {0}")]
    Validation(String),

    /// The candidate chain failed verification; the store is untouched.
    #[error("integrity failure at record #{}: {fault}", index + 1)]
    Integrity { index: usize, fault: ChainFault },

    /// The backend could not read or write. A vote that hits this was not
    /// recorded.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<CoreError> for LedgerError {
    fn from(e: CoreError) -> Self {
        LedgerError::Validation(e.to_string())
    }
}

/// Errors from the one-time-passcode gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("voter id is required")]
    MissingVoterId,

    /// No code was requested, or it was already used.
    #[error("no OTP pending for this voter (not requested or already used)")]
    NotFound,

    #[error("OTP expired")]
    Expired,

    #[error("invalid OTP")]
    Invalid,

    #[error("too many failed attempts; request a new OTP")]
    TooManyAttempts,

    #[error("failed to deliver OTP: {0}")]
    Delivery(String),
}

/// Errors from casting a vote.
#[derive(Debug, Error)]
pub enum BallotError {
    #[error("this device has already voted")]
    AlreadyVoted,

    #[error("unknown candidate: {0}")]
    UnknownCandidate(String),

    #[error("voter id is required")]
    MissingVoterId,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(String),
}
