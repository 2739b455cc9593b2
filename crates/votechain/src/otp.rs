//! One-time-passcode gate.
//!
//! A voter requests a short-lived 6-digit code, which is handed to a
//! [`CodeSink`] for delivery. Presenting the right code before it expires
//! yields a [`VerifiedVoter`], the only capability that can cast a ballot.
//!
//! Codes are single use and kept in memory only. Times are Unix seconds;
//! the `*_at` variants take the clock as an argument.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex as StdMutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;
use votechain_core::mask_voter_id;

use crate::error::OtpError;

/// Default code lifetime in seconds.
pub const DEFAULT_OTP_TTL_SECS: u64 = 120;

/// Default number of wrong guesses before a code is discarded.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// A 6-digit passcode. `Debug` never prints the digits.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Draw a fresh code in `100000..=999999`.
    pub fn generate() -> Self {
        let n: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        Self(n.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn matches(&self, input: &str) -> bool {
        self.0 == input.trim()
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// Proof that a voter passed the OTP gate.
///
/// Only [`OtpGate::verify`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedVoter {
    voter_id: String,
}

impl VerifiedVoter {
    /// The raw (unmasked) voter id. Mask it before it reaches a record.
    pub fn voter_id(&self) -> &str {
        &self.voter_id
    }

    pub fn masked_id(&self) -> String {
        mask_voter_id(&self.voter_id)
    }
}

/// Delivery channel for issued codes (email in a real deployment).
#[async_trait]
pub trait CodeSink: Send + Sync {
    async fn deliver(&self, voter_id: &str, code: &OtpCode, expires_at: u64)
        -> Result<(), OtpError>;
}

/// Sink that only notes that a code went out. Never logs the code itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl CodeSink for LogSink {
    async fn deliver(
        &self,
        voter_id: &str,
        _code: &OtpCode,
        expires_at: u64,
    ) -> Result<(), OtpError> {
        tracing::info!(voter = %mask_voter_id(voter_id), expires_at, "otp issued");
        Ok(())
    }
}

/// Sink that keeps every delivered code, for demos and tests.
#[derive(Debug, Default)]
pub struct CapturingSink {
    delivered: StdMutex<Vec<(String, OtpCode)>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent code delivered to `voter_id`.
    pub fn last_code(&self, voter_id: &str) -> Option<OtpCode> {
        let delivered = self.delivered.lock().ok()?;
        delivered
            .iter()
            .rev()
            .find(|(v, _)| v == voter_id)
            .map(|(_, c)| c.clone())
    }
}

#[async_trait]
impl CodeSink for CapturingSink {
    async fn deliver(
        &self,
        voter_id: &str,
        code: &OtpCode,
        _expires_at: u64,
    ) -> Result<(), OtpError> {
        self.delivered
            .lock()
            .map_err(|e| OtpError::Delivery(e.to_string()))?
            .push((voter_id.to_string(), code.clone()));
        Ok(())
    }
}

#[derive(Debug)]
struct PendingCode {
    code: OtpCode,
    expires_at: u64,
    failures: u32,
}

/// Gate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    pub ttl_secs: u64,
    pub max_attempts: u32,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_OTP_TTL_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Issues and checks codes, one pending code per voter id.
pub struct OtpGate<K: CodeSink = LogSink> {
    policy: OtpPolicy,
    sink: K,
    pending: Mutex<HashMap<String, PendingCode>>,
}

impl OtpGate<LogSink> {
    pub fn new(policy: OtpPolicy) -> Self {
        Self::with_sink(policy, LogSink)
    }
}

impl<K: CodeSink> OtpGate<K> {
    pub fn with_sink(policy: OtpPolicy, sink: K) -> Self {
        Self {
            policy,
            sink,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> OtpPolicy {
        self.policy
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Issue a code for `voter_id`, replacing any earlier one.
    ///
    /// Codes that expired unverified are dropped here, so the pending set
    /// stays bounded by the voters active within one TTL. Returns the
    /// expiry time.
    pub async fn request(&self, voter_id: &str) -> Result<u64, OtpError> {
        self.request_at(voter_id, now_secs()).await
    }

    pub async fn request_at(&self, voter_id: &str, now: u64) -> Result<u64, OtpError> {
        let voter_id = voter_id.trim();
        if voter_id.is_empty() {
            return Err(OtpError::MissingVoterId);
        }

        let code = OtpCode::generate();
        let expires_at = now.saturating_add(self.policy.ttl_secs);
        self.sink.deliver(voter_id, &code, expires_at).await?;

        let mut pending = self.pending.lock().await;
        let purged = purge(&mut pending, now);
        if purged > 0 {
            tracing::debug!(purged, "dropped expired otp codes");
        }
        pending.insert(
            voter_id.to_string(),
            PendingCode {
                code,
                expires_at,
                failures: 0,
            },
        );
        Ok(expires_at)
    }

    /// Check `code` for `voter_id`, consuming it on success.
    pub async fn verify(&self, voter_id: &str, code: &str) -> Result<VerifiedVoter, OtpError> {
        self.verify_at(voter_id, code, now_secs()).await
    }

    pub async fn verify_at(
        &self,
        voter_id: &str,
        code: &str,
        now: u64,
    ) -> Result<VerifiedVoter, OtpError> {
        let voter_id = voter_id.trim();
        if voter_id.is_empty() {
            return Err(OtpError::MissingVoterId);
        }

        let mut pending = self.pending.lock().await;
        let entry = pending.get_mut(voter_id).ok_or(OtpError::NotFound)?;

        // Valid through the expiry second itself.
        if now > entry.expires_at {
            pending.remove(voter_id);
            tracing::warn!(voter = %mask_voter_id(voter_id), "otp expired");
            return Err(OtpError::Expired);
        }

        if !entry.code.matches(code) {
            entry.failures += 1;
            tracing::warn!(
                voter = %mask_voter_id(voter_id),
                failures = entry.failures,
                "otp rejected"
            );
            if entry.failures >= self.policy.max_attempts {
                pending.remove(voter_id);
                return Err(OtpError::TooManyAttempts);
            }
            return Err(OtpError::Invalid);
        }

        pending.remove(voter_id);
        tracing::debug!(voter = %mask_voter_id(voter_id), "otp accepted");
        Ok(VerifiedVoter {
            voter_id: voter_id.to_string(),
        })
    }

    /// Drop every code that has expired by `now`. Returns how many went.
    pub async fn purge_expired(&self, now: u64) -> usize {
        purge(&mut *self.pending.lock().await, now)
    }

    /// Codes currently awaiting verification.
    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

fn purge(pending: &mut HashMap<String, PendingCode>, now: u64) -> usize {
    let before = pending.len();
    pending.retain(|_, p| now <= p.expires_at);
    before - pending.len()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
