//! Configuration with TOML file support.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use votechain_core::{CandidateSet, RECEIPT_DISPLAY_LEN};
use votechain_store::{JsonFileStore, LedgerStore, MemoryStore, SqliteStore, StoreError};

use crate::error::ConfigError;
use crate::otp::{OtpPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_OTP_TTL_SECS};

/// Where the ledger lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreBackend {
    /// Lost on exit.
    Memory,
    Sqlite { path: PathBuf },
    /// The export document on disk.
    Json { path: PathBuf },
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Sqlite {
            path: PathBuf::from("votechain.db"),
        }
    }
}

impl StoreBackend {
    /// Open the configured backend.
    pub fn open(&self) -> Result<Box<dyn LedgerStore>, StoreError> {
        Ok(match self {
            StoreBackend::Memory => Box::new(MemoryStore::new()),
            StoreBackend::Sqlite { path } => Box::new(SqliteStore::open(path)?),
            StoreBackend::Json { path } => Box::new(JsonFileStore::open(path)?),
        })
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive, e.g. `"info"` or `"warn,votechain=debug"`.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Top-level configuration.
///
/// Every field has a default, so an empty file is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotechainConfig {
    /// Ballot candidates, in display order.
    #[serde(default)]
    pub candidates: CandidateSet,

    /// Seconds an OTP stays valid.
    #[serde(default = "default_otp_ttl")]
    pub otp_ttl_secs: u64,

    /// Wrong guesses allowed before a code is discarded.
    #[serde(default = "default_otp_max_attempts")]
    pub otp_max_attempts: u32,

    /// Hex characters shown for a receipt.
    #[serde(default = "default_receipt_len")]
    pub receipt_display_len: usize,

    #[serde(default)]
    pub store: StoreBackend,

    #[serde(default)]
    pub log: LogConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_otp_ttl() -> u64 {
    DEFAULT_OTP_TTL_SECS
}
fn default_otp_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_receipt_len() -> usize {
    RECEIPT_DISPLAY_LEN
}

impl Default for VotechainConfig {
    fn default() -> Self {
        Self {
            candidates: CandidateSet::default(),
            otp_ttl_secs: default_otp_ttl(),
            otp_max_attempts: default_otp_max_attempts(),
            receipt_display_len: default_receipt_len(),
            store: StoreBackend::default(),
            log: LogConfig::default(),
        }
    }
}

impl VotechainConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.candidates.is_empty() {
            return Err(ConfigError::Parse("candidate list is empty".into()));
        }
        if self.otp_max_attempts == 0 {
            return Err(ConfigError::Parse("otp_max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn otp_policy(&self) -> OtpPolicy {
        OtpPolicy {
            ttl_secs: self.otp_ttl_secs,
            max_attempts: self.otp_max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = VotechainConfig::from_toml_str("").unwrap();
        assert_eq!(config, VotechainConfig::default());
        assert_eq!(config.otp_ttl_secs, 120);
        assert_eq!(config.otp_max_attempts, 5);
        assert_eq!(config.receipt_display_len, 16);
        assert_eq!(config.candidates.len(), 3);
    }

    #[test]
    fn test_parse_full_config() {
        let config = VotechainConfig::from_toml_str(
            r#"
            candidates = ["Yes", "No"]
            otp_ttl_secs = 60

            [store]
            backend = "json"
            path = "/tmp/ledger.json"

            [log]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert!(config.candidates.contains("Yes"));
        assert_eq!(config.otp_policy().ttl_secs, 60);
        assert_eq!(
            config.store,
            StoreBackend::Json {
                path: PathBuf::from("/tmp/ledger.json")
            }
        );
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_memory_backend() {
        let config = VotechainConfig::from_toml_str("[store]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
    }

    #[tokio::test]
    async fn test_open_json_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StoreBackend::Json {
            path: dir.path().join("ledger.json"),
        };
        let store = backend.open().unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[test]
    fn test_rejects_empty_candidates() {
        assert!(VotechainConfig::from_toml_str("candidates = []").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = VotechainConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(VotechainConfig::from_toml_str(&text).unwrap(), config);
    }
}
