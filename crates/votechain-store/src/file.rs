//! JSON file implementation of the LedgerStore trait.
//!
//! The file holds the same `{"ledger": [...]}` document used for export, so
//! a ledger file can be handed to anyone for independent verification.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use votechain_core::{LedgerDocument, Record};

use crate::error::{Result, StoreError};
use crate::traits::{check_extends, LedgerStore};

/// File-backed store.
///
/// Writes go to `<path>.tmp` and are renamed over the target, so a reader
/// never sees a half-written file. The in-process RwLock keeps loads from
/// interleaving with a rename in flight and makes `push` a single
/// read-check-write step. Separate processes sharing one file are not
/// serialized; use SQLite for that.
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    /// Use the file at `path`, creating parent directories as needed.
    ///
    /// The file itself is only created on the first save.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            lock: RwLock::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Record>> {
        let _guard = self.lock.read().await;
        self.read_file().await
    }

    async fn save(&self, records: &[Record]) -> Result<()> {
        let _guard = self.lock.write().await;
        self.write_file(records).await
    }

    async fn push(&self, record: &Record) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut records = self.read_file().await?;
        check_extends(records.last().map(|r| r.hash.as_str()), record)?;
        records.push(record.clone());
        self.write_file(&records).await
    }
}

impl JsonFileStore {
    async fn read_file(&self) -> Result<Vec<Record>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let doc: LedgerDocument = serde_json::from_slice(&data).map_err(|e| {
            StoreError::InvalidData(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(doc.into_records())
    }

    async fn write_file(&self, records: &[Record]) -> Result<()> {
        let doc = LedgerDocument::new(records.to_vec());
        let data = serde_json::to_vec_pretty(&doc)?;

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "wrote ledger file");
        Ok(())
    }
}
