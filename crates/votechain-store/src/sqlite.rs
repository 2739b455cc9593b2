//! SQLite implementation of the LedgerStore trait.
//!
//! This is the primary persistent backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use votechain_core::Record;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{check_extends, LedgerStore};

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str =
    "SELECT voter_id_masked, candidate, salt, timestamp, prev_hash, hash FROM ledger";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. A `save` runs as a single
/// transaction, so a concurrent `load` sees either the old or the new
/// sequence, never a mix.
///
/// Writes take the database write lock up front (`BEGIN IMMEDIATE`), so
/// `push` checks the tail and inserts atomically even when several
/// connections or processes share the file.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(format!("sqlite connection: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

// Helper to convert a row to Record
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        voter_id_masked: row.get("voter_id_masked")?,
        candidate: row.get("candidate")?,
        salt: row.get("salt")?,
        timestamp: row.get("timestamp")?,
        prev_hash: row.get("prev_hash")?,
        hash: row.get("hash")?,
    })
}

fn insert_record(conn: &Connection, position: i64, record: &Record) -> Result<()> {
    conn.execute(
        "INSERT INTO ledger (
            position, voter_id_masked, candidate, salt, timestamp, prev_hash, hash
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            position,
            record.voter_id_masked,
            record.candidate,
            record.salt,
            record.timestamp,
            record.prev_hash,
            record.hash,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn load(&self) -> Result<Vec<Record>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY position ASC", SELECT_COLUMNS))?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            tracing::debug!(count = records.len(), "loaded ledger from sqlite");
            Ok(records)
        })
        .await
    }

    async fn save(&self, records: &[Record]) -> Result<()> {
        let records = records.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute("DELETE FROM ledger", [])?;
            for (position, record) in records.iter().enumerate() {
                insert_record(&tx, position as i64, record)?;
            }
            tx.commit()?;
            tracing::debug!(count = records.len(), "replaced ledger in sqlite");
            Ok(())
        })
        .await
    }

    async fn tail(&self) -> Result<Option<Record>> {
        self.with_conn(|conn| {
            let record = conn
                .query_row(
                    &format!("{} ORDER BY position DESC LIMIT 1", SELECT_COLUMNS),
                    [],
                    row_to_record,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn push(&self, record: &Record) -> Result<()> {
        let record = record.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let last: Option<(i64, String)> = tx
                .query_row(
                    "SELECT position, hash FROM ledger ORDER BY position DESC LIMIT 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            check_extends(last.as_ref().map(|(_, hash)| hash.as_str()), &record)?;

            let next = last.map_or(0, |(position, _)| position + 1);
            insert_record(&tx, next, &record)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn len(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM ledger", [], |row| row.get(0))?;
            usize::try_from(count)
                .map_err(|_| StoreError::InvalidData(format!("negative row count {}", count)))
        })
        .await
    }
}
