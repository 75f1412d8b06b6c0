use crate::domain::{Datasets, SyncEngine, SyncStats};
use crate::errors::StoreError;
use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// How long a writer waits for another sync run holding the write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle on the SQLite database holding interests, changes and run history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Creates any missing tables and indexes. Safe to run on every start.
    pub fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        info!("database schema ready");
        Ok(())
    }

    /// Read access for queries and reports.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Provides a mutable connection to the closure.
    pub fn with_conn<F, T>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        f(&mut self.conn)
    }

    /// Runs the sync engine inside a single write transaction, so the
    /// interests and their change events are committed together or not at all.
    pub fn sync_datasets(
        &mut self,
        engine: &SyncEngine,
        datasets: &Datasets,
        now: NaiveDateTime,
    ) -> Result<SyncStats, StoreError> {
        self.with_conn(|conn| {
            // IMMEDIATE takes the write lock up front, serialising concurrent runs.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let stats = engine.sync(datasets, &*tx, now)?;
            tx.commit()?;
            Ok(stats)
        })
    }
}
