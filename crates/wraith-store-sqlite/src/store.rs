// crates/wraith-store-sqlite/src/store.rs
// ============================================================================
// Module: Wraith Store Handle
// Description: Connection ownership, transaction lifecycle, statement executor.
// Purpose: Serialize all database access through one process-lifetime transaction.
// Dependencies: wraith-core, rusqlite, rand, tracing
// ============================================================================

//! ## Overview
//! A [`WraithStore`] owns one SQLite connection with an exclusive transaction
//! held from open to close. Opening blocks until the database file lock is
//! free: acquisition retries in a tight loop on busy/locked errors, so a
//! second process waits for the first to commit. Every repository operates
//! inside this ambient transaction through the private statement-executor
//! helpers; nothing else touches the connection, and no sub-component begins
//! or ends a transaction on its own.
//!
//! Clean shutdown is [`WraithStore::close`] (commit) or
//! [`WraithStore::abort`] (rollback); dropping the handle commits
//! best-effort so every exit path ends the transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rand::RngCore;
use rand::rngs::OsRng;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use tracing::debug;
use wraith_core::StoreError;

use crate::bootstrap;
use crate::commands::CommandRepo;
use crate::config::StoreConfig;
use crate::config::ensure_parent_dir;
use crate::config::validate_store_path;
use crate::events::EventRepo;
use crate::sessions::SessionRepo;
use crate::settings::SettingsRepo;
use crate::settings::StatsRepo;
use crate::users::UserRepo;
use crate::wraiths::WraithRepo;

// ============================================================================
// SECTION: Store
// ============================================================================

/// SQLite-backed Wraith store holding the process-lifetime transaction.
///
/// # Invariants
/// - Exactly one exclusive transaction is open between construction and
///   close/abort/drop.
/// - All SQL flows through [`WraithStore::execute`] and the query helpers;
///   caller values are always bound, never interpolated.
#[derive(Debug)]
pub struct WraithStore {
    /// The single database connection.
    connection: Connection,
    /// Whether the ambient transaction is still open.
    transaction_open: bool,
}

impl WraithStore {
    /// Opens the store, acquiring the database write lock and bootstrapping
    /// the schema on first use.
    ///
    /// Blocks until the exclusive transaction is acquired; contention with a
    /// concurrent process is handled by unbounded retry and never surfaces.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the path is invalid, the database cannot
    /// be opened, or bootstrap fails.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(config)?;
        acquire_exclusive(&connection)?;
        let store = Self {
            connection,
            transaction_open: true,
        };
        bootstrap::ensure_initialized(&store)?;
        Ok(store)
    }

    /// Commits the ambient transaction and releases the database lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the commit fails.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.end_transaction("COMMIT")
    }

    /// Rolls back the ambient transaction, discarding every write made
    /// through this handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the rollback fails.
    pub fn abort(mut self) -> Result<(), StoreError> {
        self.end_transaction("ROLLBACK")
    }

    /// Ends the ambient transaction with `COMMIT` or `ROLLBACK`.
    fn end_transaction(&mut self, action: &str) -> Result<(), StoreError> {
        if !self.transaction_open {
            return Ok(());
        }
        self.transaction_open = false;
        self.connection
            .execute_batch(&format!("{action};"))
            .map_err(|err| StoreError::Db(err.to_string()))
    }

    // ------------------------------------------------------------------
    // Repositories
    // ------------------------------------------------------------------

    /// Returns the connected-agents repository.
    #[must_use]
    pub const fn wraiths(&self) -> WraithRepo<'_> {
        WraithRepo::new(self)
    }

    /// Returns the issued-commands repository.
    #[must_use]
    pub const fn commands(&self) -> CommandRepo<'_> {
        CommandRepo::new(self)
    }

    /// Returns the operator-accounts repository.
    #[must_use]
    pub const fn users(&self) -> UserRepo<'_> {
        UserRepo::new(self)
    }

    /// Returns the management-sessions repository.
    #[must_use]
    pub const fn sessions(&self) -> SessionRepo<'_> {
        SessionRepo::new(self)
    }

    /// Returns the runtime-settings repository.
    #[must_use]
    pub const fn settings(&self) -> SettingsRepo<'_> {
        SettingsRepo::new(self)
    }

    /// Returns the counters repository.
    #[must_use]
    pub const fn stats(&self) -> StatsRepo<'_> {
        StatsRepo::new(self)
    }

    /// Returns the audit-history repository.
    #[must_use]
    pub const fn events(&self) -> EventRepo<'_> {
        EventRepo::new(self)
    }

    // ------------------------------------------------------------------
    // Statement executor
    // ------------------------------------------------------------------

    /// Prepares, binds, and executes one statement, returning the number of
    /// affected rows.
    pub(crate) fn execute<P>(&self, sql: &str, params: P) -> Result<usize, StoreError>
    where
        P: rusqlite::Params,
    {
        let mut statement = self
            .connection
            .prepare_cached(sql)
            .map_err(|err| StoreError::Db(err.to_string()))?;
        statement.execute(params).map_err(|err| StoreError::Db(err.to_string()))
    }

    /// Prepares, binds, and executes one query, collecting every mapped row.
    pub(crate) fn query_rows<T, P, F>(
        &self,
        sql: &str,
        params: P,
        map_row: F,
    ) -> Result<Vec<T>, StoreError>
    where
        P: rusqlite::Params,
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        let mut statement = self
            .connection
            .prepare_cached(sql)
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let rows =
            statement.query_map(params, map_row).map_err(|err| StoreError::Db(err.to_string()))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|err| StoreError::Db(err.to_string()))?);
        }
        Ok(records)
    }

    /// Prepares, binds, and executes one single-value query.
    pub(crate) fn query_value<T, P>(&self, sql: &str, params: P) -> Result<Option<T>, StoreError>
    where
        T: rusqlite::types::FromSql,
        P: rusqlite::Params,
    {
        use rusqlite::OptionalExtension as _;
        let mut statement = self
            .connection
            .prepare_cached(sql)
            .map_err(|err| StoreError::Db(err.to_string()))?;
        statement
            .query_row(params, |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Db(err.to_string()))
    }
}

impl Drop for WraithStore {
    fn drop(&mut self) {
        if self.transaction_open {
            // Last-resort commit; errors here have no caller to reach.
            let _ = self.connection.execute_batch("COMMIT;");
        }
    }
}

// ============================================================================
// SECTION: Connection Lifecycle
// ============================================================================

/// Opens the SQLite connection and applies durability pragmas.
fn open_connection(config: &StoreConfig) -> Result<Connection, StoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Begins the exclusive ambient transaction, retrying until the file lock is
/// free.
///
/// The retry is a tight unbounded loop: lock contention is a transient
/// condition owned entirely by this function and never reaches callers.
fn acquire_exclusive(connection: &Connection) -> Result<(), StoreError> {
    let mut attempts: u64 = 0;
    loop {
        match connection.execute_batch("BEGIN EXCLUSIVE;") {
            Ok(()) => {
                if attempts > 0 {
                    debug!(attempts, "acquired database write lock after contention");
                }
                return Ok(());
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                attempts = attempts.saturating_add(1);
            }
            Err(err) => return Err(StoreError::Db(err.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current unix epoch in seconds.
pub(crate) fn unix_seconds() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_secs()).unwrap_or(i64::MAX)
}

/// Returns `byte_len` bytes of OS randomness as lowercase hex.
pub(crate) fn random_hex(byte_len: usize) -> String {
    let mut bytes = vec![0_u8; byte_len];
    OsRng.fill_bytes(&mut bytes);
    let mut encoded = String::with_capacity(byte_len * 2);
    for byte in bytes {
        let _ = write!(encoded, "{byte:02x}");
    }
    encoded
}
