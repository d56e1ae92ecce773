//! File-backed SQLite connection handling.
//!
//! A [`Database`] wraps one rusqlite connection that opens lazily on first
//! use. Handles are passed explicitly to model operations; there is no
//! process-wide connection state, so tests and callers can run any number of
//! independent databases side by side.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::value::Value;

/// Options applied when the underlying connection is opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseOptions {
    /// Open the SQLite handle in serialized mode so it may be moved across
    /// threads. Off by default; ownership rules still forbid sharing a
    /// handle between threads simultaneously.
    pub cross_thread_allowed: bool,
    /// How long the engine waits on a locked database before failing.
    pub busy_timeout: Option<Duration>,
}

/// A lazily opened connection to a SQLite database file.
#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    options: DatabaseOptions,
    conn: Option<Connection>,
}

impl Database {
    /// Create a handle for the database at `path` with default options.
    /// No I/O happens until the first operation.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::open_with(path, DatabaseOptions::default())
    }

    /// Create a handle with explicit options.
    pub fn open_with(path: impl AsRef<Path>, options: DatabaseOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
            conn: None,
        }
    }

    /// Create a handle backed by an in-memory database. The contents live
    /// only as long as the connection stays open.
    pub fn in_memory() -> Self {
        Self::open(":memory:")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the underlying connection if it is not open yet.
    pub fn connect(&mut self) -> Result<&Connection> {
        if self.conn.is_none() {
            let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
            flags |= if self.options.cross_thread_allowed {
                OpenFlags::SQLITE_OPEN_FULL_MUTEX
            } else {
                OpenFlags::SQLITE_OPEN_NO_MUTEX
            };
            let conn = Connection::open_with_flags(&self.path, flags)?;
            if let Some(timeout) = self.options.busy_timeout {
                conn.busy_timeout(timeout)?;
            }
            debug!(path = %self.path.display(), "opened sqlite connection");
            self.conn = Some(conn);
        }
        self.conn.as_ref().ok_or(Error::NotConnected)
    }

    /// Close the connection. The next operation reopens it.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, err)| Error::Storage(err))?;
            debug!(path = %self.path.display(), "closed sqlite connection");
        }
        Ok(())
    }

    /// Whether the underlying connection is currently open.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Begin an explicit transaction if one is not already active.
    pub fn begin(&mut self) -> Result<()> {
        let conn = self.connect()?;
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN DEFERRED")?;
        }
        Ok(())
    }

    /// Commit the active transaction. A no-op in autocommit mode.
    pub fn commit(&mut self) -> Result<()> {
        let conn = self.conn.as_ref().ok_or(Error::NotConnected)?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Roll back the active transaction. A no-op in autocommit mode.
    pub fn rollback(&mut self) -> Result<()> {
        let conn = self.conn.as_ref().ok_or(Error::NotConnected)?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    /// Execute a statement, returning the number of affected rows.
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        let conn = self.connect()?;
        debug!(%sql, params = params.len(), "execute");
        Ok(conn.execute(sql, params_from_iter(params.iter()))?)
    }

    /// Execute the same statement once per parameter set.
    pub fn execute_many(&mut self, sql: &str, param_sets: &[Vec<Value>]) -> Result<usize> {
        let conn = self.connect()?;
        debug!(%sql, sets = param_sets.len(), "execute_many");
        let mut stmt = conn.prepare(sql)?;
        let mut affected = 0;
        for params in param_sets {
            affected += stmt.execute(params_from_iter(params.iter()))?;
        }
        Ok(affected)
    }

    /// Run a query and materialize every row.
    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>> {
        let conn = self.connect()?;
        debug!(%sql, params = params.len(), "query");
        let mut stmt = conn.prepare(sql)?;
        let column_count = stmt.column_count();
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            let mut out = Vec::with_capacity(column_count);
            for i in 0..column_count {
                out.push(Value::from(row.get::<_, rusqlite::types::Value>(i)?));
            }
            Ok(out)
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::from)
    }

    /// Rowid generated by the most recent successful insert.
    pub fn last_insert_rowid(&mut self) -> Result<i64> {
        Ok(self.connect()?.last_insert_rowid())
    }

    /// Run `f` inside a scoped transaction: committed on success, rolled
    /// back on error, and the connection is closed either way.
    pub fn session<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.begin()?;
        let outcome = f(self);
        let finish = match outcome {
            Ok(_) => self.commit(),
            Err(_) => self.rollback(),
        };
        let closed = self.close();
        let value = outcome?;
        finish?;
        closed?;
        Ok(value)
    }
}
