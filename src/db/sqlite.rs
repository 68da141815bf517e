//! SQLite implementation of the database collaborator.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params_from_iter};
use tracing::debug;

use super::{DatabaseSession, Params, SessionError, SessionFactory};
use crate::config::DatabaseConfig;

const BATCH_SAVEPOINT: &str = "execute_many";

/// A [`DatabaseSession`] over one SQLite connection.
///
/// A transaction is opened lazily by the first statement after a commit or rollback.
#[derive(Debug)]
pub struct SqliteSession {
    conn: Connection,
}

impl SqliteSession {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SessionError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Open a session as described by `config`.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, SessionError> {
        let session = Self::open(&config.path)?;
        session.conn.busy_timeout(config.busy_timeout)?;
        Ok(session)
    }

    /// Borrow the underlying connection (e.g. for ad-hoc queries in tests).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn begin_if_needed(&self) -> Result<(), SessionError> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }
}

impl DatabaseSession for SqliteSession {
    fn execute(&mut self, sql: &str, params: &Params) -> Result<usize, SessionError> {
        debug!(sql, params = params.len(), "execute");
        self.begin_if_needed()?;
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.execute(params_from_iter(params.iter()))?)
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<Option<String>>]) -> Result<usize, SessionError> {
        debug!(sql, rows = rows.len(), "execute_many");
        self.begin_if_needed()?;
        self.conn.execute_batch(&format!("SAVEPOINT {BATCH_SAVEPOINT}"))?;
        match insert_all(&self.conn, sql, rows) {
            Ok(n) => {
                self.conn.execute_batch(&format!("RELEASE {BATCH_SAVEPOINT}"))?;
                Ok(n)
            }
            Err(e) => {
                self.conn.execute_batch(&format!(
                    "ROLLBACK TO {BATCH_SAVEPOINT}; RELEASE {BATCH_SAVEPOINT}"
                ))?;
                Err(e)
            }
        }
    }

    fn table_exists(&mut self, name: &str) -> Result<bool, SessionError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn commit(&mut self) -> Result<(), SessionError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SessionError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), SessionError> {
        self.conn.close().map_err(|(_, e)| SessionError::Sqlite(e))
    }
}

fn insert_all(conn: &Connection, sql: &str, rows: &[Vec<Option<String>>]) -> Result<usize, SessionError> {
    let mut stmt = conn.prepare_cached(sql)?;
    let mut affected = 0;
    for row in rows {
        affected += stmt.execute(params_from_iter(row.iter()))?;
    }
    Ok(affected)
}

/// Opens a [`SqliteSession`] per ingestion call from a [`DatabaseConfig`].
#[derive(Debug, Clone)]
pub struct SqliteSessionFactory {
    config: DatabaseConfig,
}

impl SqliteSessionFactory {
    /// Create a factory for `config`.
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for SqliteSessionFactory {
    fn open_session(&self) -> Result<Box<dyn DatabaseSession>, SessionError> {
        Ok(Box::new(SqliteSession::from_config(&self.config)?))
    }
}
