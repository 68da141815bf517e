//! Database collaborator.
//!
//! The pipeline talks to the relational store only through [`DatabaseSession`], so it can run
//! against SQLite ([`sqlite::SqliteSession`]) or an in-memory fake in tests. A
//! [`SessionFactory`] opens one session per ingestion call.

pub mod sqlite;

use thiserror::Error;

pub use sqlite::{SqliteSession, SqliteSessionFactory};

/// Bound parameters for one statement; `None` binds SQL `NULL`.
pub type Params = [Option<String>];

/// Error returned by a [`DatabaseSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// SQLite rejected the statement or connection.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Any other backend rejection.
    #[error("{0}")]
    Rejected(String),
}

/// A single, sequentially used database session.
///
/// Statements run inside an implicit transaction that lasts until [`Self::commit`] or
/// [`Self::rollback`].
pub trait DatabaseSession {
    /// Execute one statement with bound parameters; returns affected rows.
    fn execute(&mut self, sql: &str, params: &Params) -> Result<usize, SessionError>;

    /// Execute one statement once per parameter row, all or nothing.
    fn execute_many(&mut self, sql: &str, rows: &[Vec<Option<String>>]) -> Result<usize, SessionError>;

    /// Whether a table named `name` exists.
    fn table_exists(&mut self, name: &str) -> Result<bool, SessionError>;

    /// Make all statements since the last commit durable.
    fn commit(&mut self) -> Result<(), SessionError>;

    /// Discard all statements since the last commit.
    fn rollback(&mut self) -> Result<(), SessionError>;

    /// Close the session.
    fn close(self: Box<Self>) -> Result<(), SessionError>;
}

/// Opens database sessions.
pub trait SessionFactory: Send + Sync {
    /// Open a new session. Failures are reported to callers as connection failures.
    fn open_session(&self) -> Result<Box<dyn DatabaseSession>, SessionError>;
}

/// Quote an identifier for use in SQL text, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
