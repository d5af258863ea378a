//! SQLite connection handle and bootstrap entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections used by repositories.
//! - Expose the blocking execute/query/transaction primitives that the
//!   generic repository is written against.
//!
//! # Invariants
//! - Handles returned from `open_*` have the configured pragmas applied.
//! - Schema creation is the caller's concern; nothing here issues DDL on
//!   its own.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod config;
mod handle;
mod open;

pub use config::{ConnectionConfig, DEFAULT_BUSY_TIMEOUT_MS};
pub use handle::{ConnectionHandle, ExecOutcome, HandleTransaction};
pub use open::{open_db, open_db_in_memory, open_with_config};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// Returns `true` when the statement was aborted through an
    /// `InterruptHandle`.
    pub fn is_interrupted(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::OperationInterrupted
            }
            Self::Sqlite(_) => false,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
