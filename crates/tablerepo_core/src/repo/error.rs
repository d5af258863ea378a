//! Repository error type.
//!
//! # Invariants
//! - Every repository call fails with exactly one variant.
//! - Database failures keep the phase they happened in (`Write`,
//!   `Commit`, `Query`) and expose the driver error through `source`.

use crate::db::DbError;
use crate::repo::record::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by every repository operation.
///
/// Write failures are split by phase: `Write` means the transaction never
/// reached commit and was rolled back; `Commit` means the statement ran
/// but the commit itself failed, so durability is unknown and callers may
/// want to re-read before retrying.
#[derive(Debug)]
pub enum RepoError {
    /// No row matched where exactly one was expected.
    NotFound {
        table: String,
        id: Option<RecordId>,
    },
    /// Partial update resolved to no columns, or names a column the record
    /// does not persist.
    InvalidUpdate(String),
    /// Record values do not line up with its declared columns.
    InvalidRecord(String),
    /// Table or sort column is not a plain SQL identifier, or the sort
    /// column is not one the record selects.
    InvalidIdentifier(String),
    MissingRequiredTable(String),
    MissingRequiredColumn {
        table: String,
        column: String,
    },
    Write(DbError),
    Commit(DbError),
    Query(DbError),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                table,
                id: Some(id),
            } => write!(f, "no row in `{table}` with id {id}"),
            Self::NotFound { table, id: None } => {
                write!(f, "no row in `{table}` matched the filter")
            }
            Self::InvalidUpdate(message) => write!(f, "invalid partial update: {message}"),
            Self::InvalidRecord(message) => write!(f, "invalid record: {message}"),
            Self::InvalidIdentifier(name) => {
                write!(f, "`{name}` is not a usable SQL identifier")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::Write(err) => write!(f, "write failed before commit: {err}"),
            Self::Commit(err) => write!(f, "commit failed: {err}"),
            Self::Query(err) => write!(f, "query failed: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write(err) | Self::Commit(err) | Self::Query(err) => Some(err),
            Self::NotFound { .. }
            | Self::InvalidUpdate(_)
            | Self::InvalidRecord(_)
            | Self::InvalidIdentifier(_)
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}
