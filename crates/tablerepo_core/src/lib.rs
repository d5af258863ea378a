//! Generic table repository over SQLite.
//! One `SqliteRepository` per record type gives CRUD, filtered listing,
//! counting and single-record lookup with parameterized SQL throughout.

pub mod db;
pub mod logging;
pub mod repo;

pub use db::{
    open_db, open_db_in_memory, open_with_config, ConnectionConfig, ConnectionHandle, DbError,
    DbResult, ExecOutcome, HandleTransaction,
};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use repo::error::{RepoError, RepoResult};
pub use repo::filter::{AllOf, ColumnEq, ColumnRange, Filter, MatchAll, QueryFragment};
pub use repo::options::{FilterOptions, Sort, SortDirection};
pub use repo::record::{Record, RecordId};
pub use repo::table_repo::{Repository, SqliteRepository};
pub use repo::update::{FieldChanges, PartialUpdate, UpdateMap};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
