//! Generic table repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/get/update/delete/filter/find_one/count for any
//!   `Record` type bound to one table.
//! - Keep statement assembly and transaction handling inside the
//!   persistence boundary.
//!
//! # Invariants
//! - Every write runs in exactly one transaction: its own, or the one the
//!   caller passes to a `*_in` method.
//! - A failed commit is reported as `RepoError::Commit`, never `Write`.
//! - Updates and deletes that match no row succeed; `rows_affected=0` is
//!   only logged.
//! - No operation retries.

use crate::db::{ConnectionHandle, DbError, ExecOutcome, HandleTransaction};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::filter::{Filter, MatchAll, QueryFragment};
use crate::repo::options::FilterOptions;
use crate::repo::record::{Record, RecordId};
use crate::repo::statement::{self, ensure_plain_identifier, Statement};
use crate::repo::update::PartialUpdate;
use log::{debug, error};
use rusqlite::types::Value;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::time::Instant;

/// CRUD and query contract for one record type.
pub trait Repository<T: Record> {
    /// Fetches the row with this identifier.
    fn get(&self, id: RecordId) -> RepoResult<T>;
    /// Inserts `record` and returns the identifier the store assigned.
    fn create(&self, record: &T) -> RepoResult<RecordId>;
    /// Changes only the columns `changes` resolves to.
    fn update(&self, id: RecordId, changes: &dyn PartialUpdate<T>) -> RepoResult<()>;
    fn delete(&self, id: RecordId) -> RepoResult<()>;
    /// Rows matching `filter` (all rows when `None`), shaped by `options`.
    fn filter(&self, filter: Option<&dyn Filter>, options: &[FilterOptions])
        -> RepoResult<Vec<T>>;
    /// First row matching `filter`, by ascending identifier.
    fn find_one(&self, filter: Option<&dyn Filter>) -> RepoResult<T>;
    fn count(&self, filter: Option<&dyn Filter>) -> RepoResult<u64>;
}

/// SQLite-backed repository bound to one table.
pub struct SqliteRepository<'conn, T> {
    handle: &'conn ConnectionHandle,
    table: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Debug for SqliteRepository<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRepository")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl<'conn, T: Record> SqliteRepository<'conn, T> {
    /// Binds `T` to `table` without inspecting the schema.
    ///
    /// # Errors
    /// - `InvalidIdentifier` when `table` is not a plain SQL identifier.
    pub fn new(handle: &'conn ConnectionHandle, table: impl Into<String>) -> RepoResult<Self> {
        let table = table.into();
        ensure_plain_identifier(&table)?;
        Ok(Self {
            handle,
            table,
            _record: PhantomData,
        })
    }

    /// Binds `T` to `table` after checking that the table carries the
    /// identifier column and every column `T` persists.
    pub fn try_new(handle: &'conn ConnectionHandle, table: impl Into<String>) -> RepoResult<Self> {
        let repo = Self::new(handle, table)?;
        ensure_table_ready::<T>(handle, &repo.table)?;
        Ok(repo)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Inserts `record` inside a caller-owned transaction. The caller
    /// commits.
    pub fn create_in(&self, tx: &HandleTransaction<'_>, record: &T) -> RepoResult<RecordId> {
        let statement = statement::insert::<T>(&self.table, record.to_values())?;
        let outcome = self.write_in(tx, "create", &statement)?;
        Ok(outcome.last_insert_id)
    }

    pub fn update_in(
        &self,
        tx: &HandleTransaction<'_>,
        id: RecordId,
        changes: &dyn PartialUpdate<T>,
    ) -> RepoResult<()> {
        let statement = statement::update::<T>(&self.table, id, changes.to_update())?;
        self.write_in(tx, "update", &statement)?;
        Ok(())
    }

    pub fn delete_in(&self, tx: &HandleTransaction<'_>, id: RecordId) -> RepoResult<()> {
        let statement = statement::delete::<T>(&self.table, id);
        self.write_in(tx, "delete", &statement)?;
        Ok(())
    }

    fn write_in(
        &self,
        tx: &HandleTransaction<'_>,
        op: &'static str,
        statement: &Statement,
    ) -> RepoResult<ExecOutcome> {
        let started_at = Instant::now();
        let outcome = tx
            .execute_with_params(&statement.sql, &statement.params)
            .map_err(|err| self.write_failed(op, started_at, err))?;
        debug!(
            "event=repo_write module=repo op={op} table={} status=ok tx=caller rows_affected={} duration_ms={}",
            self.table,
            outcome.rows_affected,
            started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }

    /// begin → execute → commit. Dropping the transaction on an early
    /// return rolls it back.
    fn write_in_own_transaction(
        &self,
        op: &'static str,
        statement: &Statement,
    ) -> RepoResult<ExecOutcome> {
        let started_at = Instant::now();
        let tx = self
            .handle
            .begin()
            .map_err(|err| self.write_failed(op, started_at, err))?;
        let outcome = tx
            .execute_with_params(&statement.sql, &statement.params)
            .map_err(|err| self.write_failed(op, started_at, err))?;

        if let Err(err) = tx.commit() {
            error!(
                "event=repo_write module=repo op={op} table={} status=error error_code=commit_failed duration_ms={} error={}",
                self.table,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(RepoError::Commit(err));
        }

        debug!(
            "event=repo_write module=repo op={op} table={} status=ok rows_affected={} duration_ms={}",
            self.table,
            outcome.rows_affected,
            started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }

    fn write_failed(&self, op: &'static str, started_at: Instant, err: DbError) -> RepoError {
        error!(
            "event=repo_write module=repo op={op} table={} status=error error_code=write_failed duration_ms={} error={}",
            self.table,
            started_at.elapsed().as_millis(),
            err
        );
        RepoError::Write(err)
    }

    fn not_found(&self, id: Option<RecordId>) -> RepoError {
        RepoError::NotFound {
            table: self.table.clone(),
            id,
        }
    }
}

impl<T: Record> Repository<T> for SqliteRepository<'_, T> {
    fn get(&self, id: RecordId) -> RepoResult<T> {
        let statement = statement::select_by_id::<T>(&self.table, id);
        self.handle
            .query_optional(&statement.sql, &statement.params, T::from_row)
            .map_err(RepoError::Query)?
            .ok_or_else(|| self.not_found(Some(id)))
    }

    fn create(&self, record: &T) -> RepoResult<RecordId> {
        let statement = statement::insert::<T>(&self.table, record.to_values())?;
        let outcome = self.write_in_own_transaction("create", &statement)?;
        Ok(outcome.last_insert_id)
    }

    fn update(&self, id: RecordId, changes: &dyn PartialUpdate<T>) -> RepoResult<()> {
        // Validation happens while building the statement, before `begin`.
        let statement = statement::update::<T>(&self.table, id, changes.to_update())?;
        self.write_in_own_transaction("update", &statement)?;
        Ok(())
    }

    fn delete(&self, id: RecordId) -> RepoResult<()> {
        let statement = statement::delete::<T>(&self.table, id);
        self.write_in_own_transaction("delete", &statement)?;
        Ok(())
    }

    fn filter(
        &self,
        filter: Option<&dyn Filter>,
        options: &[FilterOptions],
    ) -> RepoResult<Vec<T>> {
        let statement = statement::select::<T>(&self.table, resolve(filter), options)?;
        self.handle
            .query_into(&statement.sql, &statement.params, T::from_row)
            .map_err(RepoError::Query)
    }

    fn find_one(&self, filter: Option<&dyn Filter>) -> RepoResult<T> {
        let statement = statement::select_first::<T>(&self.table, resolve(filter));
        self.handle
            .query_optional(&statement.sql, &statement.params, T::from_row)
            .map_err(RepoError::Query)?
            .ok_or_else(|| self.not_found(None))
    }

    fn count(&self, filter: Option<&dyn Filter>) -> RepoResult<u64> {
        let statement = statement::count(&self.table, resolve(filter));
        let count = self
            .handle
            .query_optional(&statement.sql, &statement.params, |row| row.get::<_, i64>(0))
            .map_err(RepoError::Query)?;
        // COUNT(*) is never negative.
        Ok(count.map_or(0, i64::unsigned_abs))
    }
}

fn resolve(filter: Option<&dyn Filter>) -> QueryFragment {
    filter.unwrap_or(&MatchAll).to_query()
}

fn ensure_table_ready<T: Record>(handle: &ConnectionHandle, table: &str) -> RepoResult<()> {
    let exists = handle
        .query_optional(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type IN ('table', 'view') AND name = ?1
            );",
            &[Value::Text(table.to_string())],
            |row| row.get::<_, i64>(0),
        )
        .map_err(RepoError::Query)?;
    if exists != Some(1) {
        return Err(RepoError::MissingRequiredTable(table.to_string()));
    }

    let present = handle
        .query_into(
            "SELECT name FROM pragma_table_info(?1);",
            &[Value::Text(table.to_string())],
            |row| row.get::<_, String>(0),
        )
        .map_err(RepoError::Query)?;

    for column in std::iter::once(T::ID_COLUMN).chain(T::COLUMNS.iter().copied()) {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }

    Ok(())
}
