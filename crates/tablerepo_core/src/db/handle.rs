//! Blocking execute/query/transaction primitives over one SQLite connection.
//!
//! # Invariants
//! - Every value reaches SQLite as a bound parameter; callers pass SQL
//!   text with `?` placeholders plus an ordered `Value` slice.
//! - A `HandleTransaction` that is dropped without `commit` rolls back.

use super::DbResult;
use rusqlite::types::Value;
use rusqlite::{
    params_from_iter, Connection, InterruptHandle, Row, Transaction, TransactionBehavior,
};

/// Result of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: usize,
    /// Rowid of the most recent successful insert on this connection.
    pub last_insert_id: i64,
}

/// Owner of the live SQLite connection shared by repositories.
///
/// Repositories borrow the handle, so it always outlives them.
#[derive(Debug)]
pub struct ConnectionHandle {
    conn: Connection,
}

impl ConnectionHandle {
    pub(crate) fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Raw connection, for callers that need driver features not
    /// covered here.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs one or more parameterless statements (schema setup, pragmas).
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn execute_with_params(&self, sql: &str, params: &[Value]) -> DbResult<ExecOutcome> {
        execute_on(&self.conn, sql, params)
    }

    /// Runs a query and decodes every row with `map`, in result order.
    pub fn query_into<R, F>(&self, sql: &str, params: &[Value], mut map: F) -> DbResult<Vec<R>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<R>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map(row)?);
        }
        Ok(out)
    }

    /// Decodes the first row of a query, or `None` when it returns no rows.
    pub fn query_optional<R, F>(&self, sql: &str, params: &[Value], map: F) -> DbResult<Option<R>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<R>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        match rows.next()? {
            Some(row) => Ok(Some(map(row)?)),
            None => Ok(None),
        }
    }

    /// Begins an immediate transaction.
    ///
    /// The write lock is taken here, so lock contention surfaces from
    /// `begin` rather than from the first statement.
    pub fn begin(&self) -> DbResult<HandleTransaction<'_>> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        Ok(HandleTransaction { tx })
    }

    /// Handle that can abort the statement currently running on this
    /// connection from another thread.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    /// Closes the connection, reporting any error from SQLite.
    pub fn close(self) -> DbResult<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}

/// One open transaction on a `ConnectionHandle`.
#[derive(Debug)]
pub struct HandleTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl HandleTransaction<'_> {
    pub fn execute_with_params(&self, sql: &str, params: &[Value]) -> DbResult<ExecOutcome> {
        execute_on(&self.tx, sql, params)
    }

    pub fn commit(self) -> DbResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    pub fn rollback(self) -> DbResult<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

fn execute_on(conn: &Connection, sql: &str, params: &[Value]) -> DbResult<ExecOutcome> {
    let rows_affected = conn.execute(sql, params_from_iter(params.iter()))?;
    Ok(ExecOutcome {
        rows_affected,
        last_insert_id: conn.last_insert_rowid(),
    })
}
