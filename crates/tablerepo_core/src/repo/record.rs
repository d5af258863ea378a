//! Row mapping contract for repository record types.
//!
//! # Invariants
//! - `COLUMNS` lists persisted columns in the order `to_values` returns
//!   their values.
//! - The identifier column is never part of `COLUMNS`; the store assigns it.

use rusqlite::types::Value;
use rusqlite::Row;

/// Store-assigned row identifier (`INTEGER PRIMARY KEY`).
pub type RecordId = i64;

/// A type that maps one-to-one onto a table row.
///
/// ```
/// use rusqlite::types::Value;
/// use rusqlite::Row;
/// use tablerepo_core::Record;
///
/// struct Sample {
///     id: i64,
///     name: String,
/// }
///
/// impl Record for Sample {
///     const COLUMNS: &'static [&'static str] = &["name"];
///
///     fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
///         Ok(Self {
///             id: row.get("id")?,
///             name: row.get("name")?,
///         })
///     }
///
///     fn to_values(&self) -> Vec<Value> {
///         vec![Value::Text(self.name.clone())]
///     }
/// }
/// ```
pub trait Record: Sized {
    /// Persisted columns, identifier excluded.
    const COLUMNS: &'static [&'static str];

    const ID_COLUMN: &'static str = "id";

    /// Decodes one row. Selected columns are `ID_COLUMN` followed by
    /// `COLUMNS`, so both name and index lookups work.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Values bound on insert, one per entry of `COLUMNS`.
    fn to_values(&self) -> Vec<Value>;
}
