//! Partial-update descriptors.
//!
//! # Invariants
//! - An update that resolves to no columns never reaches the database.
//! - Only columns the record persists may be changed; the identifier
//!   column is never writable through an update.

use crate::repo::error::{RepoError, RepoResult};
use crate::repo::record::Record;
use rusqlite::types::Value;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// Column name → new value. Ordered so emitted statements are stable.
pub type UpdateMap = BTreeMap<String, Value>;

/// Resolves a set of intended field changes for record type `T`.
pub trait PartialUpdate<T: Record> {
    /// Only the columns that should change.
    fn to_update(&self) -> UpdateMap;
}

/// General-purpose update builder.
///
/// ```
/// # use rusqlite::types::Value;
/// # use rusqlite::Row;
/// # use tablerepo_core::{FieldChanges, PartialUpdate, Record};
/// # struct Sample { name: String }
/// # impl Record for Sample {
/// #     const COLUMNS: &'static [&'static str] = &["name"];
/// #     fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
/// #         Ok(Self { name: row.get("name")? })
/// #     }
/// #     fn to_values(&self) -> Vec<Value> { vec![Value::Text(self.name.clone())] }
/// # }
/// let changes = FieldChanges::<Sample>::new().set("name", "Jon Snow".to_string());
/// assert_eq!(changes.to_update().len(), 1);
/// ```
pub struct FieldChanges<T> {
    changes: UpdateMap,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> FieldChanges<T> {
    pub fn new() -> Self {
        Self {
            changes: UpdateMap::new(),
            _record: PhantomData,
        }
    }

    /// Sets `column` to `value`, replacing an earlier value for the same column.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.changes.insert(column.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl<T: Record> Default for FieldChanges<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for FieldChanges<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldChanges")
            .field("changes", &self.changes)
            .finish()
    }
}

impl<T: Record> PartialUpdate<T> for FieldChanges<T> {
    fn to_update(&self) -> UpdateMap {
        self.changes.clone()
    }
}

/// Rejects empty maps and columns outside `T::COLUMNS`.
pub(crate) fn validate_update<T: Record>(changes: &UpdateMap) -> RepoResult<()> {
    if changes.is_empty() {
        return Err(RepoError::InvalidUpdate(
            "update resolves to no columns".to_string(),
        ));
    }

    for column in changes.keys() {
        if column == T::ID_COLUMN {
            return Err(RepoError::InvalidUpdate(format!(
                "identifier column `{column}` cannot be updated"
            )));
        }
        if !T::COLUMNS.contains(&column.as_str()) {
            return Err(RepoError::InvalidUpdate(format!(
                "unknown column `{column}`"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_update, FieldChanges, PartialUpdate};
    use crate::repo::error::RepoError;
    use crate::repo::record::Record;
    use rusqlite::types::Value;
    use rusqlite::Row;

    struct Person;

    impl Record for Person {
        const COLUMNS: &'static [&'static str] = &["name", "age"];

        fn from_row(_row: &Row<'_>) -> rusqlite::Result<Self> {
            Ok(Person)
        }

        fn to_values(&self) -> Vec<Value> {
            Vec::new()
        }
    }

    #[test]
    fn empty_changes_are_rejected() {
        let changes = FieldChanges::<Person>::new();
        assert!(changes.is_empty());

        let err = validate_update::<Person>(&changes.to_update()).unwrap_err();
        assert!(matches!(err, RepoError::InvalidUpdate(_)));
    }

    #[test]
    fn identifier_and_unknown_columns_are_rejected() {
        let id_change = FieldChanges::<Person>::new().set("id", 7);
        let err = validate_update::<Person>(&id_change.to_update()).unwrap_err();
        assert!(err.to_string().contains("identifier"));

        let unknown = FieldChanges::<Person>::new().set("name\" = 1; --", 1);
        let err = validate_update::<Person>(&unknown.to_update()).unwrap_err();
        assert!(err.to_string().contains("unknown column"));
    }

    #[test]
    fn later_set_replaces_earlier_value() {
        let changes = FieldChanges::<Person>::new()
            .set("age", 30)
            .set("age", 31);

        let map = changes.to_update();
        assert_eq!(map.get("age"), Some(&Value::Integer(31)));
        validate_update::<Person>(&map).unwrap();
    }
}
