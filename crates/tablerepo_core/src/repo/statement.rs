//! SQL statement assembly for the generic repository.
//!
//! # Invariants
//! - Values are always bound; only identifiers are written into SQL text,
//!   and every identifier is double-quoted.
//! - Table names and sort columns must match `^[A-Za-z_][A-Za-z0-9_]*$`.
//! - Sort columns must be among the columns the record selects.
//! - Clause order is `WHERE`, `ORDER BY`, `LIMIT`, `OFFSET`.

use crate::repo::error::{RepoError, RepoResult};
use crate::repo::filter::QueryFragment;
use crate::repo::options::FilterOptions;
use crate::repo::record::{Record, RecordId};
use crate::repo::update::{validate_update, UpdateMap};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;

static PLAIN_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// SQL text and the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

pub(crate) fn is_plain_identifier(name: &str) -> bool {
    PLAIN_IDENTIFIER_RE.is_match(name)
}

pub(crate) fn ensure_plain_identifier(name: &str) -> RepoResult<()> {
    if is_plain_identifier(name) {
        Ok(())
    } else {
        Err(RepoError::InvalidIdentifier(name.to_string()))
    }
}

/// Double-quotes an identifier, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_list<T: Record>() -> String {
    std::iter::once(T::ID_COLUMN)
        .chain(T::COLUMNS.iter().copied())
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

fn ensure_selected_column<T: Record>(column: &str) -> RepoResult<()> {
    if column == T::ID_COLUMN || T::COLUMNS.contains(&column) {
        Ok(())
    } else {
        Err(RepoError::InvalidIdentifier(column.to_string()))
    }
}

fn push_where(sql: &mut String, params: &mut Vec<Value>, fragment: QueryFragment) {
    if fragment.is_empty() {
        return;
    }
    let (clause, values) = fragment.into_parts();
    sql.push_str(" WHERE ");
    sql.push_str(&clause);
    params.extend(values);
}

/// Appends the clauses contributed by `options`.
///
/// Sort keys from every option join one `ORDER BY` list in the order
/// given. Each non-zero limit and offset is emitted; repeated limits or
/// offsets are not merged, so SQLite rejects them at prepare time.
fn push_options<T: Record>(
    sql: &mut String,
    params: &mut Vec<Value>,
    options: &[FilterOptions],
) -> RepoResult<()> {
    let mut sort_keys = Vec::new();
    let mut limits = Vec::new();
    let mut offsets = Vec::new();

    for option in options {
        if let Some(limit) = option.effective_limit() {
            limits.push(limit);
        }
        if option.offset > 0 {
            offsets.push(option.offset);
        }
        if let Some(sort) = &option.sort {
            ensure_plain_identifier(&sort.column)?;
            ensure_selected_column::<T>(&sort.column)?;
            sort_keys.push(format!(
                "{} {}",
                quote_ident(&sort.column),
                sort.direction.as_sql()
            ));
        }
    }

    if !sort_keys.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&sort_keys.join(", "));
    }

    // SQLite only accepts OFFSET after a LIMIT.
    if limits.is_empty() && !offsets.is_empty() {
        sql.push_str(" LIMIT -1");
    }
    for limit in limits {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(i64::from(limit)));
    }
    for offset in offsets {
        sql.push_str(" OFFSET ?");
        params.push(Value::Integer(i64::from(offset)));
    }

    Ok(())
}

pub(crate) fn select<T: Record>(
    table: &str,
    fragment: QueryFragment,
    options: &[FilterOptions],
) -> RepoResult<Statement> {
    let mut sql = format!("SELECT {} FROM {}", column_list::<T>(), quote_ident(table));
    let mut params = Vec::new();
    push_where(&mut sql, &mut params, fragment);
    push_options::<T>(&mut sql, &mut params, options)?;
    Ok(Statement { sql, params })
}

/// First match by ascending identifier.
pub(crate) fn select_first<T: Record>(table: &str, fragment: QueryFragment) -> Statement {
    let mut sql = format!("SELECT {} FROM {}", column_list::<T>(), quote_ident(table));
    let mut params = Vec::new();
    push_where(&mut sql, &mut params, fragment);
    sql.push_str(&format!(" ORDER BY {} ASC LIMIT 1", quote_ident(T::ID_COLUMN)));
    Statement { sql, params }
}

pub(crate) fn select_by_id<T: Record>(table: &str, id: RecordId) -> Statement {
    Statement {
        sql: format!(
            "SELECT {} FROM {} WHERE {} = ?",
            column_list::<T>(),
            quote_ident(table),
            quote_ident(T::ID_COLUMN)
        ),
        params: vec![Value::Integer(id)],
    }
}

pub(crate) fn count(table: &str, fragment: QueryFragment) -> Statement {
    let mut sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let mut params = Vec::new();
    push_where(&mut sql, &mut params, fragment);
    Statement { sql, params }
}

pub(crate) fn insert<T: Record>(table: &str, values: Vec<Value>) -> RepoResult<Statement> {
    if values.len() != T::COLUMNS.len() {
        return Err(RepoError::InvalidRecord(format!(
            "expected {} values for columns {:?}, got {}",
            T::COLUMNS.len(),
            T::COLUMNS,
            values.len()
        )));
    }

    let sql = if T::COLUMNS.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table))
    } else {
        let columns = T::COLUMNS
            .iter()
            .map(|column| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; T::COLUMNS.len()].join(", ");
        format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            quote_ident(table)
        )
    };

    Ok(Statement {
        sql,
        params: values,
    })
}

pub(crate) fn update<T: Record>(
    table: &str,
    id: RecordId,
    changes: UpdateMap,
) -> RepoResult<Statement> {
    validate_update::<T>(&changes)?;

    let mut assignments = Vec::with_capacity(changes.len());
    let mut params = Vec::with_capacity(changes.len() + 1);
    for (column, value) in changes {
        assignments.push(format!("{} = ?", quote_ident(&column)));
        params.push(value);
    }
    params.push(Value::Integer(id));

    Ok(Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote_ident(table),
            assignments.join(", "),
            quote_ident(T::ID_COLUMN)
        ),
        params,
    })
}

pub(crate) fn delete<T: Record>(table: &str, id: RecordId) -> Statement {
    Statement {
        sql: format!(
            "DELETE FROM {} WHERE {} = ?",
            quote_ident(table),
            quote_ident(T::ID_COLUMN)
        ),
        params: vec![Value::Integer(id)],
    }
}

#[cfg(test)]
mod tests {
    use super::{
        count, delete, insert, is_plain_identifier, quote_ident, select, select_first, update,
    };
    use crate::repo::error::RepoError;
    use crate::repo::filter::{ColumnEq, Filter, QueryFragment};
    use crate::repo::options::{FilterOptions, Sort};
    use crate::repo::record::Record;
    use crate::repo::update::{FieldChanges, PartialUpdate};
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
    fn identifiers_are_validated_and_quoted() {
        assert!(is_plain_identifier("sample_2"));
        assert!(!is_plain_identifier("2sample"));
        assert!(!is_plain_identifier("sample; DROP TABLE x"));
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn select_without_filter_or_options_has_no_tail() {
        let statement = select::<Person>("people", QueryFragment::empty(), &[]).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT "id", "name", "age" FROM "people""#
        );
        assert!(statement.params.is_empty());
    }

    #[test]
    fn select_orders_clauses_and_binds_pagination() {
        let fragment = ColumnEq::new("name", "John Doe".to_string()).to_query();
        let options = [
            FilterOptions::limit(10),
            FilterOptions::offset(5).with_sort(Sort::desc("age")),
        ];

        let statement = select::<Person>("people", fragment, &options).unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT "id", "name", "age" FROM "people" WHERE "name" = ? ORDER BY "age" DESC LIMIT ? OFFSET ?"#
        );
        assert_eq!(
            statement.params,
            vec![
                Value::Text("John Doe".to_string()),
                Value::Integer(10),
                Value::Integer(5),
            ]
        );
    }

    #[test]
    fn offset_without_limit_uses_unbounded_limit() {
        let statement =
            select::<Person>("people", QueryFragment::empty(), &[FilterOptions::offset(2)]).unwrap();
        assert!(statement.sql.ends_with(" LIMIT -1 OFFSET ?"));
        assert_eq!(statement.params, vec![Value::Integer(2)]);
    }

    #[test]
    fn zero_valued_options_are_omitted() {
        let options = [FilterOptions::limit(0), FilterOptions::offset(0)];
        let statement = select::<Person>("people", QueryFragment::empty(), &options).unwrap();
        assert_eq!(statement.sql, r#"SELECT "id", "name", "age" FROM "people""#);
    }

    #[test]
    fn sort_keys_accumulate_in_given_order() {
        let options = [
            FilterOptions::sort(Sort::asc("name")),
            FilterOptions::sort(Sort::desc("age")),
        ];
        let statement = select::<Person>("people", QueryFragment::empty(), &options).unwrap();
        assert!(statement.sql.ends_with(r#" ORDER BY "name" ASC, "age" DESC"#));
    }

    #[test]
    fn sort_column_must_be_plain_identifier() {
        let options = [FilterOptions::sort(Sort::asc("name; DROP TABLE people"))];
        let err = select::<Person>("people", QueryFragment::empty(), &options).unwrap_err();
        assert!(matches!(err, RepoError::InvalidIdentifier(_)));
    }

    #[test]
    fn sort_column_must_be_selected_by_record() {
        let options = [FilterOptions::sort(Sort::desc("nmae"))];
        let err = select::<Person>("people", QueryFragment::empty(), &options).unwrap_err();
        assert!(matches!(err, RepoError::InvalidIdentifier(ref column) if column == "nmae"));

        let by_id = [FilterOptions::sort(Sort::desc("id"))];
        let statement = select::<Person>("people", QueryFragment::empty(), &by_id).unwrap();
        assert!(statement.sql.ends_with(r#" ORDER BY "id" DESC"#));
    }

    #[test]
    fn first_match_breaks_ties_by_identifier() {
        let statement = select_first::<Person>("people", QueryFragment::empty());
        assert!(statement.sql.ends_with(r#" ORDER BY "id" ASC LIMIT 1"#));
    }

    #[test]
    fn count_reuses_filter_params() {
        let fragment = ColumnEq::new("age", 3).to_query();
        let statement = count("people", fragment);
        assert_eq!(statement.sql, r#"SELECT COUNT(*) FROM "people" WHERE "age" = ?"#);
        assert_eq!(statement.params, vec![Value::Integer(3)]);
    }

    #[test]
    fn insert_rejects_mismatched_value_count() {
        let err = insert::<Person>("people", vec![Value::Null]).unwrap_err();
        assert!(matches!(err, RepoError::InvalidRecord(_)));

        let statement = insert::<Person>(
            "people",
            vec![Value::Text("a".to_string()), Value::Integer(1)],
        )
        .unwrap();
        assert_eq!(
            statement.sql,
            r#"INSERT INTO "people" ("name", "age") VALUES (?, ?)"#
        );
    }

    #[test]
    fn update_sets_only_supplied_columns() {
        let changes = FieldChanges::<Person>::new().set("age", 40);
        let statement = update::<Person>("people", 9, changes.to_update()).unwrap();

        assert_eq!(statement.sql, r#"UPDATE "people" SET "age" = ? WHERE "id" = ?"#);
        assert_eq!(statement.params, vec![Value::Integer(40), Value::Integer(9)]);
    }

    #[test]
    fn delete_binds_identifier() {
        let statement = delete::<Person>("people", 4);
        assert_eq!(statement.sql, r#"DELETE FROM "people" WHERE "id" = ?"#);
        assert_eq!(statement.params, vec![Value::Integer(4)]);
    }
}
