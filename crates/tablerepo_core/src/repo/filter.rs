//! Filter descriptors and the query fragments they resolve to.
//!
//! # Responsibility
//! - Define the `Filter` contract consumed by the generic repository.
//! - Provide column-level building blocks (equality, range, conjunction).
//!
//! # Invariants
//! - A fragment's clause carries one `?` placeholder per entry of its
//!   params, in the same order.
//! - Built-in filters never interpolate values into clause text.
//! - An empty fragment restricts nothing.

use crate::repo::statement::quote_ident;
use rusqlite::types::Value;

/// A `WHERE` predicate (without the keyword) plus its bound values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFragment {
    clause: String,
    params: Vec<Value>,
}

impl QueryFragment {
    /// Fragment that matches every row.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a fragment from predicate text with `?` placeholders.
    ///
    /// Values must go through `params`; the repository does not inspect
    /// the clause.
    pub fn new(clause: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            clause: clause.into(),
            params,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clause.trim().is_empty()
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.clause, self.params)
    }

    /// Conjunction of two fragments. Empty sides are dropped.
    pub fn and(self, other: QueryFragment) -> QueryFragment {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }

        let mut params = self.params;
        params.extend(other.params);
        QueryFragment {
            clause: format!("({}) AND ({})", self.clause, other.clause),
            params,
        }
    }
}

/// Resolves a domain predicate into a parameterized restriction.
pub trait Filter {
    fn to_query(&self) -> QueryFragment;
}

/// Selects every row. Substituted when a caller passes no filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchAll;

impl Filter for MatchAll {
    fn to_query(&self) -> QueryFragment {
        QueryFragment::empty()
    }
}

/// `column = value`; a `Null` value becomes `column IS NULL`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnEq {
    pub column: String,
    pub value: Value,
}

impl ColumnEq {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

impl Filter for ColumnEq {
    fn to_query(&self) -> QueryFragment {
        let column = quote_ident(&self.column);
        match &self.value {
            Value::Null => QueryFragment::new(format!("{column} IS NULL"), Vec::new()),
            value => QueryFragment::new(format!("{column} = ?"), vec![value.clone()]),
        }
    }
}

/// Inclusive range on one column. Missing bounds are open.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRange {
    pub column: String,
    pub min: Option<Value>,
    pub max: Option<Value>,
}

impl ColumnRange {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            min: None,
            max: None,
        }
    }

    pub fn at_least(mut self, min: impl Into<Value>) -> Self {
        self.min = Some(min.into());
        self
    }

    pub fn at_most(mut self, max: impl Into<Value>) -> Self {
        self.max = Some(max.into());
        self
    }
}

impl Filter for ColumnRange {
    fn to_query(&self) -> QueryFragment {
        let column = quote_ident(&self.column);
        let lower = match &self.min {
            Some(min) => QueryFragment::new(format!("{column} >= ?"), vec![min.clone()]),
            None => QueryFragment::empty(),
        };
        let upper = match &self.max {
            Some(max) => QueryFragment::new(format!("{column} <= ?"), vec![max.clone()]),
            None => QueryFragment::empty(),
        };
        lower.and(upper)
    }
}

/// Every inner filter must hold.
#[derive(Default)]
pub struct AllOf {
    filters: Vec<Box<dyn Filter>>,
}

impl AllOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl Filter for AllOf {
    fn to_query(&self) -> QueryFragment {
        self.filters
            .iter()
            .fold(QueryFragment::empty(), |acc, filter| acc.and(filter.to_query()))
    }
}

#[cfg(test)]
mod tests {
    use super::{AllOf, ColumnEq, ColumnRange, Filter, MatchAll, QueryFragment};
    use rusqlite::types::Value;

    #[test]
    fn match_all_is_empty() {
        assert!(MatchAll.to_query().is_empty());
    }

    #[test]
    fn equality_binds_value_instead_of_inlining_it() {
        let fragment = ColumnEq::new("name", "O'Brien'; DROP TABLE sample; --".to_string())
            .to_query();

        assert_eq!(fragment.clause(), r#""name" = ?"#);
        assert_eq!(
            fragment.params(),
            &[Value::Text("O'Brien'; DROP TABLE sample; --".to_string())]
        );
    }

    #[test]
    fn equality_with_null_uses_is_null() {
        let fragment = ColumnEq::new("name", Value::Null).to_query();
        assert_eq!(fragment.clause(), r#""name" IS NULL"#);
        assert!(fragment.params().is_empty());
    }

    #[test]
    fn range_with_both_bounds_keeps_param_order() {
        let fragment = ColumnRange::new("age").at_least(18).at_most(65).to_query();

        assert_eq!(fragment.clause(), r#"("age" >= ?) AND ("age" <= ?)"#);
        assert_eq!(fragment.params(), &[Value::Integer(18), Value::Integer(65)]);
    }

    #[test]
    fn range_without_bounds_matches_everything() {
        assert!(ColumnRange::new("age").to_query().is_empty());
    }

    #[test]
    fn all_of_skips_empty_members() {
        let filter = AllOf::new()
            .with(MatchAll)
            .with(ColumnEq::new("name", "a".to_string()))
            .with(ColumnRange::new("age").at_most(3));

        let (clause, params) = filter.to_query().into_parts();
        assert_eq!(clause, r#"("name" = ?) AND ("age" <= ?)"#);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn and_with_empty_side_returns_other_side() {
        let fragment = QueryFragment::empty().and(QueryFragment::new("x = ?", vec![1.into()]));
        assert_eq!(fragment.clause(), "x = ?");
    }
}
