//! Per-call pagination and ordering for filtered reads.
//!
//! # Invariants
//! - Zero and unset limits/offsets contribute nothing to a statement.
//! - Sort columns are validated when the statement is assembled.

use serde::{Deserialize, Serialize};

/// Sort direction for `Sort`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` key. The column must be a plain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Per-call pagination and ordering for `Repository::filter`.
///
/// Unset and zero values are left out of the statement. Several options
/// passed to one call are all applied, in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Maximum rows to return. `None` and `Some(0)` mean no limit.
    pub limit: Option<u32>,
    /// Rows skipped before collection.
    pub offset: u32,
    pub sort: Option<Sort>,
}

impl FilterOptions {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn offset(offset: u32) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    pub fn sort(sort: Sort) -> Self {
        Self {
            sort: Some(sort),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub(crate) fn effective_limit(&self) -> Option<u32> {
        self.limit.filter(|limit| *limit > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterOptions, Sort, SortDirection};

    #[test]
    fn zero_limit_counts_as_unset() {
        assert_eq!(FilterOptions::limit(0).effective_limit(), None);
        assert_eq!(FilterOptions::limit(5).effective_limit(), Some(5));
    }

    #[test]
    fn deserializes_partial_options() {
        let options: FilterOptions =
            serde_json::from_str(r#"{ "limit": 10, "sort": { "column": "name", "direction": "desc" } }"#)
                .unwrap();

        assert_eq!(options.limit, Some(10));
        assert_eq!(options.offset, 0);
        assert_eq!(options.sort, Some(Sort::desc("name")));
        assert_eq!(
            FilterOptions::default().with_sort(Sort::asc("id")).sort.map(|s| s.direction),
            Some(SortDirection::Asc)
        );
    }
}
