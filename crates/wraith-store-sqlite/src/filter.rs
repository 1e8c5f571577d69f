// crates/wraith-store-sqlite/src/filter.rs
// ============================================================================
// Module: Filter Translation
// Description: Typed filter builder producing parameterized WHERE fragments.
// Purpose: Turn declarative column/value filters plus pagination into safe SQL.
// Dependencies: wraith-core
// ============================================================================

//! ## Overview
//! Every repository query accepts a [`Filter`] over that entity's column
//! enum. Column identifiers only ever come from [`FilterColumn::as_sql`], so
//! the set of legal columns is closed at compile time; the string-keyed entry
//! point [`Filter::from_fields`] rejects unknown names with
//! [`StoreError::InvalidFilterField`] before any SQL is built. Values are
//! always bound parameters and never spliced into the SQL text.
//!
//! Translation rules:
//! - each clause becomes `column IN (?, ...)`; clauses are joined with `AND`
//! - a negative limit omits the LIMIT clause; an offset below 1 omits OFFSET
//! - an offset without a limit renders `LIMIT -1` so the OFFSET stays valid
//! - an empty filter produces no WHERE clause and matches every row

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use wraith_core::StoreError;

// ============================================================================
// SECTION: Filter Columns
// ============================================================================

/// A filterable column of one entity table.
///
/// # Invariants
/// - `as_sql` returns a fixed identifier; implementations never derive it
///   from runtime data.
/// - `parse` accepts exactly the identifiers `as_sql` can produce.
pub trait FilterColumn: Copy {
    /// Returns the SQL identifier of this column.
    fn as_sql(self) -> &'static str;

    /// Parses a caller-supplied field name into a column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidFilterField`] when the name is not a
    /// legal column for this entity.
    fn parse(name: &str) -> Result<Self, StoreError>
    where
        Self: Sized;
}

// ============================================================================
// SECTION: Pagination
// ============================================================================

/// Pagination window applied after filtering.
///
/// # Invariants
/// - `limit < 0` means unbounded; `offset < 1` means no offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of rows, or unbounded when negative.
    pub limit: i64,
    /// Rows to skip, or none when below 1.
    pub offset: i64,
}

impl Page {
    /// Unbounded window: every matching row.
    pub const ALL: Self = Self {
        limit: -1,
        offset: -1,
    };

    /// Creates a pagination window.
    #[must_use]
    pub const fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit,
            offset,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::ALL
    }
}

// ============================================================================
// SECTION: Filter
// ============================================================================

/// Declarative filter over one entity's columns.
///
/// Clauses are combined with logical AND; the values of one clause are
/// alternatives (SQL `IN`). Clause order is preserved so the bound parameter
/// order is deterministic.
#[derive(Debug, Clone)]
pub struct Filter<C> {
    /// Ordered `(column, accepted values)` clauses.
    clauses: Vec<(C, Vec<String>)>,
}

impl<C: FilterColumn> Filter<C> {
    /// Creates an empty filter matching every row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// Adds a clause accepting any of `values` for `column`.
    #[must_use]
    pub fn with<I, V>(mut self, column: C, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.clauses.push((column, values.into_iter().map(Into::into).collect()));
        self
    }

    /// Builds a filter from string field names, as supplied by the API layer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidFilterField`] when any field name is not
    /// a legal column for this entity; no SQL is built or executed.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (&'a str, Vec<String>)>,
    {
        let mut filter = Self::new();
        for (name, values) in fields {
            let column = C::parse(name)?;
            filter.clauses.push((column, values));
        }
        Ok(filter)
    }

    /// Returns true when the filter has no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Translates the filter and pagination window into a SQL fragment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when a clause carries an empty value
    /// set; the contract requires at least one accepted value per clause.
    pub fn to_sql(&self, page: Page) -> Result<FilterSql, StoreError> {
        let mut clause = String::new();
        let mut params = Vec::new();
        if !self.clauses.is_empty() {
            let mut conditions = Vec::with_capacity(self.clauses.len());
            for (column, values) in &self.clauses {
                if values.is_empty() {
                    return Err(StoreError::Invalid(format!(
                        "filter clause for column {} has no values",
                        column.as_sql()
                    )));
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                conditions.push(format!("{} IN ({placeholders})", column.as_sql()));
                params.extend(values.iter().cloned());
            }
            clause.push_str(" WHERE ");
            clause.push_str(&conditions.join(" AND "));
        }
        if page.limit >= 0 {
            let _ = write!(clause, " LIMIT {}", page.limit);
        }
        if page.offset >= 1 {
            if page.limit < 0 {
                clause.push_str(" LIMIT -1");
            }
            let _ = write!(clause, " OFFSET {}", page.offset);
        }
        Ok(FilterSql {
            clause,
            params,
        })
    }
}

impl<C: FilterColumn> Default for Filter<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A translated filter: SQL fragment plus ordered bound parameters.
///
/// # Invariants
/// - `params.len()` equals the total number of filter values.
/// - `clause` contains only fixed identifiers and `?` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSql {
    /// SQL fragment beginning with a space, or empty.
    pub clause: String,
    /// Bound parameters in clause order.
    pub params: Vec<String>,
}
