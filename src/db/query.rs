//! Dynamic query construction: pagination parameters and parameterized
//! filter/update fragments.
//!
//! Conditions and assignments are accumulated as (clause, parameter) pairs
//! and rendered into a single statement with positional `?n` placeholders,
//! so no request-supplied text is ever spliced into SQL.

use rusqlite::ToSql;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 200;

/// Resolved pagination window for the archived view.
///
/// Out-of-range or unparsable inputs fall back to the defaults instead of
/// erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub page_size: i64,
}

impl PageParams {
    pub fn resolve(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let page_size = page_size
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, page_size }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

/// Accumulates AND-joined WHERE conditions with positional parameters.
#[derive(Default)]
pub struct Conditions {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value and return its positional placeholder (`?n`).
    pub fn bind(&mut self, value: impl ToSql + 'static) -> String {
        self.params.push(Box::new(value));
        format!("?{}", self.params.len())
    }

    /// Append a rendered clause. Clauses are AND-joined by [`where_sql`].
    ///
    /// [`where_sql`]: Conditions::where_sql
    pub fn clause(&mut self, clause: String) {
        self.clauses.push(clause);
    }

    /// Render as a `WHERE ...` fragment, or an empty string when no clause
    /// was added.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|b| b.as_ref()).collect()
    }
}

/// Accumulates SET assignments for a partial UPDATE, preserving the
/// only-touch-supplied-fields contract.
#[derive(Default)]
pub struct UpdateSet {
    assignments: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &str, value: impl ToSql + 'static) {
        self.params.push(Box::new(value));
        self.assignments
            .push(format!("{} = ?{}", column, self.params.len()));
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Render `UPDATE <table> SET ... WHERE id = ?n`, binding the id last.
    pub fn into_update(mut self, table: &str, id: i64) -> (String, Vec<Box<dyn ToSql>>) {
        self.params.push(Box::new(id));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            self.assignments.join(", "),
            self.params.len()
        );
        (sql, self.params)
    }
}
