//! Query engine abstraction
//!
//! The analytics layer never talks to a database directly. It builds
//! [`Query`] values (fixed SQL text plus bound parameters) and hands them to
//! a [`QueryEngine`], which returns rows as ordered column-name → [`Value`]
//! mappings. This keeps query construction and result shaping testable
//! against any engine, including mocks.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ analytics (trends, distributions, growth)    │
//! └──────────────────────────────────────────────┘
//!                      │ Query
//!                      ▼
//! ┌──────────────────────────────────────────────┐
//! │ QueryEngine trait                            │
//! └──────────────────────────────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │  SqliteEngine   │     │      Mock       │
//! │ (bound views)   │     │   (tests)       │
//! └─────────────────┘     └─────────────────┘
//! ```

pub mod binder;
pub mod session;
pub mod sqlite;

use std::fmt;

use crate::error::{Error, Result};
use crate::models::Month;

pub use binder::{BindReport, SnapshotSet, ViewBinder};
pub use session::Session;
pub use sqlite::SqliteEngine;

// ============================================================================
// Values and Rows
// ============================================================================

/// A typed value in a result row or a bound parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
        }
    }
}

/// One result row: column names in select-list order, with their values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Value of a column by name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn require(&self, operation: &str, column: &str) -> Result<&Value> {
        self.get(column)
            .ok_or_else(|| Error::query(operation, format!("result has no column '{column}'")))
    }

    /// Non-negative integer column (counts)
    pub fn count(&self, operation: &str, column: &str) -> Result<u64> {
        match self.require(operation, column)? {
            Value::Integer(v) => u64::try_from(*v).map_err(|_| {
                Error::query(operation, format!("column '{column}' is negative: {v}"))
            }),
            other => Err(Error::query(
                operation,
                format!("column '{column}' expected an integer, got {other}"),
            )),
        }
    }

    /// Text column; NULL is an error
    pub fn text(&self, operation: &str, column: &str) -> Result<String> {
        match self.require(operation, column)? {
            Value::Text(v) => Ok(v.clone()),
            other => Err(Error::query(
                operation,
                format!("column '{column}' expected text, got {other}"),
            )),
        }
    }

    /// Month column, stored as `YYYY-MM` text
    pub fn month(&self, operation: &str, column: &str) -> Result<Month> {
        let raw = self.text(operation, column)?;
        raw.parse()
            .map_err(|e| Error::query(operation, format!("column '{column}': {e}")))
    }
}

// ============================================================================
// Queries
// ============================================================================

/// A generated query: fixed SQL text plus positionally bound parameters
///
/// SQL text is assembled only from constants and relation names; anything
/// that originates from a caller travels in `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    operation: &'static str,
    sql: String,
    params: Vec<Value>,
}

impl Query {
    pub fn new(operation: &'static str, sql: impl Into<String>) -> Self {
        Self {
            operation,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind the next positional parameter (`?1`, `?2`, ...)
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Name of the analytics operation this query implements
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Executes generated queries against the bound relations
///
/// Implementations must be safe to share across threads; every call is an
/// independent read.
pub trait QueryEngine: Send + Sync {
    /// Run a query and return all rows
    ///
    /// Failures are reported as [`Error::QueryExecution`] naming
    /// [`Query::operation`].
    fn execute(&self, query: &Query) -> Result<Vec<Row>>;
}

impl<T: QueryEngine + ?Sized> QueryEngine for std::sync::Arc<T> {
    fn execute(&self, query: &Query) -> Result<Vec<Row>> {
        (**self).execute(query)
    }
}
