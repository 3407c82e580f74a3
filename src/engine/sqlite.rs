//! Embedded SQLite query engine
//!
//! Snapshots live in an in-memory database owned by one [`SqliteEngine`].
//! The connection sits behind a `Mutex`, so the engine can be shared across
//! threads; concurrent queries serialize on the lock and each call still
//! computes its own isolated result.

use std::sync::{Mutex, MutexGuard};

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection};

use super::{Query, QueryEngine, Row, Value};
use crate::error::{Error, Result};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(v) | ValueRef::Blob(v) => {
                Value::Text(String::from_utf8_lossy(v).into_owned())
            }
        }
    }
}

/// SQLite-backed [`QueryEngine`]
pub struct SqliteEngine {
    conn: Mutex<Connection>,
}

impl SqliteEngine {
    /// Create an engine over a fresh in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::query("open_engine", e))?;
        tracing::debug!(
            sqlite_version = rusqlite::version(),
            "In-memory query engine opened"
        );
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::query(operation, "engine connection lock poisoned"))
    }

    /// Run `f` with exclusive access to the connection
    ///
    /// SQLite errors are reported as query failures of `operation`.
    pub(crate) fn with_connection<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let mut conn = self.lock(operation)?;
        f(&mut conn).map_err(|e| Error::query(operation, e))
    }
}

impl QueryEngine for SqliteEngine {
    fn execute(&self, query: &Query) -> Result<Vec<Row>> {
        let operation = query.operation();
        tracing::debug!(
            operation,
            sql = query.sql(),
            params = query.params().len(),
            "Executing query"
        );

        let rows = self.with_connection(operation, |conn| {
            let mut stmt = conn.prepare(query.sql())?;
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

            let mut rows = stmt.query(params_from_iter(query.params().iter()))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut columns = Vec::with_capacity(names.len());
                for (idx, name) in names.iter().enumerate() {
                    columns.push((name.clone(), Value::from(row.get_ref(idx)?)));
                }
                out.push(Row::new(columns));
            }
            Ok(out)
        })?;

        tracing::debug!(operation, rows = rows.len(), "Query completed");
        Ok(rows)
    }
}
