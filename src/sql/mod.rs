//! Query execution for SQL tasks.
//!
//! A query submission is a SQL string. Each input of the test case is
//! registered as a table under its argument name, the query runs against
//! those tables, and its result set comes back as a [`Table`].

mod error;

pub use error::QueryError;

use std::collections::BTreeMap;

use crate::value::{Table, Value};

/// Backend that runs a SQL query over named input tables.
pub trait QueryEngine {
    fn execute(&self, query: &str, tables: &BTreeMap<String, Table>) -> Result<Table, QueryError>;
}

/// Query engine available in this build, if any.
pub fn default_engine() -> Option<Box<dyn QueryEngine>> {
    #[cfg(feature = "sqlite")]
    {
        Some(Box::new(SqliteEngine::new()))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        None
    }
}

/// Require every argument to be a table.
pub fn tables_from_args(args: &BTreeMap<String, Value>) -> Result<BTreeMap<String, Table>, QueryError> {
    args.iter()
        .map(|(name, value)| match value {
            Value::Table(table) => Ok((name.clone(), table.clone())),
            other => Err(QueryError::NotATable(name.clone(), other.type_name())),
        })
        .collect()
}

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEngine;

#[cfg(feature = "sqlite")]
mod sqlite {
    use std::collections::BTreeMap;

    use rusqlite::types::Value as SqlValue;
    use rusqlite::{Connection, params_from_iter};

    use super::{QueryEngine, QueryError};
    use crate::codec::value_to_json;
    use crate::logging::{debug, trace};
    use crate::value::{Table, Value};

    /// Runs each query in a fresh in-memory SQLite database.
    ///
    /// Columns are created without a declared type, so every cell keeps the
    /// storage class of the value inserted into it. Values without a SQLite
    /// counterpart (lists, dictionaries, arrays) are stored as JSON text.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SqliteEngine;

    impl SqliteEngine {
        pub fn new() -> Self {
            Self
        }
    }

    impl QueryEngine for SqliteEngine {
        fn execute(
            &self,
            query: &str,
            tables: &BTreeMap<String, Table>,
        ) -> Result<Table, QueryError> {
            let conn = Connection::open_in_memory()?;
            for (name, table) in tables {
                register(&conn, name, table)?;
            }

            let mut stmt = conn.prepare(query.trim())?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let width = columns.len();
            let rows = stmt
                .query_map([], |row| {
                    (0..width)
                        .map(|i| row.get::<_, SqlValue>(i).map(from_sql))
                        .collect::<Result<Vec<_>, _>>()
                })?
                .collect::<Result<Vec<_>, _>>()?;

            debug!(columns = width, rows = rows.len(), "query finished");
            Ok(Table::new(columns, rows)?)
        }
    }

    fn register(conn: &Connection, name: &str, table: &Table) -> Result<(), QueryError> {
        if table.columns().is_empty() {
            // SQLite tables need at least one column.
            debug!(table = name, "skipping table without columns");
            return Ok(());
        }
        let columns = table
            .columns()
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute(&format!("CREATE TABLE {} ({})", quote(name), columns), [])?;

        let placeholders = vec!["?"; table.columns().len()].join(", ");
        let mut insert = conn.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            quote(name),
            placeholders
        ))?;
        for row in table.rows() {
            insert.execute(params_from_iter(row.iter().map(to_sql)))?;
        }
        trace!(table = name, rows = table.num_rows(), "registered input table");
        Ok(())
    }

    fn quote(identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn to_sql(value: &Value) -> SqlValue {
        match value {
            Value::None => SqlValue::Null,
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            Value::Int(i) => SqlValue::Integer(*i),
            Value::Float(f) if f.is_nan() => SqlValue::Null,
            Value::Float(f) => SqlValue::Real(*f),
            Value::Str(s) => SqlValue::Text(s.clone()),
            other => SqlValue::Text(value_to_json(other).to_string()),
        }
    }

    fn from_sql(value: SqlValue) -> Value {
        match value {
            SqlValue::Null => Value::None,
            SqlValue::Integer(i) => Value::Int(i),
            SqlValue::Real(f) => Value::Float(f),
            SqlValue::Text(s) => Value::Str(s),
            SqlValue::Blob(b) => Value::Str(String::from_utf8_lossy(&b).into_owned()),
        }
    }

}
