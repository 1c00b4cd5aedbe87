//! Column-projected table reads
//!
//! Backs the data views and CSV export: the caller names the columns it
//! wants, the gateway validates them against a fixed list (column names are
//! interpolated into SQL) and returns rows of JSON values.

use serde::Serialize;
use serde_json::json;
use sqlx::{Row, SqlitePool, ValueRef};

use crate::{Error, Result};

/// Projected rows with their column names
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Select `columns` from `table` (ordered by id), rejecting names not in `allowed`
pub(crate) async fn project(
    pool: &SqlitePool,
    table: &str,
    allowed: &[&str],
    columns: &[&str],
) -> Result<Table> {
    if columns.is_empty() {
        return Err(Error::InvalidInput("No columns requested".to_string()));
    }
    if let Some(bad) = columns.iter().find(|c| !allowed.contains(c)) {
        return Err(Error::InvalidInput(format!("Invalid column: {}", bad)));
    }

    let sql = format!("SELECT {} FROM {} ORDER BY id ASC", columns.join(", "), table);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    let rows = rows
        .iter()
        .map(|row| (0..columns.len()).map(|i| cell_value(row, i)).collect())
        .collect();

    Ok(Table {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
    })
}

/// Convert one SQLite cell to JSON, by storage class
fn cell_value(row: &sqlx::sqlite::SqliteRow, i: usize) -> serde_json::Value {
    match row.try_get_raw(i) {
        Ok(raw) if raw.is_null() => serde_json::Value::Null,
        Ok(_) => row
            .try_get::<i64, _>(i)
            .map(|v| json!(v))
            .or_else(|_| row.try_get::<f64, _>(i).map(|v| json!(v)))
            .or_else(|_| row.try_get::<String, _>(i).map(serde_json::Value::String))
            .unwrap_or(serde_json::Value::Null),
        Err(_) => serde_json::Value::Null,
    }
}
