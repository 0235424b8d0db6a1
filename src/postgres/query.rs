use chrono::NaiveDateTime;
use serde_json::Value;
use tokio_postgres::{Row, Statement};

use crate::cursor::{Cursor, RowSink, not_positioned, write_row};
use crate::error::SqlBindError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// Types without a dedicated mapping are read as text.
///
/// # Errors
/// Returns `SqlBindError` if the column cannot be retrieved.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, SqlBindError> {
    let type_name = row.columns()[idx].type_().name();

    match type_name {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Int))
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Float))
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Bool))
        }
        "timestamp" => {
            let val: Option<NaiveDateTime> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Timestamp))
        }
        "timestamptz" => {
            let val: Option<chrono::DateTime<chrono::Utc>> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Timestamp(v.naive_utc())))
        }
        "json" | "jsonb" => {
            let val: Option<Value> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::JSON))
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Blob))
        }
        _ => {
            let val: Option<String> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Text))
        }
    }
}

/// Column names from statement metadata, available even when no rows match.
#[must_use]
pub fn statement_columns(stmt: &Statement) -> Vec<String> {
    stmt.columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect()
}

/// Cursor over rows returned by `tokio_postgres`.
///
/// Values are converted one row at a time, on [`scan_into`](Cursor::scan_into).
pub struct PgCursor {
    column_names: Vec<String>,
    rows: std::vec::IntoIter<Row>,
    current: Option<Row>,
}

impl PgCursor {
    #[must_use]
    pub fn new(column_names: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            column_names,
            rows: rows.into_iter(),
            current: None,
        }
    }

    #[must_use]
    pub fn from_statement(stmt: &Statement, rows: Vec<Row>) -> Self {
        Self::new(statement_columns(stmt), rows)
    }

    /// Convert the remaining rows into a [`ResultSet`].
    ///
    /// # Errors
    /// Returns `SqlBindError` if a value cannot be extracted.
    pub fn into_result_set(self) -> Result<ResultSet, SqlBindError> {
        let width = self.column_names.len();
        let mut result_set = ResultSet::with_capacity(self.column_names, self.rows.len());
        for row in self.rows {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(postgres_extract_value(&row, idx)?);
            }
            result_set.add_row_values(values);
        }
        Ok(result_set)
    }
}

impl Cursor for PgCursor {
    fn advance(&mut self) -> Result<bool, SqlBindError> {
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn scan_into(&mut self, sink: &mut dyn RowSink) -> Result<(), SqlBindError> {
        let row = self.current.take().ok_or_else(not_positioned)?;
        let width = self.column_names.len();
        write_row(
            (0..width).map(|idx| postgres_extract_value(&row, idx)),
            width,
            sink,
        )
    }
}
