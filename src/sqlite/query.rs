use rusqlite::types::Value;
use rusqlite::{Rows, Statement};

use crate::cursor::{Cursor, RowSink, not_positioned, write_row};
use crate::error::SqlBindError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlBindError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlBindError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Column names of a prepared statement.
#[must_use]
pub fn statement_columns(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect()
}

/// Streaming cursor over rusqlite rows.
///
/// Each [`advance`](Cursor::advance) steps the statement once and copies that row's values out,
/// so only the current row is held in memory.
pub struct SqliteCursor<'stmt> {
    rows: Rows<'stmt>,
    column_names: Vec<String>,
    current: Option<Vec<RowValues>>,
}

impl<'stmt> SqliteCursor<'stmt> {
    /// Run `stmt` with `params` and open a cursor over its rows.
    ///
    /// # Errors
    ///
    /// Returns `SqlBindError::SqliteError` if binding parameters or starting the query fails.
    pub fn open(
        stmt: &'stmt mut Statement<'_>,
        params: &[Value],
    ) -> Result<Self, SqlBindError> {
        let column_names = statement_columns(stmt);
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
        let rows = stmt.query(&param_refs[..])?;
        Ok(Self {
            rows,
            column_names,
            current: None,
        })
    }
}

impl Cursor for SqliteCursor<'_> {
    fn advance(&mut self) -> Result<bool, SqlBindError> {
        self.current = match self.rows.next()? {
            Some(row) => {
                let mut values = Vec::with_capacity(self.column_names.len());
                for idx in 0..self.column_names.len() {
                    values.push(sqlite_extract_value_sync(row, idx)?);
                }
                Some(values)
            }
            None => None,
        };
        Ok(self.current.is_some())
    }

    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn scan_into(&mut self, sink: &mut dyn RowSink) -> Result<(), SqlBindError> {
        let values = self.current.take().ok_or_else(not_positioned)?;
        write_row(values.into_iter().map(Ok), self.column_names.len(), sink)
    }
}

/// Build a result set from a `SQLite` query, reading at most `limit` rows.
///
/// # Errors
/// Returns `SqlBindError` if query execution or value extraction fails.
pub fn build_result_set(
    stmt: &mut Statement<'_>,
    params: &[Value],
    limit: Option<usize>,
) -> Result<ResultSet, SqlBindError> {
    let mut cursor = SqliteCursor::open(stmt, params)?;
    let mut result_set = ResultSet::with_capacity(cursor.column_names.clone(), 10);
    while limit.is_none_or(|max| result_set.len() < max) && cursor.advance()? {
        if let Some(values) = cursor.current.take() {
            result_set.add_row_values(values);
        }
    }
    Ok(result_set)
}

/// Count result rows without converting their values.
///
/// # Errors
/// Returns `SqlBindError` if query execution fails.
pub fn count_rows(
    stmt: &mut Statement<'_>,
    params: &[Value],
    stop_after_first: bool,
) -> Result<usize, SqlBindError> {
    let param_refs: Vec<&dyn rusqlite::ToSql> =
        params.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
    let mut rows = stmt.query(&param_refs[..])?;
    let mut count = 0;
    while rows.next()?.is_some() {
        count += 1;
        if stop_after_first {
            break;
        }
    }
    Ok(count)
}
