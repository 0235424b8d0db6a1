//! Forward-only result cursors the binder reads from.
//!
//! - `result_set`: cursor over a materialized [`ResultSet`](crate::results::ResultSet)
//! - `sqlite::SqliteCursor` / `postgres::PgCursor`: driver-backed cursors (behind features)

pub mod result_set;

pub use result_set::ResultSetCursor;

use crate::error::SqlBindError;
use crate::types::RowValues;

/// An open, forward-only result set.
pub trait Cursor {
    /// Move to the next row. Returns `false` once the rows are exhausted.
    ///
    /// # Errors
    ///
    /// Propagates driver errors raised while fetching the row.
    fn advance(&mut self) -> Result<bool, SqlBindError>;

    /// Column names of the result, in select order.
    fn column_names(&self) -> &[String];

    /// Write every value of the current row into `sink`, position by position.
    ///
    /// # Errors
    ///
    /// Returns [`SqlBindError::ColumnCountMismatch`] when the sink width differs from the column
    /// count, and propagates conversion errors from the sink.
    fn scan_into(&mut self, sink: &mut dyn RowSink) -> Result<(), SqlBindError>;
}

/// Ordered writable locations for one row.
pub trait RowSink {
    fn width(&self) -> usize;

    /// # Errors
    ///
    /// Returns an error when `value` cannot be stored at `position`.
    fn write(&mut self, position: usize, value: RowValues) -> Result<(), SqlBindError>;
}

impl<C: Cursor + ?Sized> Cursor for &mut C {
    fn advance(&mut self) -> Result<bool, SqlBindError> {
        (**self).advance()
    }

    fn column_names(&self) -> &[String] {
        (**self).column_names()
    }

    fn scan_into(&mut self, sink: &mut dyn RowSink) -> Result<(), SqlBindError> {
        (**self).scan_into(sink)
    }
}

/// Shared by cursor implementations: check the sink width and the row length against the
/// column count, then write values in order.
pub(crate) fn write_row<I>(values: I, columns: usize, sink: &mut dyn RowSink) -> Result<(), SqlBindError>
where
    I: IntoIterator<Item = Result<RowValues, SqlBindError>>,
    I::IntoIter: ExactSizeIterator,
{
    if sink.width() != columns {
        return Err(SqlBindError::ColumnCountMismatch {
            expected: sink.width(),
            actual: columns,
        });
    }
    let values = values.into_iter();
    if values.len() != columns {
        return Err(SqlBindError::ColumnCountMismatch {
            expected: columns,
            actual: values.len(),
        });
    }
    for (position, value) in values.enumerate() {
        sink.write(position, value?)?;
    }
    Ok(())
}

pub(crate) fn not_positioned() -> SqlBindError {
    SqlBindError::ExecutionError("scan_into called without a current row".to_string())
}
