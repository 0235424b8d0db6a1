use std::sync::Arc;

use crate::error::SqlBindError;
use crate::results::{DbRow, ResultSet};

use super::{Cursor, RowSink, not_positioned, write_row};

/// Cursor over rows that were already fetched into memory.
#[derive(Debug)]
pub struct ResultSetCursor {
    column_names: Arc<Vec<String>>,
    rows: std::vec::IntoIter<DbRow>,
    current: Option<DbRow>,
}

impl ResultSetCursor {
    #[must_use]
    pub fn new(result_set: ResultSet) -> Self {
        let (column_names, rows) = result_set.into_parts();
        Self {
            column_names,
            rows: rows.into_iter(),
            current: None,
        }
    }

    /// Rows not yet advanced to.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// The row the cursor is positioned on.
    #[must_use]
    pub fn current(&self) -> Option<&DbRow> {
        self.current.as_ref()
    }
}

impl From<ResultSet> for ResultSetCursor {
    fn from(result_set: ResultSet) -> Self {
        Self::new(result_set)
    }
}

impl Cursor for ResultSetCursor {
    fn advance(&mut self) -> Result<bool, SqlBindError> {
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn scan_into(&mut self, sink: &mut dyn RowSink) -> Result<(), SqlBindError> {
        let row = self.current.take().ok_or_else(not_positioned)?;
        write_row(
            row.values.into_iter().map(Ok),
            self.column_names.len(),
            sink,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowValues;

    struct Collect(Vec<RowValues>, usize);

    impl RowSink for Collect {
        fn width(&self) -> usize {
            self.1
        }

        fn write(&mut self, _position: usize, value: RowValues) -> Result<(), SqlBindError> {
            self.0.push(value);
            Ok(())
        }
    }

    fn two_rows() -> ResultSet {
        let mut rs = ResultSet::new(vec!["id".into(), "name".into()]);
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("Ann".into())]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Text("Bo".into())]);
        rs
    }

    #[test]
    fn advances_through_rows_then_stops() {
        let mut cursor = ResultSetCursor::new(two_rows());
        assert_eq!(cursor.column_names(), ["id", "name"]);
        assert!(cursor.advance().unwrap());
        let mut sink = Collect(Vec::new(), 2);
        cursor.scan_into(&mut sink).unwrap();
        assert_eq!(sink.0, [RowValues::Int(1), RowValues::Text("Ann".into())]);
        assert!(cursor.advance().unwrap());
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn scan_before_advance_fails() {
        let mut cursor = ResultSetCursor::new(two_rows());
        let mut sink = Collect(Vec::new(), 2);
        assert!(matches!(
            cursor.scan_into(&mut sink),
            Err(SqlBindError::ExecutionError(_))
        ));
    }

    #[test]
    fn short_row_is_rejected_before_any_write() {
        let mut rs = ResultSet::new(vec!["id".into(), "name".into()]);
        rs.add_row_values(vec![RowValues::Int(1)]);
        let mut cursor = ResultSetCursor::new(rs);
        cursor.advance().unwrap();
        let mut sink = Collect(Vec::new(), 2);
        assert!(matches!(
            cursor.scan_into(&mut sink),
            Err(SqlBindError::ColumnCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn sink_width_must_match_columns() {
        let mut cursor = ResultSetCursor::new(two_rows());
        cursor.advance().unwrap();
        let mut sink = Collect(Vec::new(), 1);
        assert!(matches!(
            cursor.scan_into(&mut sink),
            Err(SqlBindError::ColumnCountMismatch {
                expected: 1,
                actual: 2
            })
        ));
        assert!(sink.0.is_empty());
    }
}
