use sql_rowbind::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Item {
    id: i64,
    label: String,
}

impl_record!(Item { id: "id", label: "label" });

#[derive(Debug, Default)]
struct Duplicated {
    a: i64,
    b: i64,
}

impl_record!(Duplicated { a: "x", b: "x" });

/// Wraps a cursor and counts how often rows were scanned.
struct SpyCursor {
    inner: ResultSetCursor,
    scans: usize,
}

impl SpyCursor {
    fn new(rs: ResultSet) -> Self {
        Self {
            inner: ResultSetCursor::new(rs),
            scans: 0,
        }
    }
}

impl Cursor for SpyCursor {
    fn advance(&mut self) -> Result<bool, SqlBindError> {
        self.inner.advance()
    }

    fn column_names(&self) -> &[String] {
        self.inner.column_names()
    }

    fn scan_into(&mut self, sink: &mut dyn RowSink) -> Result<(), SqlBindError> {
        self.scans += 1;
        self.inner.scan_into(sink)
    }
}

fn with_unknown_column() -> ResultSet {
    let mut rs = ResultSet::new(vec!["id".into(), "unknown_col".into()]);
    rs.add_row_values(vec![RowValues::Int(1), RowValues::Int(2)]);
    rs
}

fn erroring_binder() -> Binder {
    Binder::with_options(BindOptions {
        on_mismatch: MismatchPolicy::Error,
        ..BindOptions::default()
    })
}

#[test]
#[should_panic(expected = "No target for column unknown_col")]
fn unknown_column_panics_by_default() {
    let mut item = Item::default();
    let _ = bind_one(&mut ResultSetCursor::new(with_unknown_column()), &mut item);
}

#[test]
#[should_panic(expected = "No target for column unknown_col")]
fn unknown_column_panics_in_bind_all() {
    let mut items: Vec<Item> = Vec::new();
    let _ = bind_all(&mut ResultSetCursor::new(with_unknown_column()), &mut items);
}

#[test]
fn unknown_column_is_reported_before_any_scan() {
    let mut cursor = SpyCursor::new(with_unknown_column());
    let mut item = Item {
        id: 5,
        label: "old".into(),
    };
    let err = erroring_binder()
        .bind_one(&mut cursor, &mut item)
        .unwrap_err();

    assert!(
        matches!(err, SqlBindError::SchemaMismatch { ref column } if column == "unknown_col"),
        "{err:?}"
    );
    assert_eq!(err.to_string(), "No target for column unknown_col");
    assert!(err.is_fatal());
    assert_eq!(cursor.scans, 0);
    assert_eq!(item.id, 5);
    assert_eq!(item.label, "old");
}

#[test]
fn bind_all_keeps_destination_when_a_later_row_fails() {
    let mut rs = ResultSet::new(vec!["id".into(), "label".into()]);
    rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("one".into())]);
    rs.add_row_values(vec![RowValues::Int(2), RowValues::Text("two".into())]);
    rs.add_row_values(vec![RowValues::Text("three".into()), RowValues::Null]);

    let before = vec![Item {
        id: 9,
        label: "keep".into(),
    }];
    let mut items = before.clone();
    let err = bind_all(&mut ResultSetCursor::new(rs), &mut items).unwrap_err();

    assert!(
        matches!(err, SqlBindError::ScanError { ref column, .. } if column == "id"),
        "{err:?}"
    );
    assert_eq!(items, before);
}

#[test]
fn bind_all_reports_schema_mismatch_without_touching_destination() {
    let mut items = vec![Item::default()];
    let err = erroring_binder()
        .bind_all(&mut ResultSetCursor::new(with_unknown_column()), &mut items)
        .unwrap_err();
    assert!(matches!(err, SqlBindError::SchemaMismatch { .. }));
    assert_eq!(items.len(), 1);
}

#[test]
fn duplicate_tags_are_rejected_before_reading_rows() {
    let mut rs = ResultSet::new(vec!["x".into()]);
    rs.add_row_values(vec![RowValues::Int(1)]);
    let mut cursor = SpyCursor::new(rs);

    let mut record = Duplicated::default();
    let err = bind_one(&mut cursor, &mut record).unwrap_err();
    assert!(matches!(err, SqlBindError::DuplicateTag(ref tag) if tag == "x"), "{err:?}");
    assert_eq!(cursor.scans, 0);
    assert_eq!(cursor.inner.remaining(), 1);
    assert_eq!((record.a, record.b), (0, 0));
}

#[test]
fn integer_out_of_range_for_narrow_field_is_a_scan_error() {
    #[derive(Debug, Default)]
    struct Small {
        n: i16,
    }
    impl_record!(Small { n: "n" });

    let mut rs = ResultSet::new(vec!["n".into()]);
    rs.add_row_values(vec![RowValues::Int(100_000)]);
    let mut small = Small::default();
    let err = bind_one(&mut ResultSetCursor::new(rs), &mut small).unwrap_err();
    assert!(matches!(err, SqlBindError::ScanError { .. }), "{err:?}");
    assert_eq!(small.n, 0);
}

#[test]
fn row_shorter_than_its_columns_is_rejected() {
    let mut rs = ResultSet::new(vec!["id".into(), "label".into()]);
    rs.add_row_values(vec![RowValues::Int(1)]);
    let mut item = Item {
        id: 5,
        label: "old".into(),
    };
    let err = bind_one(&mut ResultSetCursor::new(rs), &mut item).unwrap_err();
    assert!(
        matches!(err, SqlBindError::ColumnCountMismatch { expected: 2, actual: 1 }),
        "{err:?}"
    );
    assert_eq!(item.id, 5);
}
