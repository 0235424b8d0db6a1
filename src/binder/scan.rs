use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SqlBindError;
use crate::types::RowValues;

/// Conversion from a cursor value into the concrete type of a record field.
///
/// A non-`Option` field rejects `NULL`; wrap the field in `Option<T>` to accept it.
pub trait FromRowValue: Sized {
    /// # Errors
    ///
    /// Returns [`SqlBindError::ScanError`] when `value` cannot be represented as `Self`.
    fn from_row_value(value: RowValues, column: &str) -> Result<Self, SqlBindError>;
}

fn mismatch(column: &str, expected: &str, value: &RowValues) -> SqlBindError {
    if value.is_null() {
        SqlBindError::scan(column, format!("NULL into non-nullable {expected}"))
    } else {
        SqlBindError::scan(
            column,
            format!("cannot convert {} into {expected}", value.kind()),
        )
    }
}

impl FromRowValue for RowValues {
    fn from_row_value(value: RowValues, _column: &str) -> Result<Self, SqlBindError> {
        Ok(value)
    }
}

impl FromRowValue for i64 {
    fn from_row_value(value: RowValues, column: &str) -> Result<Self, SqlBindError> {
        value
            .as_int()
            .ok_or_else(|| mismatch(column, "i64", &value))
    }
}

macro_rules! narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FromRowValue for $ty {
                fn from_row_value(value: RowValues, column: &str) -> Result<Self, SqlBindError> {
                    let wide = i64::from_row_value(value, column)?;
                    <$ty>::try_from(wide).map_err(|e| {
                        SqlBindError::scan(column, format!("{wide} out of range for {}: {e}", stringify!($ty)))
                    })
                }
            }
        )*
    };
}

narrow_int!(i32, i16, u32, u64, usize);

impl FromRowValue for f64 {
    fn from_row_value(value: RowValues, column: &str) -> Result<Self, SqlBindError> {
        value
            .as_float()
            .ok_or_else(|| mismatch(column, "f64", &value))
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: RowValues, column: &str) -> Result<Self, SqlBindError> {
        value
            .as_bool()
            .ok_or_else(|| mismatch(column, "bool", &value))
    }
}

impl FromRowValue for String {
    fn from_row_value(value: RowValues, column: &str) -> Result<Self, SqlBindError> {
        match value {
            RowValues::Text(s) => Ok(s),
            other => Err(mismatch(column, "String", &other)),
        }
    }
}

impl FromRowValue for NaiveDateTime {
    fn from_row_value(value: RowValues, column: &str) -> Result<Self, SqlBindError> {
        value
            .as_timestamp()
            .ok_or_else(|| mismatch(column, "NaiveDateTime", &value))
    }
}

impl FromRowValue for Vec<u8> {
    fn from_row_value(value: RowValues, column: &str) -> Result<Self, SqlBindError> {
        match value {
            RowValues::Blob(bytes) => Ok(bytes),
            other => Err(mismatch(column, "Vec<u8>", &other)),
        }
    }
}

impl FromRowValue for JsonValue {
    fn from_row_value(value: RowValues, column: &str) -> Result<Self, SqlBindError> {
        match value {
            RowValues::JSON(json) => Ok(json),
            // SQLite stores JSON as TEXT
            RowValues::Text(text) => serde_json::from_str(&text)
                .map_err(|e| SqlBindError::scan(column, format!("invalid json: {e}"))),
            other => Err(mismatch(column, "json", &other)),
        }
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: RowValues, column: &str) -> Result<Self, SqlBindError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_row_value(value, column).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_into_plain_field_is_a_scan_error() {
        let err = String::from_row_value(RowValues::Null, "name").unwrap_err();
        match err {
            SqlBindError::ScanError { column, message } => {
                assert_eq!(column, "name");
                assert!(message.contains("NULL"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn null_into_option_is_none() {
        let v: Option<i64> = Option::from_row_value(RowValues::Null, "id").unwrap();
        assert_eq!(v, None);
        let v: Option<i64> = Option::from_row_value(RowValues::Int(7), "id").unwrap();
        assert_eq!(v, Some(7));
    }

    #[test]
    fn narrowing_checks_range() {
        assert_eq!(i32::from_row_value(RowValues::Int(42), "n").unwrap(), 42);
        assert!(i32::from_row_value(RowValues::Int(i64::MAX), "n").is_err());
        assert!(u32::from_row_value(RowValues::Int(-1), "n").is_err());
    }

    #[test]
    fn json_reads_from_text() {
        let v = JsonValue::from_row_value(RowValues::Text(r#"{"a":1}"#.into()), "doc").unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn type_mismatch_names_both_sides() {
        let err = i64::from_row_value(RowValues::Text("x".into()), "id").unwrap_err();
        assert_eq!(err.to_string(), "Cannot scan column id: cannot convert text into i64");
    }
}
