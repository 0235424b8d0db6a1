//! Convenient imports for common functionality.

pub use crate::binder::{
    BindOptions, Binder, FromRowValue, MismatchPolicy, NestedAllocation, Record, Shape,
    ShapeBuilder, bind_all, bind_one,
};
pub use crate::config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use crate::cursor::{Cursor, ResultSetCursor, RowSink};
pub use crate::database::{Database, QueryCursor, Transaction};
pub use crate::error::SqlBindError;
pub use crate::impl_record;
pub use crate::results::{DbRow, ResultSet};
pub use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "postgres")]
pub use crate::postgres::PgCursor;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteCursor;
