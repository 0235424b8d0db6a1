// SQLite backend
//
// - config: bb8 connection manager over rusqlite
// - params: RowValues -> rusqlite values
// - query: value extraction, the streaming cursor, result materialization
// - executor: blocking-pool wrappers used by the database facade

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{SharedSqliteConnection, SqliteManager, SqlitePooledConnection};
pub use query::{SqliteCursor, build_result_set};
