// PostgreSQL backend
//
// - config: deadpool pool setup
// - params: RowValues as tokio_postgres parameters
// - query: value extraction and the row cursor
// - executor: statement execution used by the database facade

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use params::Params;
pub use query::PgCursor;
