//! Bind SQL query rows onto plain Rust records by column name.
//!
//! Records register their fields once ([`binder::Record`] or [`impl_record!`]); the binder maps
//! every result column to a field, allocates one level of nested sub-records, and refuses to
//! drop columns it cannot place. [`Database`] is a small pooled façade over `SQLite` (rusqlite +
//! bb8) and Postgres (tokio-postgres + deadpool) that feeds its cursors to the binder.

pub mod binder;
pub mod config;
pub mod cursor;
pub mod database;
pub mod error;
pub mod prelude;
pub mod results;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use binder::{BindOptions, Binder, MismatchPolicy, NestedAllocation, bind_all, bind_one};
pub use config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use database::{Database, QueryCursor, Transaction};
pub use error::SqlBindError;
