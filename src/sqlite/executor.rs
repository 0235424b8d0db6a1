use std::sync::Arc;

use tokio::task::spawn_blocking;

use crate::error::SqlBindError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::config::SharedSqliteConnection;
use super::params::Params;
use super::query::{build_result_set, count_rows};

/// Run synchronous rusqlite work on the blocking pool.
///
/// # Errors
/// Returns the closure's error, or `ExecutionError` if the blocking task fails to join.
pub async fn run_blocking<F, R>(conn: &SharedSqliteConnection, func: F) -> Result<R, SqlBindError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlBindError> + Send + 'static,
    R: Send + 'static,
{
    let conn = Arc::clone(conn);
    spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlBindError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

/// Execute a batch of SQL statements as-is.
///
/// # Errors
/// Returns `SqlBindError::SqliteError` if any statement fails.
pub async fn execute_batch(conn: &SharedSqliteConnection, sql: &str) -> Result<(), SqlBindError> {
    let sql_owned = sql.to_owned();
    run_blocking(conn, move |guard| Ok(guard.execute_batch(&sql_owned)?)).await
}

/// Execute a single statement and return rows affected.
///
/// # Errors
/// Returns `SqlBindError::SqliteError` if preparation or execution fails.
pub async fn execute_dml(
    conn: &SharedSqliteConnection,
    query: &str,
    params: &[RowValues],
) -> Result<usize, SqlBindError> {
    let sql_owned = query.to_owned();
    let params_owned = Params::convert(params);
    run_blocking(conn, move |guard| {
        let mut stmt = guard.prepare(&sql_owned)?;
        Ok(stmt.execute(&params_owned.as_refs()[..])?)
    })
    .await
}

/// Run a query and materialize up to `limit` rows.
///
/// # Errors
/// Returns `SqlBindError::SqliteError` if preparation, execution or value extraction fails.
pub async fn execute_select(
    conn: &SharedSqliteConnection,
    query: &str,
    params: &[RowValues],
    limit: Option<usize>,
) -> Result<ResultSet, SqlBindError> {
    let sql_owned = query.to_owned();
    let params_owned = Params::convert(params);
    run_blocking(conn, move |guard| {
        let mut stmt = guard.prepare(&sql_owned)?;
        build_result_set(&mut stmt, &params_owned.0, limit)
    })
    .await
}

/// Count the rows a query returns; with `stop_after_first` the count is 0 or 1.
///
/// # Errors
/// Returns `SqlBindError::SqliteError` if preparation or execution fails.
pub async fn execute_count(
    conn: &SharedSqliteConnection,
    query: &str,
    params: &[RowValues],
    stop_after_first: bool,
) -> Result<usize, SqlBindError> {
    let sql_owned = query.to_owned();
    let params_owned = Params::convert(params);
    run_blocking(conn, move |guard| {
        let mut stmt = guard.prepare(&sql_owned)?;
        count_rows(&mut stmt, &params_owned.0, stop_after_first)
    })
    .await
}

/// Apply the WAL pragma used for file-backed databases.
///
/// # Errors
/// Returns `SqlBindError::SqliteError` if the pragma fails.
pub async fn apply_wal_pragmas(conn: &SharedSqliteConnection) -> Result<(), SqlBindError> {
    run_blocking(conn, |guard| {
        guard.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(())
    })
    .await
}
