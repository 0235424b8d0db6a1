use tokio_postgres::Client;

use crate::error::SqlBindError;
use crate::types::RowValues;

use super::params::Params;
use super::query::PgCursor;

/// Execute a batch of statements with the simple query protocol.
///
/// # Errors
/// Returns `SqlBindError::PostgresError` if any statement fails.
pub async fn execute_batch(client: &Client, sql: &str) -> Result<(), SqlBindError> {
    client.batch_execute(sql).await?;
    Ok(())
}

/// Execute a single statement and return rows affected.
///
/// # Errors
/// Returns `SqlBindError::PostgresError` if preparation or execution fails.
pub async fn execute_dml(
    client: &Client,
    query: &str,
    params: &[RowValues],
) -> Result<usize, SqlBindError> {
    let converted = Params::convert(params);
    let rows = client.execute(query, converted.as_refs()).await?;
    usize::try_from(rows).map_err(|e| {
        SqlBindError::ExecutionError(format!("postgres affected rows conversion error: {e}"))
    })
}

/// Prepare and run a query, returning a cursor over its rows.
///
/// The statement is prepared first so column names are known even for an empty result.
///
/// # Errors
/// Returns `SqlBindError::PostgresError` if preparation or execution fails.
pub async fn execute_select(
    client: &Client,
    query: &str,
    params: &[RowValues],
) -> Result<PgCursor, SqlBindError> {
    let stmt = client.prepare(query).await?;
    let converted = Params::convert(params);
    let rows = client.query(&stmt, converted.as_refs()).await?;
    Ok(PgCursor::from_statement(&stmt, rows))
}
