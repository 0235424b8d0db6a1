use crate::binder::{Binder, Record};
use crate::cursor::{Cursor, ResultSetCursor, RowSink};
use crate::error::SqlBindError;
use crate::results::ResultSet;
use crate::types::RowValues;

#[cfg(feature = "postgres")]
use crate::postgres;
#[cfg(feature = "sqlite")]
use crate::sqlite::{self, SqlitePooledConnection};

/// A connection checked out of the pool.
pub(crate) enum PoolConnection {
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePooledConnection),
    #[cfg(feature = "postgres")]
    Postgres(deadpool_postgres::Object),
}

/// Cursor returned by [`Database::query`](crate::Database::query).
///
/// `SQLite` rows are fetched on the blocking pool before the cursor is handed out; Postgres rows
/// are converted into [`RowValues`] one row at a time as they are scanned.
pub enum QueryCursor {
    Materialized(ResultSetCursor),
    #[cfg(feature = "postgres")]
    Postgres(postgres::PgCursor),
}

impl QueryCursor {
    fn inner(&mut self) -> &mut dyn Cursor {
        match self {
            QueryCursor::Materialized(cursor) => cursor,
            #[cfg(feature = "postgres")]
            QueryCursor::Postgres(cursor) => cursor,
        }
    }
}

impl Cursor for QueryCursor {
    fn advance(&mut self) -> Result<bool, SqlBindError> {
        self.inner().advance()
    }

    fn column_names(&self) -> &[String] {
        match self {
            QueryCursor::Materialized(cursor) => cursor.column_names(),
            #[cfg(feature = "postgres")]
            QueryCursor::Postgres(cursor) => cursor.column_names(),
        }
    }

    fn scan_into(&mut self, sink: &mut dyn RowSink) -> Result<(), SqlBindError> {
        self.inner().scan_into(sink)
    }
}

impl PoolConnection {
    /// Drop the connection without handing it back to the pool for reuse.
    pub(crate) fn discard(self) {
        match self {
            // bb8 evicts it on return through `SqliteManager::has_broken`
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(pooled) => drop(pooled),
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => drop(deadpool_postgres::Object::take(client)),
        }
    }

    pub(crate) async fn execute_batch(&self, sql: &str) -> Result<(), SqlBindError> {
        match self {
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(conn) => sqlite::executor::execute_batch(conn, sql).await,
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => postgres::executor::execute_batch(client, sql).await,
        }
    }

    pub(crate) async fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlBindError> {
        match self {
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(conn) => sqlite::executor::execute_dml(conn, sql, params).await,
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => {
                postgres::executor::execute_dml(client, sql, params).await
            }
        }
    }

    /// Run a query and return a cursor over at most `limit` rows.
    pub(crate) async fn query(
        &self,
        sql: &str,
        params: &[RowValues],
        limit: Option<usize>,
    ) -> Result<QueryCursor, SqlBindError> {
        match self {
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(conn) => {
                let result_set = sqlite::executor::execute_select(conn, sql, params, limit).await?;
                Ok(QueryCursor::Materialized(ResultSetCursor::new(result_set)))
            }
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => {
                let cursor = postgres::executor::execute_select(client, sql, params).await?;
                Ok(QueryCursor::Postgres(cursor))
            }
        }
    }

    pub(crate) async fn result_set(
        &self,
        sql: &str,
        params: &[RowValues],
        limit: Option<usize>,
    ) -> Result<ResultSet, SqlBindError> {
        match self {
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(conn) => {
                sqlite::executor::execute_select(conn, sql, params, limit).await
            }
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => {
                let cursor = postgres::executor::execute_select(client, sql, params).await?;
                let mut result_set = cursor.into_result_set()?;
                if let Some(max) = limit {
                    result_set.results.truncate(max);
                }
                Ok(result_set)
            }
        }
    }

    pub(crate) async fn count(
        &self,
        sql: &str,
        params: &[RowValues],
        stop_after_first: bool,
    ) -> Result<usize, SqlBindError> {
        match self {
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(conn) => {
                sqlite::executor::execute_count(conn, sql, params, stop_after_first).await
            }
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => {
                let converted = postgres::Params::convert(params);
                let rows = client.query(sql, converted.as_refs()).await?;
                Ok(if stop_after_first {
                    rows.len().min(1)
                } else {
                    rows.len()
                })
            }
        }
    }

    pub(crate) async fn get<R: Record>(
        &self,
        binder: &Binder,
        dest: &mut R,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(), SqlBindError> {
        let mut cursor = self.query(sql, params, Some(1)).await?;
        binder.bind_one(&mut cursor, dest)
    }

    pub(crate) async fn select<R: Record>(
        &self,
        binder: &Binder,
        dest: &mut Vec<R>,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(), SqlBindError> {
        let mut cursor = self.query(sql, params, None).await?;
        binder.bind_all(&mut cursor, dest)
    }
}
