use tracing::{debug, warn};

use crate::binder::{Binder, Record};
use crate::error::SqlBindError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::connection::{PoolConnection, QueryCursor};

/// An open transaction holding its own pooled connection.
///
/// Dropping it without [`commit`](Transaction::commit) or [`rollback`](Transaction::rollback)
/// rolls back on a best-effort basis: synchronously for `SQLite`, on a spawned task for Postgres.
pub struct Transaction {
    conn: Option<PoolConnection>,
    binder: Binder,
}

impl Transaction {
    pub(crate) async fn begin(conn: PoolConnection, binder: Binder) -> Result<Self, SqlBindError> {
        conn.execute_batch("BEGIN").await?;
        debug!("transaction started");
        Ok(Self {
            conn: Some(conn),
            binder,
        })
    }

    fn conn(&self) -> Result<&PoolConnection, SqlBindError> {
        self.conn.as_ref().ok_or_else(|| {
            SqlBindError::ExecutionError("transaction already finished".to_string())
        })
    }

    /// # Errors
    /// Returns driver errors from preparing or executing the statement.
    pub async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<usize, SqlBindError> {
        self.conn()?.execute(sql, params).await
    }

    /// # Errors
    /// Returns driver errors from any of the statements.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlBindError> {
        self.conn()?.execute_batch(sql).await
    }

    /// # Errors
    /// Returns driver errors from preparing or running the query.
    pub async fn query(&self, sql: &str, params: &[RowValues]) -> Result<QueryCursor, SqlBindError> {
        self.conn()?.query(sql, params, None).await
    }

    /// # Errors
    /// Returns driver errors from preparing or running the query.
    pub async fn result_set(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlBindError> {
        self.conn()?.result_set(sql, params, None).await
    }

    /// # Errors
    /// Returns driver errors from preparing or running the query.
    pub async fn exists(&self, sql: &str, params: &[RowValues]) -> Result<bool, SqlBindError> {
        Ok(self.conn()?.count(sql, params, true).await? > 0)
    }

    /// # Errors
    /// Returns driver errors from preparing or running the query.
    pub async fn count(&self, sql: &str, params: &[RowValues]) -> Result<usize, SqlBindError> {
        self.conn()?.count(sql, params, false).await
    }

    /// Same as [`Database::get`](crate::Database::get), inside the transaction.
    ///
    /// # Errors
    /// Returns driver and binding errors.
    pub async fn get<R: Record>(
        &self,
        dest: &mut R,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(), SqlBindError> {
        self.conn()?.get(&self.binder, dest, sql, params).await
    }

    /// Same as [`Database::select`](crate::Database::select), inside the transaction.
    ///
    /// # Errors
    /// Returns driver and binding errors.
    pub async fn select<R: Record>(
        &self,
        dest: &mut Vec<R>,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(), SqlBindError> {
        self.conn()?.select(&self.binder, dest, sql, params).await
    }

    /// # Errors
    /// Returns the driver's error for `COMMIT`; the transaction is rolled back in that case.
    pub async fn commit(mut self) -> Result<(), SqlBindError> {
        self.finish("COMMIT").await
    }

    /// # Errors
    /// Returns the driver's error for `ROLLBACK`.
    pub async fn rollback(mut self) -> Result<(), SqlBindError> {
        self.finish("ROLLBACK").await
    }

    async fn finish(&mut self, sql: &str) -> Result<(), SqlBindError> {
        let conn = self.conn.take().ok_or_else(|| {
            SqlBindError::ExecutionError("transaction already finished".to_string())
        })?;
        match conn.execute_batch(sql).await {
            Ok(()) => {
                debug!(action = sql, "transaction finished");
                Ok(())
            }
            Err(err) => {
                let rolled_back = sql != "ROLLBACK" && conn.execute_batch("ROLLBACK").await.is_ok();
                if !rolled_back {
                    warn!(action = sql, error = %err, "transaction left open; discarding connection");
                    conn.discard();
                }
                Err(err)
            }
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        warn!("transaction dropped without commit or rollback; rolling back");
        match conn {
            // The pool evicts the connection on return if it is still locked by a cancelled
            // blocking call or the rollback did not leave it in autocommit mode.
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(pooled) => {
                if let Ok(guard) = pooled.try_lock() {
                    if let Err(err) = guard.execute_batch("ROLLBACK") {
                        warn!(error = %err, "rollback on drop failed");
                    }
                } else {
                    warn!("connection busy on drop; skipping rollback");
                }
            }
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => {
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(async move {
                        if let Err(err) = client.batch_execute("ROLLBACK").await {
                            warn!(error = %err, "rollback on drop failed; discarding connection");
                            drop(deadpool_postgres::Object::take(client));
                        }
                    });
                } else {
                    warn!("no runtime to roll back on; discarding connection");
                    drop(deadpool_postgres::Object::take(client));
                }
            }
        }
    }
}
