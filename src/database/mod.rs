//! Thin async façade over a pooled database connection.
//!
//! Every call checks a connection out of the pool, runs one statement, and returns it. Row
//! binding goes through the [`Binder`] configured by [`DatabaseOptions::bind`].

mod connection;
mod transaction;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::binder::{Binder, FromRowValue, Record};
use crate::config::DatabaseOptions;
use crate::error::SqlBindError;
use crate::results::DbRow;
use crate::types::{DatabaseType, RowValues};

use connection::PoolConnection;
pub use connection::QueryCursor;
pub use transaction::Transaction;

#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteManager, executor::apply_wal_pragmas};

#[derive(Clone)]
enum DatabasePool {
    #[cfg(feature = "sqlite")]
    Sqlite(bb8::Pool<SqliteManager>),
    #[cfg(feature = "postgres")]
    Postgres(deadpool_postgres::Pool),
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => f.debug_tuple("Sqlite").field(&pool.state()).finish(),
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => f.debug_tuple("Postgres").field(&pool.status()).finish(),
        }
    }
}

/// A pooled connection to one database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DatabasePool,
    options: DatabaseOptions,
    binder: Binder,
}

impl Database {
    /// Create the pool, check it, and run the setup script if one is configured.
    ///
    /// # Errors
    /// Returns `SqlBindError` if pool creation, the smoke test or the setup script fails.
    ///
    /// # Panics
    /// Panics instead of returning an error when `panic_on_error` is set.
    pub async fn connect(options: DatabaseOptions) -> Result<Self, SqlBindError> {
        let panic_on_error = options.panic_on_error;
        throw(panic_on_error, Self::open(options).await)
    }

    async fn open(options: DatabaseOptions) -> Result<Self, SqlBindError> {
        let pool = match options.db_type {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => {
                let pool = SqliteManager::new(options.target.clone())
                    .build_pool(options.pool_size)
                    .await?;
                {
                    let conn = pool.get().await?;
                    apply_wal_pragmas(&conn).await?;
                }
                DatabasePool::Sqlite(pool)
            }
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => {
                let max_size = usize::try_from(options.pool_size).map_err(|e| {
                    SqlBindError::ConfigError(format!("pool size out of range: {e}"))
                })?;
                let pool = crate::postgres::config::pool_from_url(&options.target, max_size)?;
                {
                    let client = pool.get().await?;
                    client.simple_query("SELECT 1").await?;
                }
                DatabasePool::Postgres(pool)
            }
        };

        let db = Self {
            pool,
            binder: Binder::with_options(options.bind),
            options,
        };
        if let Some(script) = db.options.setup_script.clone() {
            db.load_script(&script).await?;
        }
        info!(db_type = ?db.options.db_type, "database connected");
        Ok(db)
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        self.options.db_type
    }

    #[must_use]
    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    #[must_use]
    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    async fn acquire(&self) -> Result<PoolConnection, SqlBindError> {
        match &self.pool {
            #[cfg(feature = "sqlite")]
            DatabasePool::Sqlite(pool) => Ok(PoolConnection::Sqlite(pool.get_owned().await?)),
            #[cfg(feature = "postgres")]
            DatabasePool::Postgres(pool) => Ok(PoolConnection::Postgres(pool.get().await?)),
        }
    }

    fn throw<T>(&self, result: Result<T, SqlBindError>) -> Result<T, SqlBindError> {
        throw(self.options.panic_on_error, result)
    }

    /// Execute one statement and return the number of rows affected.
    ///
    /// # Errors
    /// Returns driver errors from preparing or executing the statement.
    pub async fn execute(&self, sql: &str, params: &[RowValues]) -> Result<usize, SqlBindError> {
        debug!(sql, "execute");
        let result = match self.acquire().await {
            Ok(conn) => conn.execute(sql, params).await,
            Err(e) => Err(e),
        };
        self.throw(result)
    }

    /// Execute several `;`-separated statements without parameters.
    ///
    /// # Errors
    /// Returns driver errors from any of the statements.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlBindError> {
        let result = match self.acquire().await {
            Ok(conn) => conn.execute_batch(sql).await,
            Err(e) => Err(e),
        };
        self.throw(result)
    }

    /// Read a SQL file and execute it as a batch.
    ///
    /// # Errors
    /// Returns `SqlBindError::ConfigError` if the file cannot be read, or the batch's error.
    pub async fn load_script(&self, path: &Path) -> Result<(), SqlBindError> {
        let sql = tokio::fs::read_to_string(path).await.map_err(|e| {
            SqlBindError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loading sql script");
        self.execute_batch(&sql).await
    }

    /// Run a query and return a cursor over its rows.
    ///
    /// # Errors
    /// Returns driver errors from preparing or running the query.
    pub async fn query(&self, sql: &str, params: &[RowValues]) -> Result<QueryCursor, SqlBindError> {
        debug!(sql, "query");
        self.acquire().await?.query(sql, params, None).await
    }

    /// Run a query and return only its first row.
    ///
    /// # Errors
    /// Returns driver errors from preparing or running the query.
    pub async fn query_row(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<DbRow>, SqlBindError> {
        let result_set = self.acquire().await?.result_set(sql, params, Some(1)).await?;
        Ok(result_set.results.into_iter().next())
    }

    /// First column of the first row as an integer.
    ///
    /// # Errors
    /// Returns `SqlBindError::ExecutionError` when no row matches, or a scan error when the value
    /// is not an integer.
    pub async fn query_int(&self, sql: &str, params: &[RowValues]) -> Result<i64, SqlBindError> {
        self.query_scalar(sql, params).await
    }

    /// First column of the first row as text.
    ///
    /// # Errors
    /// Returns `SqlBindError::ExecutionError` when no row matches, or a scan error when the value
    /// is not text.
    pub async fn query_string(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<String, SqlBindError> {
        self.query_scalar(sql, params).await
    }

    async fn query_scalar<T: FromRowValue>(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<T, SqlBindError> {
        let Some(row) = self.query_row(sql, params).await? else {
            warn!(sql, "scalar query returned no rows");
            return Err(SqlBindError::ExecutionError(
                "query returned no rows".to_string(),
            ));
        };
        let column = row.column_names.first().cloned().unwrap_or_default();
        let value = row.values.into_iter().next().ok_or_else(|| {
            SqlBindError::ExecutionError("query returned no columns".to_string())
        })?;
        T::from_row_value(value, &column)
    }

    /// True if the query matches at least one row.
    ///
    /// # Errors
    /// Returns driver errors from preparing or running the query.
    pub async fn exists(&self, sql: &str, params: &[RowValues]) -> Result<bool, SqlBindError> {
        let found = self.acquire().await?.count(sql, params, true).await?;
        Ok(found > 0)
    }

    /// Number of rows the query returns.
    ///
    /// # Errors
    /// Returns driver errors from preparing or running the query.
    pub async fn count(&self, sql: &str, params: &[RowValues]) -> Result<usize, SqlBindError> {
        self.acquire().await?.count(sql, params, false).await
    }

    /// Bind the first row of a query into `dest`; `dest` is untouched when nothing matches.
    ///
    /// # Errors
    /// Returns driver and binding errors; see [`Binder::bind_one`].
    pub async fn get<R: Record>(
        &self,
        dest: &mut R,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(), SqlBindError> {
        debug!(sql, "get");
        self.acquire()
            .await?
            .get(&self.binder, dest, sql, params)
            .await
    }

    /// Bind every row of a query into `dest`, replacing its contents.
    ///
    /// # Errors
    /// Returns driver and binding errors; see [`Binder::bind_all`].
    pub async fn select<R: Record>(
        &self,
        dest: &mut Vec<R>,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(), SqlBindError> {
        debug!(sql, "select");
        self.acquire()
            .await?
            .select(&self.binder, dest, sql, params)
            .await
    }

    /// Check out a connection and open a transaction on it.
    ///
    /// # Errors
    /// Returns pool errors or the driver's error for `BEGIN`.
    pub async fn begin(&self) -> Result<Transaction, SqlBindError> {
        let conn = self.acquire().await?;
        Transaction::begin(conn, self.binder).await
    }

    /// Close the pool. Connections checked out elsewhere are dropped when released.
    pub fn close(self) {
        match self.pool {
            #[cfg(feature = "sqlite")]
            DatabasePool::Sqlite(pool) => drop(pool),
            #[cfg(feature = "postgres")]
            DatabasePool::Postgres(pool) => pool.close(),
        }
        info!("database closed");
    }
}

fn throw<T>(panic_on_error: bool, result: Result<T, SqlBindError>) -> Result<T, SqlBindError> {
    if panic_on_error {
        if let Err(err) = &result {
            panic!("database error: {err}");
        }
    }
    result
}
