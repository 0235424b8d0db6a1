use deadpool_postgres::{Config as PgConfig, Pool, Runtime};
use tokio_postgres::NoTls;

use crate::error::SqlBindError;

/// Build a deadpool pool from a `postgres://` connection URL.
///
/// # Errors
/// Returns `SqlBindError::ConfigError` for an empty URL and `SqlBindError::ConnectionError` if
/// the pool cannot be created.
pub fn pool_from_url(url: &str, max_size: usize) -> Result<Pool, SqlBindError> {
    if url.trim().is_empty() {
        return Err(SqlBindError::ConfigError(
            "postgres connection url is required".to_string(),
        ));
    }
    let mut cfg = PgConfig::new();
    cfg.url = Some(url.to_string());
    cfg.pool = Some(deadpool_postgres::PoolConfig::new(max_size));
    cfg.create_pool(Some(Runtime::Tokio1), NoTls).map_err(|e| {
        SqlBindError::ConnectionError(format!("Failed to create Postgres pool: {e}"))
    })
}
