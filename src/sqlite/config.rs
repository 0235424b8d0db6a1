use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bb8::{ManageConnection, Pool, PooledConnection};
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;
use tracing::warn;

use crate::error::SqlBindError;

/// Shared handle to a rusqlite connection guarded by a mutex for async access.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

pub type SqlitePooledConnection = PooledConnection<'static, SqliteManager>;

static MEMORY_DB_SEQ: AtomicUsize = AtomicUsize::new(0);

/// bb8 manager that opens rusqlite connections to one database path.
///
/// `path` may be a file path or a `file:` URI such as `file:app?mode=memory&cache=shared`.
/// A plain `:memory:` (or empty) path is turned into a named shared-cache in-memory database so
/// every pooled connection sees the same data.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    path: String,
}

impl SqliteManager {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.is_empty() || path == ":memory:" {
            let seq = MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed);
            format!(
                "file:sql-rowbind-{}-{seq}?mode=memory&cache=shared",
                std::process::id()
            )
        } else {
            path
        };
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    fn is_memory(&self) -> bool {
        self.path.contains("mode=memory") || self.path.starts_with("file::memory:")
    }

    /// Build a pool from this manager.
    ///
    /// In-memory databases keep one idle connection open so the data outlives idle reaping.
    ///
    /// # Errors
    /// Returns `SqlBindError` if the first connection cannot be opened.
    pub async fn build_pool(self, max_size: u32) -> Result<Pool<SqliteManager>, SqlBindError> {
        let min_idle = self.is_memory().then_some(1);
        Pool::builder()
            .max_size(max_size)
            .min_idle(min_idle)
            .build(self)
            .await
            .map_err(|e| SqlBindError::ConnectionError(format!("sqlite pool error: {e}")))
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = SqlBindError;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let path = self.path.clone();
        async move {
            let conn = spawn_blocking(move || rusqlite::Connection::open(&path))
                .await
                .map_err(|e| {
                    SqlBindError::ConnectionError(format!("sqlite open join error: {e}"))
                })??;
            Ok(Arc::new(Mutex::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move {
            let guard = conn.lock().await;
            guard.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(())
        }
    }

    /// A connection still locked by blocking work, or left inside a transaction, is not reused.
    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        let broken = match conn.try_lock() {
            Ok(guard) => !guard.is_autocommit(),
            Err(_) => true,
        };
        if broken {
            warn!("evicting sqlite connection returned busy or inside a transaction");
        }
        broken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(conn: rusqlite::Connection) -> SharedSqliteConnection {
        Arc::new(Mutex::new(conn))
    }

    #[test]
    fn open_transaction_marks_connection_broken() {
        let manager = SqliteManager::new(":memory:");
        let mut conn = shared(rusqlite::Connection::open_in_memory().unwrap());
        assert!(!manager.has_broken(&mut conn));

        conn.try_lock().unwrap().execute_batch("BEGIN").unwrap();
        assert!(manager.has_broken(&mut conn));

        conn.try_lock().unwrap().execute_batch("ROLLBACK").unwrap();
        assert!(!manager.has_broken(&mut conn));
    }

    #[test]
    fn locked_connection_is_broken() {
        let manager = SqliteManager::new(":memory:");
        let mut conn = shared(rusqlite::Connection::open_in_memory().unwrap());
        let held = Arc::clone(&conn);
        let _guard = held.try_lock().unwrap();
        assert!(manager.has_broken(&mut conn));
    }

    #[test]
    fn plain_memory_path_becomes_distinct_shared_cache_uris() {
        let first = SqliteManager::new(":memory:");
        let second = SqliteManager::new("");
        assert!(first.path().starts_with("file:sql-rowbind-"));
        assert!(first.path().ends_with("?mode=memory&cache=shared"));
        assert_ne!(first.path(), second.path());
        assert!(first.is_memory());

        let file = SqliteManager::new("data/app.db");
        assert_eq!(file.path(), "data/app.db");
        assert!(!file.is_memory());
    }
}
