use std::path::PathBuf;

use serde::Deserialize;

use crate::binder::{BindOptions, MismatchPolicy, NestedAllocation};
use crate::database::Database;
use crate::error::SqlBindError;
use crate::types::DatabaseType;

/// Environment variable read by [`DatabaseOptions::from_env`].
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

fn default_pool_size() -> u32 {
    10
}

/// Options for connecting a [`Database`].
///
/// Can be deserialized, e.g. from a JSON config file:
/// ```rust
/// use sql_rowbind::prelude::*;
///
/// let opts: DatabaseOptions = serde_json::from_str(
///     r#"{ "db_type": "sqlite", "target": "app.db", "bind": { "on_mismatch": "error" } }"#,
/// ).unwrap();
/// assert_eq!(opts.bind.on_mismatch, MismatchPolicy::Error);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseOptions {
    pub db_type: DatabaseType,
    /// `SQLite` path / `file:` URI, or a Postgres connection URL.
    pub target: String,
    #[serde(default)]
    pub bind: BindOptions,
    /// SQL file executed once right after connecting.
    #[serde(default)]
    pub setup_script: Option<PathBuf>,
    /// Panic instead of returning connection and execution errors. Meant for test suites.
    #[serde(default)]
    pub panic_on_error: bool,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl DatabaseOptions {
    #[must_use]
    pub fn new(db_type: DatabaseType, target: impl Into<String>) -> Self {
        Self {
            db_type,
            target: target.into(),
            bind: BindOptions::default(),
            setup_script: None,
            panic_on_error: false,
            pool_size: default_pool_size(),
        }
    }

    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::new(DatabaseType::Sqlite, path)
    }

    #[cfg(feature = "postgres")]
    #[must_use]
    pub fn postgres(url: impl Into<String>) -> Self {
        Self::new(DatabaseType::Postgres, url)
    }

    /// Pick the backend from a connection URL.
    ///
    /// `postgres://` and `postgresql://` select Postgres. `sqlite://`, `sqlite:` and bare paths
    /// select `SQLite` with the prefix stripped; `file:` URIs are passed to `SQLite` unchanged.
    ///
    /// # Errors
    /// Returns `SqlBindError::ConfigError` for an empty URL, an unknown scheme, or a backend whose
    /// feature is not compiled in.
    pub fn from_url(url: &str) -> Result<Self, SqlBindError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SqlBindError::ConfigError(
                "database url is empty".to_string(),
            ));
        }

        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            #[cfg(feature = "postgres")]
            return Ok(Self::postgres(url));
            #[cfg(not(feature = "postgres"))]
            return Err(SqlBindError::ConfigError(
                "postgres support is not enabled".to_string(),
            ));
        }

        let path = if let Some(rest) = url.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite:") {
            rest
        } else if url.starts_with("file:") || !url.contains("://") {
            url
        } else {
            return Err(SqlBindError::ConfigError(format!(
                "unsupported database url scheme: {url}"
            )));
        };

        #[cfg(feature = "sqlite")]
        return Ok(Self::sqlite(path));
        #[cfg(not(feature = "sqlite"))]
        return Err(SqlBindError::ConfigError(format!(
            "sqlite support is not enabled: {path}"
        )));
    }

    /// Read the connection URL from `DATABASE_URL`.
    ///
    /// # Errors
    /// Returns `SqlBindError::ConfigError` if the variable is unset or not a supported URL.
    pub fn from_env() -> Result<Self, SqlBindError> {
        let url = std::env::var(DATABASE_URL_VAR).map_err(|e| {
            SqlBindError::ConfigError(format!("{DATABASE_URL_VAR} is not available: {e}"))
        })?;
        Self::from_url(&url)
    }
}

/// Fluent builder for [`DatabaseOptions`].
#[derive(Debug, Clone)]
pub struct DatabaseOptionsBuilder {
    opts: DatabaseOptions,
}

impl DatabaseOptionsBuilder {
    #[must_use]
    pub fn new(opts: DatabaseOptions) -> Self {
        Self { opts }
    }

    #[must_use]
    pub fn bind_options(mut self, bind: BindOptions) -> Self {
        self.opts.bind = bind;
        self
    }

    #[must_use]
    pub fn on_mismatch(mut self, policy: MismatchPolicy) -> Self {
        self.opts.bind.on_mismatch = policy;
        self
    }

    #[must_use]
    pub fn nested_allocation(mut self, allocation: NestedAllocation) -> Self {
        self.opts.bind.nested_allocation = allocation;
        self
    }

    #[must_use]
    pub fn setup_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.opts.setup_script = Some(path.into());
        self
    }

    #[must_use]
    pub fn panic_on_error(mut self, panic_on_error: bool) -> Self {
        self.opts.panic_on_error = panic_on_error;
        self
    }

    #[must_use]
    pub fn pool_size(mut self, pool_size: u32) -> Self {
        self.opts.pool_size = pool_size;
        self
    }

    #[must_use]
    pub fn finish(self) -> DatabaseOptions {
        self.opts
    }

    /// Connect a [`Database`] with these options.
    ///
    /// # Errors
    ///
    /// Returns `SqlBindError` if pool creation, the smoke test or the setup script fails.
    pub async fn build(self) -> Result<Database, SqlBindError> {
        Database::connect(self.finish()).await
    }
}

impl DatabaseOptions {
    #[must_use]
    pub fn builder(self) -> DatabaseOptionsBuilder {
        DatabaseOptionsBuilder::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "postgres")]
    #[test]
    fn postgres_urls_select_postgres() {
        let opts = DatabaseOptions::from_url("postgres://u:p@localhost:5432/app").unwrap();
        assert_eq!(opts.db_type, DatabaseType::Postgres);
        assert_eq!(opts.target, "postgres://u:p@localhost:5432/app");
        let opts = DatabaseOptions::from_url("postgresql://localhost/app").unwrap();
        assert_eq!(opts.db_type, DatabaseType::Postgres);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_prefixes_are_stripped() {
        let opts = DatabaseOptions::from_url("sqlite://data/app.db").unwrap();
        assert_eq!(opts.db_type, DatabaseType::Sqlite);
        assert_eq!(opts.target, "data/app.db");
        assert_eq!(DatabaseOptions::from_url("sqlite:app.db").unwrap().target, "app.db");
        assert_eq!(DatabaseOptions::from_url("app.db").unwrap().target, "app.db");
        assert_eq!(
            DatabaseOptions::from_url("file:mem?mode=memory&cache=shared").unwrap().target,
            "file:mem?mode=memory&cache=shared"
        );
    }

    #[test]
    fn unknown_schemes_and_empty_urls_are_rejected() {
        assert!(matches!(
            DatabaseOptions::from_url("mysql://localhost/app"),
            Err(SqlBindError::ConfigError(_))
        ));
        assert!(matches!(
            DatabaseOptions::from_url("  "),
            Err(SqlBindError::ConfigError(_))
        ));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn deserialized_options_fill_defaults() {
        let opts: DatabaseOptions =
            serde_json::from_str(r#"{ "db_type": "sqlite", "target": "app.db" }"#).unwrap();
        assert_eq!(opts.pool_size, 10);
        assert!(!opts.panic_on_error);
        assert_eq!(opts.bind, BindOptions::default());
        assert_eq!(opts.bind.on_mismatch, MismatchPolicy::Panic);
        assert_eq!(opts.bind.nested_allocation, NestedAllocation::Eager);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn builder_overrides_options() {
        let opts = DatabaseOptions::sqlite("app.db")
            .builder()
            .on_mismatch(MismatchPolicy::Error)
            .nested_allocation(NestedAllocation::WhenSelected)
            .setup_script("setup.sql")
            .pool_size(2)
            .finish();
        assert_eq!(opts.bind.on_mismatch, MismatchPolicy::Error);
        assert_eq!(opts.bind.nested_allocation, NestedAllocation::WhenSelected);
        assert_eq!(opts.setup_script, Some(PathBuf::from("setup.sql")));
        assert_eq!(opts.pool_size, 2);
    }
}
