use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::info;
use transcribify_core::StoreError;

use crate::schema;

pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Pool sizing and per-connection pragmas.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub pool_size: u32,
    pub busy_timeout_ms: u32,
    /// How long a caller waits for a free connection.
    pub checkout_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 5_000,
            checkout_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA busy_timeout = {};\
             PRAGMA journal_mode = WAL;\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))
    }
}

/// Pooled SQLite handle. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
    path: PathBuf,
}

impl Database {
    /// Open or create a database file and apply the schema.
    pub fn open(path: &Path, config: &PoolConfig) -> Result<Self, StoreError> {
        if config.pool_size == 0 {
            return Err(StoreError::Pool("pool size must be at least 1".into()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("create dir: {e}")))?;
        }

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.checkout_timeout)
            .connection_customizer(Box::new(PragmaCustomizer {
                busy_timeout_ms: config.busy_timeout_ms,
            }))
            .build(SqliteConnectionManager::file(path))
            .map_err(pool_err)?;

        let db = Self {
            pool,
            path: path.to_owned(),
        };
        db.bootstrap()?;

        info!(path = %path.display(), pool_size = config.pool_size, "transcript database opened");
        Ok(db)
    }

    /// In-memory database for tests.
    ///
    /// Every SQLite memory connection is its own database, so the pool holds
    /// exactly one connection and never recycles it.
    pub fn in_memory() -> Result<Self, StoreError> {
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_customizer(Box::new(PragmaCustomizer {
                busy_timeout_ms: PoolConfig::default().busy_timeout_ms,
            }))
            .build(SqliteConnectionManager::memory())
            .map_err(pool_err)?;

        let db = Self {
            pool,
            path: PathBuf::from(":memory:"),
        };
        db.bootstrap()?;
        Ok(db)
    }

    fn bootstrap(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute_batch(schema::CREATE_TABLES)
                .map_err(|e| StoreError::Database(format!("schema: {e}")))?;

            let version: Option<u32> = conn
                .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                    row.get(0)
                })
                .ok();

            if version.is_none() {
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    [schema::SCHEMA_VERSION],
                )
                .map_err(|e| StoreError::Database(format!("schema version: {e}")))?;
            }
            Ok(())
        })
    }

    /// Run a closure against a pooled connection. Blocking.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.pool.get().map_err(pool_err)?;
        f(&conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_connections(&self) -> u32 {
        self.pool.max_size()
    }
}

fn pool_err(e: r2d2::Error) -> StoreError {
    StoreError::Pool(e.to_string())
}

pub(crate) fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}
