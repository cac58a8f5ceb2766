//! Connection pool for the record store.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::sqlite::{SqliteAutoVacuum, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::sqlite::SqliteSynchronous;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Enough for a listing's concurrent child lookups plus a writer.
const FILE_POOL_SIZE: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Per-connection settings with no `SqliteConnectOptions` equivalent. The
/// store is small and read-mostly, so a modest page cache is plenty.
const CONNECTION_PRAGMAS: &[(&str, &str)] = &[
    ("wal_autocheckpoint", "1000"),
    ("cache_size", "-4096"),
    ("temp_store", "MEMORY"),
];

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}
impl Location {
    fn options(&self) -> SqliteConnectOptions {
        let options = SqliteConnectOptions::new()
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .auto_vacuum(SqliteAutoVacuum::None);
        match self {
            Self::File(path) => options.filename(path).create_if_missing(true).journal_mode(SqliteJournalMode::Wal),
            Self::Memory => options.filename(":memory:"),
        }
    }

    /// Every connection to `:memory:` opens a separate database, so the
    /// in-memory pool is pinned to a single connection.
    fn pool_size(&self) -> u32 {
        match self {
            Self::File(_) => FILE_POOL_SIZE,
            Self::Memory => 1,
        }
    }
}
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(":memory:"),
        }
    }
}

/// Handle to the SQLite pool holding path records and reports.
///
/// Migrations are applied on every connect. Queries go through a
/// [`Repository`](crate::Repository) built from this handle.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the store at `path`, creating missing parent
    /// directories first.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Database)?;
        }
        Self::open(Location::File(path.to_path_buf())).await
    }

    /// Open a throwaway in-memory store. Not gated on `cfg(test)` so that
    /// dependent crates can use it in their own tests.
    pub async fn connect_in_memory() -> Result<Self> {
        Self::open(Location::Memory).await
    }

    #[instrument(level = "debug", skip_all, fields(location = %location))]
    async fn open(location: Location) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(location.pool_size())
            // Pooled connections are opened lazily; each one needs the
            // pragmas, not just the first.
            .after_connect(|conn, _meta| Box::pin(async move { Self::configure(conn).await }))
            .connect_with(location.options())
            .await
            .or_raise(|| ErrorKind::Database)?;
        MIGRATOR.run(&pool).await.or_raise(|| ErrorKind::Migration)?;
        tracing::debug!("record store ready");
        Ok(Self { pool })
    }

    async fn configure(conn: &mut SqliteConnection) -> sqlx::Result<()> {
        for (name, value) in CONNECTION_PRAGMAS {
            sqlx::query(&format!("PRAGMA {name} = {value}")).execute(&mut *conn).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Refresh planner statistics and close every connection.
    pub async fn close(&self) {
        if let Err(e) = sqlx::query("PRAGMA optimize").execute(&self.pool).await {
            tracing::debug!(error = %e, "PRAGMA optimize failed on close");
        }
        self.pool.close().await;
    }
}
