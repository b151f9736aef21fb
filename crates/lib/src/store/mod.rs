//! SQLite-backed storage for users, intentions and chat history.
//!
//! ## Architecture
//!
//! [`Store`] wraps a sqlx [`SqlitePool`] together with the [`Clock`] used to
//! stamp rows, so every timestamp and every "working day" default comes from a
//! single, swappable time source. Operations are grouped by table in the
//! submodules and exposed as methods on `Store`.
//!
//! Multi-row mutations (batch creates, reorders, frog checks) run inside a
//! single transaction.

mod chat;
mod errors;
mod intentions;
mod users;

/// Schema definition and migration system.
pub mod schema;

use std::sync::Arc;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::Result;
use crate::clock::{Clock, SystemClock};

pub use chat::ChatRecord;
pub use errors::StoreError;
pub use intentions::{
    Intention, IntentionStatus, IntentionUpdate, NewIntention, StatusField, StatusFilter,
};
pub use users::User;

/// Extension trait for sqlx Result types to simplify error handling.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to StoreError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            StoreError::Sqlx {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Handle to the application database.
///
/// Cloning is cheap: the pool and the clock are reference counted.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Open a SQLite database at the given path, creating file and schema if needed.
    pub async fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock)).await
    }

    /// Open a SQLite database at the given path with a custom clock.
    pub async fn open_with_clock<P: AsRef<std::path::Path>>(
        path: P,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect(&url, false, clock).await
    }

    /// Create an in-memory database that lives as long as this store (and its clones).
    pub async fn in_memory() -> Result<Self> {
        Self::in_memory_with_clock(Arc::new(SystemClock)).await
    }

    /// Create an in-memory database with a custom clock.
    pub async fn in_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self> {
        // Shared cache so all pooled connections see the same database; the
        // unique name keeps separate stores (e.g. parallel tests) isolated.
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect(&url, true, clock).await
    }

    async fn connect(url: &str, in_memory: bool, clock: Arc<dyn Clock>) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .sql_context("Invalid SQLite URL")?
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5));

        // When the last connection to a shared in-memory database closes the
        // data is gone, so keep one connection alive for the pool's lifetime.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(5)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
                .sql_context("Failed to connect to SQLite")?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(
                    options
                        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal),
                )
                .await
                .sql_context("Failed to connect to SQLite")?
        };

        let store = Self { pool, clock };
        schema::initialize(&store).await?;
        Ok(store)
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The clock used for timestamps and working-day defaults.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn now_millis(&self) -> i64 {
        self.clock.now_millis() as i64
    }

    /// Run a trivial query to check the database is reachable.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .sql_context("Database ping failed")?;
        Ok(())
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
