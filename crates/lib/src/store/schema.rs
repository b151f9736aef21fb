//! SQL schema definitions and migrations.
//!
//! # Migration System
//!
//! Migrations are code-based functions rather than SQL files so a step can run
//! data fix-ups alongside DDL.
//!
//! ## Adding a New Migration
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add the migration to the match statement in `run_migration`

use crate::Result;

use super::errors::StoreError;
use super::{SqlxResultExt, Store};

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
///
/// Booleans are stored as INTEGER 0/1 and timestamps as BIGINT milliseconds
/// since the Unix epoch; dates are ISO `YYYY-MM-DD` text so they sort correctly.
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // password_hash is NULL for passwordless accounts
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT,
        show_tool_confirmations INTEGER NOT NULL DEFAULT 1,
        created_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS intentions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        date TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        sort_order BIGINT NOT NULL DEFAULT 0,
        creator_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        completed INTEGER NOT NULL DEFAULT 0,
        neverminded INTEGER NOT NULL DEFAULT 0,
        sticky INTEGER NOT NULL DEFAULT 0,
        froggy INTEGER NOT NULL DEFAULT 0,
        anxiety_inducing INTEGER NOT NULL DEFAULT 0
    )",
    // content holds plain text, or a JSON document for assistant turns with tool use
    "CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        creator_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        llm_provider TEXT
    )",
];

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_intentions_creator_date ON intentions(creator_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_intentions_order ON intentions(sort_order)",
    "CREATE INDEX IF NOT EXISTS idx_chat_messages_creator ON chat_messages(creator_id, created_at)",
];

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and handles migrations
/// if the schema version has changed.
pub async fn initialize(store: &Store) -> Result<()> {
    let pool = store.pool();

    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Schema creation failed - SQL: {statement}"))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
        }
        Some((current_version,)) if current_version < SCHEMA_VERSION => {
            migrate(store, current_version, SCHEMA_VERSION).await?;
        }
        Some((current_version,)) if current_version > SCHEMA_VERSION => {
            return Err(StoreError::Migration {
                reason: format!(
                    "database schema v{current_version} is newer than this build (v{SCHEMA_VERSION})"
                ),
            }
            .into());
        }
        Some(_) => {}
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Index creation failed - SQL: {statement}"))?;
    }

    Ok(())
}

/// Run migrations sequentially from one schema version to another.
async fn migrate(store: &Store, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        tracing::info!(from = current, to = next, "Running migration");

        run_migration(store, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(store.pool())
            .await
            .sql_context(&format!("Failed to update schema version to {next}"))?;

        current = next;
    }

    tracing::info!(from, to, "All migrations completed successfully");
    Ok(())
}

/// Execute a single migration step.
async fn run_migration(store: &Store, from: i64, to: i64) -> Result<()> {
    let _ = store;

    Err(StoreError::Migration {
        reason: format!(
            "Unknown migration path: v{from} to v{to}. \
             SCHEMA_VERSION was incremented without adding a migration."
        ),
    }
    .into())
}
