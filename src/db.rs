//! SQLite connection management.
//!
//! The corpus is a single-session store: every pool opened here holds
//! exactly one connection for the lifetime of the handle. Foreign keys are
//! enforced on every connection so that dangling chapter/file references
//! are rejected by the engine as well as by the store's own checks.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::DbConfig;

/// Open (creating if needed) the configured database file.
///
/// Parent directories are created on demand and WAL journaling is enabled.
pub async fn connect(config: &DbConfig) -> Result<SqlitePool> {
    let db_path = &config.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = single_connection_pool()
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Open a private in-memory database.
///
/// The connection is never recycled, since dropping it would discard the
/// whole database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = single_connection_pool()
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

fn single_connection_pool() -> SqlitePoolOptions {
    SqlitePoolOptions::new().min_connections(1).max_connections(1)
}
