//! Database connection pool management
//!
//! Provides a wrapper around SQLx's SqlitePool with:
//! - Automatic directory creation for new registry files
//! - WAL journal mode
//! - Schema migration on every open
//! - In-memory mode for testing

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::RegistryError;

/// Manages a pool of SQLite connections to the device registry
///
/// The pool is configured with:
/// - WAL journal mode
/// - 5 max connections for file-based databases
/// - 1 connection for in-memory databases (required for data persistence)
/// - 5-second busy timeout to handle write contention
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the registry at `db_path`, creating it if it does not exist
    ///
    /// This will:
    /// 1. Create parent directories if they don't exist
    /// 2. Create the database file if it doesn't exist
    /// 3. Enable WAL journal mode
    /// 4. Create the `devices` table when absent
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ConnectionFailed` if the connection cannot be established,
    /// or `RegistryError::MigrationFailed` if the schema cannot be created.
    pub async fn new(db_path: &Path) -> Result<Self, RegistryError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RegistryError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Self::connect(db_path, true).await
    }

    /// Opens a registry that must already exist
    ///
    /// Used by every command except initial population.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if there is no file at `db_path`.
    pub async fn open_existing(db_path: &Path) -> Result<Self, RegistryError> {
        if !db_path.is_file() {
            return Err(RegistryError::NotFound(db_path.display().to_string()));
        }
        Self::connect(db_path, false).await
    }

    async fn connect(db_path: &Path, create: bool) -> Result<Self, RegistryError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                RegistryError::ConnectionFailed(format!(
                    "Failed to connect to database at {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::info!(
            path = %db_path.display(),
            "Registry opened"
        );

        Ok(Self { pool })
    }

    /// Creates an in-memory database pool for testing
    ///
    /// Uses a single connection to ensure data persistence across queries
    /// (SQLite in-memory databases are per-connection).
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ConnectionFailed` if the connection cannot be established,
    /// or `RegistryError::MigrationFailed` if the schema cannot be created.
    pub async fn in_memory() -> Result<Self, RegistryError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                RegistryError::ConnectionFailed(format!(
                    "Failed to create in-memory database: {}",
                    e
                ))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::debug!("In-memory registry initialized");

        Ok(Self { pool })
    }

    /// Returns a reference to the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Runs the initial schema migration
    async fn run_migrations(pool: &SqlitePool) -> Result<(), RegistryError> {
        let migration_sql = include_str!("migrations/20240101_initial.sql");
        sqlx::raw_sql(migration_sql)
            .execute(pool)
            .await
            .map_err(|e| {
                RegistryError::MigrationFailed(format!("Failed to run initial migration: {}", e))
            })?;

        tracing::debug!("Registry schema ready");
        Ok(())
    }
}
