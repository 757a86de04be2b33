//! Logwarden Registry - Persistent device records
//!
//! SQLite-backed store for:
//! - Device identity, first/last log day and expected frequency
//! - Critical, inactive and not-logging flags with their dates
//!
//! ## Architecture
//!
//! This crate implements the `IDeviceRegistry` port from `logwarden-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteDeviceRegistry`] - Full `IDeviceRegistry` implementation
//! - [`RegistryLock`] - Exclusive advisory lock held for a whole command
//! - [`RegistryError`] - Error types for registry operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use logwarden_registry::{DatabasePool, RegistryLock, SqliteDeviceRegistry};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let db = Path::new("/var/lib/logwarden/devices.db");
//! let _lock = RegistryLock::acquire(db)?;
//! let pool = DatabasePool::open_existing(db).await?;
//! let registry = SqliteDeviceRegistry::new(pool.pool().clone());
//! // Use registry as IDeviceRegistry...
//! # Ok(())
//! # }
//! ```

pub mod lock;
pub mod pool;
pub mod repository;

pub use lock::RegistryLock;
pub use pool::DatabasePool;
pub use repository::SqliteDeviceRegistry;

/// Errors that can occur during registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The registry file does not exist yet
    #[error("Registry not found at {0}; run `logwarden populate` first")]
    NotFound(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be turned into a device record
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Another process holds the registry lock
    #[error("Registry is locked by another logwarden process ({0})")]
    Locked(String),
}

impl From<sqlx::Error> for RegistryError {
    fn from(e: sqlx::Error) -> Self {
        RegistryError::QueryFailed(e.to_string())
    }
}
