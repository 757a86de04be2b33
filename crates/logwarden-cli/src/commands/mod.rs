//! Command implementations
//!
//! Every command receives a [`CommandContext`] holding the loaded
//! configuration and returns [`CommandResult`]. A [`Failure`] carries the
//! short label that `main` sends with the operational-error event.

pub mod audit;
pub mod config;
pub mod overrides;
pub mod populate;
pub mod report;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use logwarden_core::config::Config;
use logwarden_core::domain::DeviceEvent;
use logwarden_core::ports::{IDeviceRegistry, IEventSink, ILogTree};
use logwarden_core::usecases::AuditError;
use logwarden_notify::{CefLoggerSink, TracingSink};
use logwarden_registry::{DatabasePool, RegistryError, RegistryLock, SqliteDeviceRegistry};
use logwarden_scan::LogTreeScanner;
use tracing::{debug, warn};

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

// ============================================================================
// Failure
// ============================================================================

/// Fatal outcome of a command
#[derive(Debug)]
pub struct Failure {
    /// Subject of the operational-error event
    pub label: &'static str,
    pub error: anyhow::Error,
}

impl Failure {
    pub fn new(label: &'static str, error: impl Into<anyhow::Error>) -> Self {
        Self {
            label,
            error: error.into(),
        }
    }
}

impl From<AuditError> for Failure {
    fn from(err: AuditError) -> Self {
        Self::new(err.label(), err)
    }
}

impl From<RegistryError> for Failure {
    fn from(err: RegistryError) -> Self {
        Self::new("DB Error", err)
    }
}

pub type CommandResult = Result<(), Failure>;

/// Attach an event label to any error
pub trait FailWith<T> {
    fn fail_with(self, label: &'static str) -> Result<T, Failure>;
}

impl<T, E> FailWith<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn fail_with(self, label: &'static str) -> Result<T, Failure> {
        self.map_err(|e| Failure::new(label, e))
    }
}

// ============================================================================
// CommandContext
// ============================================================================

/// Everything a command needs from the process environment
pub struct CommandContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl CommandContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    /// Sink selected by `events.enabled`
    pub fn event_sink(&self) -> Arc<dyn IEventSink> {
        if self.config.events.enabled {
            Arc::new(CefLoggerSink::from_config(&self.config.events))
        } else {
            Arc::new(TracingSink::new())
        }
    }

    pub fn log_tree(&self) -> Arc<dyn ILogTree> {
        Arc::new(LogTreeScanner::from_config(&self.config.monitor))
    }

    /// The calendar day an audit pass treats as "today"
    pub fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    /// Lock and open the registry
    ///
    /// With `create` the database file and schema are created when absent;
    /// otherwise a missing registry is an error.
    pub async fn open_registry(&self, create: bool) -> Result<Store, Failure> {
        let path = &self.config.registry.path;
        let lock = RegistryLock::acquire(path)?;

        let pool = if create {
            DatabasePool::new(path).await?
        } else {
            DatabasePool::open_existing(path).await?
        };
        let registry = Arc::new(SqliteDeviceRegistry::new(pool.pool().clone()));

        debug!(path = %path.display(), "Registry opened");
        Ok(Store {
            _lock: lock,
            pool,
            registry,
        })
    }

    /// Send the operational-error event for a failed command
    pub async fn report_failure(&self, label: &str) {
        let event = DeviceEvent::operational_error(label);
        if let Err(e) = self.event_sink().emit(&event).await {
            warn!(label, error = %e, "Failed to deliver operational-error event");
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// An open registry together with the lock guarding it
pub struct Store {
    _lock: RegistryLock,
    pool: DatabasePool,
    registry: Arc<SqliteDeviceRegistry>,
}

impl Store {
    pub fn registry(&self) -> Arc<dyn IDeviceRegistry> {
        self.registry.clone()
    }

    /// Close the pool, then release the lock
    pub async fn close(self) {
        self.pool.close().await;
    }
}
