//! Run-level error taxonomy
//!
//! Every variant is fatal to the current command and guarantees nothing was
//! committed. Per-device anomalies are not errors; they are logged and
//! reported as skips in the run summary.

use thiserror::Error;

use crate::domain::DeviceName;

/// Fatal failure of an audit, population, override, or report run
#[derive(Debug, Error)]
pub enum AuditError {
    /// Opening, querying, or committing to the registry failed
    #[error("Registry failure: {0:#}")]
    Store(anyhow::Error),

    /// The monitored tree could not be walked or held a malformed date directory
    #[error("Log tree scan failed: {0:#}")]
    Scan(anyhow::Error),

    /// The registry holds several records under one name
    #[error("Duplicate device names in registry: {}", join_names(.0))]
    DuplicateNames(Vec<DeviceName>),

    /// Initial population was requested against a registry that has records
    #[error("Registry is not empty; initial population requires an empty registry")]
    RegistryNotEmpty,

    /// An operator-supplied list or file was unusable
    #[error("Invalid input: {0}")]
    Input(String),
}

impl AuditError {
    /// Short label carried as the subject of the operational-error event
    pub fn label(&self) -> &'static str {
        match self {
            AuditError::Store(_) => "Query Error",
            AuditError::Scan(_) => "Scan Error",
            AuditError::DuplicateNames(_) => "Duplicates Found",
            AuditError::RegistryNotEmpty => "Populate Refused",
            AuditError::Input(_) => "Input Error",
        }
    }
}

fn join_names(names: &[DeviceName]) -> String {
    names
        .iter()
        .map(DeviceName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
