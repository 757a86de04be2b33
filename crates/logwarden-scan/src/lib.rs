//! Logwarden Scan - Read-only view of the monitored log tree
//!
//! Walks the directory tree collectors write into and turns it into device
//! identities with the log days observed for each.
//!
//! ## Architecture
//!
//! This crate implements the `ILogTree` port from `logwarden-core` on top
//! of `walkdir`. Walks are blocking and run on tokio's blocking pool.
//!
//! ## Expected layout
//!
//! ```text
//! <root>/fw01/2024-06-30/messages.log            standard device
//! <root>/fw01/2024-06-30/13/messages.log         hour subdirectories
//! <root>/site-a/switch03/2024-06-30/syslog.log   anomalous (nested) device
//! <root>/site-a/ap7/today/                       nested device, relative day labels
//! <root>/newbox/                                 empty: registered with no dates
//! ```

pub mod scanner;

pub use scanner::LogTreeScanner;

use std::path::PathBuf;

use logwarden_core::domain::DomainError;

/// Errors that abort a scan
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The monitored root or a directory beneath it could not be read
    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory walk failed
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// A date-shaped directory name is not a real calendar date
    #[error(transparent)]
    MalformedDate(#[from] DomainError),

    /// The blocking walk task did not complete
    #[error("Scan task failed: {0}")]
    Task(String),
}
