//! Logwarden Notify - Outbound status events
//!
//! Implementations of the `IEventSink` port from `logwarden-core`:
//!
//! - [`CefLoggerSink`] - Formats each event as a CEF line and hands it to
//!   the system `logger` binary for syslog forwarding
//! - [`TracingSink`] - Records events in the operations log only
//!
//! Delivery is fire-and-forget from the audit's side: a sink reports a
//! failure to start delivery, and a logger that exits unsuccessfully is only
//! logged. Logger invocations run one at a time in release order.

pub mod cef;
pub mod sinks;

pub use cef::format_cef;
pub use sinks::{CefLoggerSink, TracingSink};

use std::path::PathBuf;

/// Errors raised while handing an event off
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The logger binary could not be started
    #[error("Failed to start {logger}: {source}")]
    Spawn {
        logger: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
