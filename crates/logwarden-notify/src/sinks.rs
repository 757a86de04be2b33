//! IEventSink implementations

use std::path::PathBuf;
use std::process::Stdio;

use logwarden_core::config::{CefConfig, EventsConfig};
use logwarden_core::domain::DeviceEvent;
use logwarden_core::ports::IEventSink;
use tokio::process::Command;

use crate::cef::format_cef;
use crate::NotifyError;

// ============================================================================
// CefLoggerSink
// ============================================================================

/// Hands each event to the system `logger` binary as one CEF line
///
/// Each invocation is waited on before the next, so the system log receives
/// events in the order they were released. A non-zero exit is logged and
/// otherwise ignored.
pub struct CefLoggerSink {
    logger_path: PathBuf,
    header: CefConfig,
}

impl CefLoggerSink {
    pub fn new(logger_path: impl Into<PathBuf>, header: CefConfig) -> Self {
        Self {
            logger_path: logger_path.into(),
            header,
        }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.logger_path.clone(), config.cef.clone())
    }
}

#[async_trait::async_trait]
impl IEventSink for CefLoggerSink {
    async fn emit(&self, event: &DeviceEvent) -> anyhow::Result<()> {
        let line = format_cef(&self.header, event);

        let status = Command::new(&self.logger_path)
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| NotifyError::Spawn {
                logger: self.logger_path.clone(),
                source,
            })?;

        if !status.success() {
            tracing::warn!(
                logger = %self.logger_path.display(),
                status = %status,
                subject = event.subject(),
                code = event.code().code(),
                "Logger exited unsuccessfully"
            );
            return Ok(());
        }

        tracing::debug!(
            subject = event.subject(),
            code = event.code().code(),
            "Event handed to logger"
        );
        Ok(())
    }
}

// ============================================================================
// TracingSink
// ============================================================================

/// Writes events to the operations log only
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl IEventSink for TracingSink {
    async fn emit(&self, event: &DeviceEvent) -> anyhow::Result<()> {
        tracing::info!(
            subject = event.subject(),
            code = event.code().code(),
            kind = %event.code(),
            "Device event"
        );
        Ok(())
    }
}
