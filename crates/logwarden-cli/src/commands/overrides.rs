//! Override commands - Apply operator changes from a device list file
//!
//! Provides the `logwarden critical`, `logwarden inactive` and
//! `logwarden frequency` CLI commands. Each reads one device per line
//! (`name,days` for frequency) and applies all changes in one commit.

use std::path::{Path, PathBuf};

use clap::Args;
use logwarden_core::domain::{DeviceName, Frequency};
use logwarden_core::usecases::{
    parse_device_list, parse_frequency_list, AuditError, OverrideOutcome, OverrideUseCase,
};
use tracing::info;

use super::{CommandContext, CommandResult};
use crate::output::OutputFormatter;

/// Which override a device list file drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    Critical,
    Inactive,
    Frequency,
}

impl OverrideKind {
    fn verb(&self) -> &'static str {
        match self {
            OverrideKind::Critical => "Toggled critical flag on",
            OverrideKind::Inactive => "Toggled inactivity on",
            OverrideKind::Frequency => "Set frequency on",
        }
    }
}

/// Device list file argument shared by the override commands
#[derive(Debug, Args)]
pub struct DeviceListArgs {
    /// File with one device name per line (`name,days` for frequency)
    pub file: PathBuf,
}

impl DeviceListArgs {
    pub async fn execute(&self, kind: OverrideKind, ctx: &CommandContext) -> CommandResult {
        let formatter = ctx.formatter();

        // Step 1: Parse the list before the registry is opened
        let content = read_list(&self.file)?;
        let request = match kind {
            OverrideKind::Critical => Request::Critical(parse_device_list(&content)?),
            OverrideKind::Inactive => Request::Inactive(parse_device_list(&content)?),
            OverrideKind::Frequency => Request::Frequency(parse_frequency_list(&content)?),
        };

        // Step 2: Apply in one commit
        let store = ctx.open_registry(false).await?;
        let use_case = OverrideUseCase::new(store.registry());
        let result = match &request {
            Request::Critical(names) => use_case.toggle_critical(names).await,
            Request::Inactive(names) => use_case.toggle_inactive(names, ctx.today()).await,
            Request::Frequency(pairs) => use_case.set_frequency(pairs).await,
        };
        store.close().await;
        let outcome = result?;

        info!(
            file = %self.file.display(),
            kind = ?kind,
            updated = outcome.updated.len(),
            unknown = outcome.unknown.len(),
            "Override applied"
        );

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "updated": outcome.updated,
                "unknown": outcome.unknown,
            }));
        } else {
            print_outcome(formatter.as_ref(), kind, &outcome);
        }
        Ok(())
    }
}

enum Request {
    Critical(Vec<DeviceName>),
    Inactive(Vec<DeviceName>),
    Frequency(Vec<(DeviceName, Frequency)>),
}

fn read_list(path: &Path) -> Result<String, AuditError> {
    std::fs::read_to_string(path)
        .map_err(|e| AuditError::Input(format!("cannot read {}: {}", path.display(), e)))
}

fn print_outcome(
    formatter: &dyn OutputFormatter,
    kind: OverrideKind,
    outcome: &OverrideOutcome,
) {
    formatter.success(&format!("{} {} device(s)", kind.verb(), outcome.updated.len()));
    for name in &outcome.updated {
        formatter.info(name.as_str());
    }
    for name in &outcome.unknown {
        formatter.warn(&format!("Unknown device: {}", name));
    }
}
