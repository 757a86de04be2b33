//! Report command - Write the fleet report
//!
//! Provides the `logwarden report` CLI command which:
//! 1. Groups critical, not-logging and inactive devices
//! 2. Writes the sectioned text report into `reports.dir`
//! 3. Prints the report as JSON instead with `--json`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::Args;
use logwarden_core::ports::IDeviceRegistry;
use logwarden_core::usecases::{FleetReport, FleetReportUseCase};
use tracing::info;

use super::{CommandContext, CommandResult, FailWith, Failure};

const REPORT_LABEL: &str = "Report Error";

/// Report command arguments
#[derive(Debug, Args)]
pub struct ReportCommand {}

impl ReportCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> CommandResult {
        let store = ctx.open_registry(false).await?;
        let result = produce_report(ctx, store.registry()).await;
        store.close().await;
        result
    }
}

/// Build the report and deliver it in the context's output format
///
/// Shared with `logwarden audit --report`.
pub(crate) async fn produce_report(
    ctx: &CommandContext,
    registry: Arc<dyn IDeviceRegistry>,
) -> CommandResult {
    let formatter = ctx.formatter();

    let report = FleetReportUseCase::new(registry)
        .build()
        .await
        .map_err(|e| Failure::new(REPORT_LABEL, e))?;

    if ctx.format.is_json() {
        let json = serde_json::to_value(&report)
            .context("Failed to serialize report")
            .fail_with(REPORT_LABEL)?;
        formatter.print_json(&json);
        return Ok(());
    }

    let path = write_report(&ctx.config.reports.dir, &report, Local::now())
        .fail_with(REPORT_LABEL)?;

    info!(
        path = %path.display(),
        critical = report.critical.len(),
        not_logging = report.not_logging.len(),
        inactive = report.inactive.len(),
        "Report written"
    );

    formatter.success(&format!("Report written to {}", path.display()));
    formatter.info(&format!("Critical:    {}", report.critical.len()));
    formatter.info(&format!("Not logging: {}", report.not_logging.len()));
    formatter.info(&format!("Inactive:    {}", report.inactive.len()));
    Ok(())
}

/// Report name for a timestamp, also used as the report's title
fn report_name(now: DateTime<Local>) -> String {
    format!("logwarden-report_{}", now.format("%Y-%m-%d_%H.%M.%S"))
}

fn write_report(dir: &Path, report: &FleetReport, now: DateTime<Local>) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))?;

    let name = report_name(now);
    let path = dir.join(format!("{name}.txt"));
    std::fs::write(&path, report.render_text(&name))
        .with_context(|| format!("Failed to write report {}", path.display()))?;

    Ok(path)
}
