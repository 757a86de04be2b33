//! Audit command - Run one audit pass over the log tree
//!
//! Provides the `logwarden audit` CLI command which:
//! 1. Audits every active device, or only critical ones with `--critical-only`
//! 2. Registers devices that appeared on disk since the last pass
//! 3. Optionally writes the fleet report afterwards with `--report`

use clap::Args;
use logwarden_core::usecases::{AuditMode, AuditSummary, RunAuditUseCase};
use tracing::info;

use super::report::produce_report;
use super::{CommandContext, CommandResult};
use crate::output::OutputFormatter;

/// Audit command arguments
#[derive(Debug, Args)]
pub struct AuditCommand {
    /// Only audit devices flagged critical
    #[arg(long)]
    pub critical_only: bool,

    /// Write the fleet report after the pass
    #[arg(long)]
    pub report: bool,
}

impl AuditCommand {
    pub fn mode(&self) -> AuditMode {
        if self.critical_only {
            AuditMode::CriticalOnly
        } else {
            AuditMode::Full
        }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> CommandResult {
        let formatter = ctx.formatter();
        let store = ctx.open_registry(false).await?;

        let use_case = RunAuditUseCase::new(
            store.registry(),
            ctx.log_tree(),
            ctx.event_sink(),
            ctx.config.audit.inactive_after_days,
        );

        let summary = match use_case.execute(self.mode(), ctx.today()).await {
            Ok(summary) => summary,
            Err(e) => {
                store.close().await;
                return Err(e.into());
            }
        };

        info!(
            audited = summary.audited,
            logging = summary.logging,
            newly_overdue = summary.newly_overdue,
            newly_inactive = summary.newly_inactive,
            discovered = summary.discovered,
            skipped = summary.skipped.len(),
            "Audit pass complete"
        );

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "mode": if self.critical_only { "critical_only" } else { "full" },
                "summary": summary,
            }));
        } else {
            print_summary(formatter.as_ref(), &summary);
        }

        let result = if self.report {
            produce_report(ctx, store.registry()).await
        } else {
            Ok(())
        };
        store.close().await;
        result
    }
}

fn print_summary(formatter: &dyn OutputFormatter, summary: &AuditSummary) {
    formatter.success(&format!("Audited {} device(s)", summary.audited));
    formatter.info(&format!("Logging:         {}", summary.logging));
    formatter.info(&format!("Resumed:         {}", summary.resumed));
    formatter.info(&format!("Pending:         {}", summary.pending));
    formatter.info(&format!("Overdue:         {}", summary.overdue));
    formatter.info(&format!("Newly overdue:   {}", summary.newly_overdue));
    formatter.info(&format!("Newly inactive:  {}", summary.newly_inactive));
    formatter.info(&format!("Discovered:      {}", summary.discovered));
    formatter.info(&format!(
        "Committed:       {} update(s), {} insert(s)",
        summary.updates, summary.inserts
    ));

    for skipped in &summary.skipped {
        formatter.warn(&format!("Skipped {}: {}", skipped.device, skipped.reason));
    }
}
