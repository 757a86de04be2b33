//! Populate command - Fill an empty registry from the log tree

use clap::Args;
use logwarden_core::usecases::PopulateUseCase;
use tracing::info;

use super::{CommandContext, CommandResult};

/// Populate command arguments
#[derive(Debug, Args)]
pub struct PopulateCommand {}

impl PopulateCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> CommandResult {
        let formatter = ctx.formatter();
        let store = ctx.open_registry(true).await?;

        let result = PopulateUseCase::new(
            store.registry(),
            ctx.log_tree(),
            ctx.config.audit.inactive_after_days,
        )
        .execute(ctx.today())
        .await;
        store.close().await;
        let summary = result?;

        info!(
            inserted = summary.inserted,
            active = summary.active,
            inactive = summary.inactive,
            "Registry populated"
        );

        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "summary": summary,
            }));
        } else {
            formatter.success(&format!("Registered {} device(s)", summary.inserted));
            formatter.info(&format!("Active:   {}", summary.active));
            formatter.info(&format!("Inactive: {}", summary.inactive));
            for skipped in &summary.skipped {
                formatter.warn(&format!("Skipped {}: {}", skipped.device, skipped.reason));
            }
        }
        Ok(())
    }
}
