//! Config command - View and check Logwarden configuration
//!
//! Provides the `logwarden config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration and reports every error

use anyhow::{anyhow, Context};
use clap::Subcommand;
use tracing::info;

use super::{CommandContext, CommandResult, FailWith, Failure};

const CONFIG_LABEL: &str = "Config Error";

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> CommandResult {
        match self {
            ConfigCommand::Show => execute_show(ctx),
            ConfigCommand::Validate => execute_validate(ctx),
        }
    }
}

fn execute_show(ctx: &CommandContext) -> CommandResult {
    let formatter = ctx.formatter();

    info!(config_path = %ctx.config_path.display(), "Showing configuration");

    if ctx.format.is_json() {
        let json = serde_json::to_value(&ctx.config)
            .context("Failed to serialize configuration to JSON")
            .fail_with(CONFIG_LABEL)?;
        formatter.print_json(&json);
    } else {
        let yaml = serde_yaml::to_string(&ctx.config)
            .context("Failed to serialize configuration to YAML")
            .fail_with(CONFIG_LABEL)?;

        formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
        if !ctx.config_path.exists() {
            formatter.info("File not found; showing defaults");
        }
        formatter.info(&format!("Operations log: {}", ctx.config.log_file().display()));
        formatter.info("");
        for line in yaml.lines() {
            formatter.info(line);
        }
    }

    Ok(())
}

fn execute_validate(ctx: &CommandContext) -> CommandResult {
    let formatter = ctx.formatter();

    info!(config_path = %ctx.config_path.display(), "Validating configuration");

    let errors = ctx.config.validate();

    if ctx.format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": ctx.config_path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", ctx.config_path.display()));
    } else {
        formatter.info(&format!("File: {}", ctx.config_path.display()));
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Failure::new(
            CONFIG_LABEL,
            anyhow!(
                "Configuration has {} error{}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ),
        ))
    }
}
