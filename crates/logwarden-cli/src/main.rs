//! Logwarden CLI - Command-line interface for Logwarden
//!
//! Provides commands for:
//! - Running audit passes over the monitored log tree
//! - Populating an empty registry
//! - Operator overrides from device list files
//! - Writing the fleet report
//! - Viewing and validating configuration

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use logwarden_core::config::Config;
use tracing::{error, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    audit::AuditCommand,
    config::ConfigCommand,
    overrides::{DeviceListArgs, OverrideKind},
    populate::PopulateCommand,
    report::ReportCommand,
    CommandContext, CommandResult, Failure,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "logwarden",
    version,
    about = "Track which devices are still writing to the central log tree"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run an audit pass over the log tree
    Audit(AuditCommand),
    /// Fill an empty registry from the log tree
    Populate(PopulateCommand),
    /// Toggle the critical flag for the devices listed in FILE
    Critical(DeviceListArgs),
    /// Toggle manual inactivity for the devices listed in FILE
    Inactive(DeviceListArgs),
    /// Set the expected frequency from `name,days` lines in FILE
    Frequency(DeviceListArgs),
    /// Write the fleet report
    Report(ReportCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Commands {
    /// Whether the command works on the registry and reports failures as events
    fn uses_registry(&self) -> bool {
        !matches!(self, Commands::Config(_))
    }

    async fn execute(&self, ctx: &CommandContext) -> CommandResult {
        match self {
            Commands::Audit(cmd) => cmd.execute(ctx).await,
            Commands::Populate(cmd) => cmd.execute(ctx).await,
            Commands::Critical(cmd) => cmd.execute(OverrideKind::Critical, ctx).await,
            Commands::Inactive(cmd) => cmd.execute(OverrideKind::Inactive, ctx).await,
            Commands::Frequency(cmd) => cmd.execute(OverrideKind::Frequency, ctx).await,
            Commands::Report(cmd) => cmd.execute(ctx).await,
            Commands::Config(cmd) => cmd.execute(ctx).await,
        }
    }
}

/// Load the configuration file
///
/// A missing file falls back to defaults unless it was named explicitly.
fn load_config(path: &Path, explicit: bool) -> anyhow::Result<Config> {
    if !path.exists() {
        if explicit {
            return Err(anyhow!("Configuration file not found: {}", path.display()));
        }
        return Ok(Config::default());
    }
    Config::load(path).with_context(|| format!("Failed to parse configuration {}", path.display()))
}

/// Console verbosity from `-v`/`-q`; `RUST_LOG` takes precedence
fn console_filter(verbose: u8, quiet: bool) -> EnvFilter {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the operations-log file layer and the console layer
///
/// The returned guard flushes the file writer when dropped.
fn init_tracing(
    config: &Config,
    verbose: u8,
    quiet: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let mut log_guard = None;
    let file_layer = match std::fs::create_dir_all(&config.logging.dir) {
        Ok(()) => {
            let file_appender =
                tracing_appender::rolling::never(&config.logging.dir, &config.logging.file_name);
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            log_guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_filter(file_filter),
            )
        }
        Err(err) => {
            eprintln!(
                "Warning: failed to create log directory {}: {}",
                config.logging.dir.display(),
                err
            );
            None
        }
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter(verbose, quiet));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    log_guard
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let formatter = get_formatter(format, cli.quiet);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = match load_config(&config_path, cli.config.is_some()) {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_tracing(&config, cli.verbose, cli.quiet);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            formatter.error(&format!("Failed to start runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    let ctx = CommandContext {
        config,
        config_path,
        format,
        quiet: cli.quiet,
    };

    let result = runtime.block_on(async {
        if cli.command.uses_registry() {
            let errors = ctx.config.validate();
            if !errors.is_empty() {
                let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
                return Err(Failure::new(
                    "Config Error",
                    anyhow!("Invalid configuration: {}", joined.join("; ")),
                ));
            }
        }

        tokio::select! {
            result = cli.command.execute(&ctx) => result,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted; uncommitted changes are rolled back");
                Err(Failure::new("Interrupted", anyhow!("Interrupted")))
            }
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(label = failure.label, error = %format!("{:#}", failure.error), "Command failed");
            if cli.command.uses_registry() {
                runtime.block_on(ctx.report_failure(failure.label));
            }
            formatter.error(&format!("{:#}", failure.error));
            ExitCode::FAILURE
        }
    }
}
