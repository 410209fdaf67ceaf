//! huecheck CLI - submit test results for formatting and render the report.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use huecheck::cli::{App, Command, dispatch};
use huecheck::config::{self, API_URL_ENV};
use huecheck::report::ConsoleReporter;
use huecheck::shell::run_shell;

#[derive(Parser)]
#[command(name = "huecheck")]
#[command(about = "Submit test results for formatting and render the report", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (default: ./huecheck.toml if present)
    #[arg(long)]
    config: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Base URL of the formatting API
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Override the maximum number of poll attempts
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Override the delay between poll attempts, in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Disable colored report output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = config::resolve_config(cli.config.as_deref())?;

    // Apply overrides
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.poll.max_attempts = max_attempts;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.poll.interval_ms = interval_ms;
    }
    if cli.no_color {
        config.report.color = false;
    }
    config.validate().context("Invalid configuration")?;

    info!("Using API at {}", config.api.base_url);

    let styled = config.report.color && console::colors_enabled();
    let reporter = ConsoleReporter::new().with_styling(config.report.color);
    let app = App::new(config, Arc::new(reporter)).with_styling(styled);

    match cli.command.unwrap_or(Command::Shell) {
        Command::Shell => run_shell(&app).await,
        command => {
            debug!("Running {:?}", command);
            dispatch(&app, command).await
        }
    }
}
