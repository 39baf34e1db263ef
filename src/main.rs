// ABOUTME: Entry point for the webdeploy CLI application.
// ABOUTME: Parses arguments, sets up logging and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use tracing_subscriber::EnvFilter;
use webdeploy::config::{self, Config};
use webdeploy::error::Result;
use webdeploy::output::{Output, OutputMode};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --verbose forces debug; otherwise RUST_LOG, falling back to warn
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(OutputMode::from_flags(cli.quiet, cli.json));

    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let cwd = env::current_dir()?;

    if let Commands::Init { force } = cli.command {
        let path = config::init_config(&cwd, cli.namespace.as_deref(), force)?;
        output.success(&format!("Created {}", path.display()));
        return Ok(());
    }

    let mut config = Config::resolve(cli.config.as_deref(), &cwd)?;
    if let Some(namespace) = cli.namespace {
        config.namespace = namespace;
        config.validate()?;
    }

    commands::dispatch(cli.command, &config, output).await
}
