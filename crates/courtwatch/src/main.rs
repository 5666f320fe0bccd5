//! courtwatch CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use courtwatch_core::{TracingConfig, init_tracing};

use courtwatch::cli::{Cli, Command, ConfigAction};
use courtwatch::commands;
use courtwatch::config::AppConfig;
use courtwatch::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match cli.command {
        Command::Serve { .. } if !cli.debug => TracingConfig::serve(),
        _ => TracingConfig::cli(cli.debug),
    }
    .with_format(cli.log_format);
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    if let Command::Config {
        action: ConfigAction::Path,
    } = cli.command
    {
        return commands::config::path();
    }

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { bind } => commands::serve::run(&config, bind).await,
        Command::Poll { dry_run } => commands::poll::run(&config, dry_run).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
