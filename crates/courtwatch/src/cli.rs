//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use courtwatch_core::TracingOutputFormat;

/// courtwatch - badminton court availability monitor
#[derive(Debug, Parser)]
#[command(name = "courtwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "COURTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log format: pretty, compact or json
    #[arg(long, env = "COURTWATCH_LOG_FORMAT", default_value = "compact")]
    pub log_format: TracingOutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the status page and /api/status until interrupted
    Serve {
        /// Listen address, overriding `server.bind`
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Run one poll and print the status JSON
    Poll {
        /// Log the notification instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
