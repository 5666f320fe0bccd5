//! CLI: config loading, serve and poll commands
//!
//! This crate provides the `courtwatch` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use config::AppConfig;
pub use error::{ClientError, ClientResult};
