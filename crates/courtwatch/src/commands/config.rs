//! Configuration commands.

use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Dump the current configuration to stdout.
pub fn dump(config: &AppConfig) -> ClientResult<()> {
    let mut shown = config.clone();
    if !shown.email.password.is_empty() && !secret::is_reference(&shown.email.password) {
        shown.email.password = "********".to_string();
    }
    let toml_str = toml::to_string_pretty(&shown)
        .map_err(|e| ClientError::config(format!("failed to serialize config: {}", e)))?;
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration, resolving the SMTP password.
pub fn validate(config: &AppConfig) -> ClientResult<()> {
    config.validate()?;
    config.email.to_email_config()?;
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ClientResult<()> {
    println!("config: {}", AppConfig::default_path().display());
    Ok(())
}
