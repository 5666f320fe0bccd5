//! Command implementations.

pub mod config;
pub mod poll;
pub mod serve;

use std::sync::Arc;

use courtwatch_providers::large_screen::LargeScreenClient;
use courtwatch_server::{EmailNotifier, LogNotifier, Monitor, Notifier};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::ClientResult;

/// Builds a monitor against the live upstream API.
///
/// With `dry_run`, notifications are logged instead of emailed and the
/// SMTP password is never resolved.
pub fn build_monitor(config: &AppConfig, dry_run: bool) -> ClientResult<Monitor> {
    config.validate()?;

    let source = LargeScreenClient::new(config.large_screen_config()?)?;
    let notifier: Arc<dyn Notifier> = if dry_run {
        Arc::new(LogNotifier)
    } else {
        Arc::new(EmailNotifier::new(&config.email.to_email_config()?)?)
    };
    debug!(notifier = notifier.name(), "Monitor ready");

    Ok(Monitor::new(
        Arc::new(source),
        notifier,
        config.monitor_settings(),
        config.clock()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::parse(
            r#"
[courts]
first = 1294
last = 1295

[email]
from = "bot@example.com"
password = "env::_COURTWATCH_CMD_TEST_UNSET_31337"
to = ["me@example.com"]
smtp_host = "smtp.example.com"
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn dry_run_skips_password_resolution() {
        let monitor = build_monitor(&config(), true).unwrap();
        assert_eq!(monitor.settings().courts().count(), 2);
    }

    #[tokio::test]
    async fn live_run_needs_password() {
        assert!(build_monitor(&config(), false).is_err());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_building() {
        let mut config = config();
        config.email.to.clear();
        assert!(build_monitor(&config, true).is_err());
    }
}
