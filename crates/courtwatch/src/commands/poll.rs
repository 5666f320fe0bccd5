//! One-shot poll.

use tracing::warn;

use crate::commands::build_monitor;
use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};

/// Runs one poll and prints the `/api/status` body.
pub async fn run(config: &AppConfig, dry_run: bool) -> ClientResult<()> {
    let monitor = build_monitor(config, dry_run)?;
    let report = monitor.poll().await;

    for failure in report.failures() {
        if let Err(reason) = &failure.result {
            warn!(
                resource = %failure.resource,
                day = %failure.day,
                role = failure.role.as_str(),
                error = %reason,
                "Resource skipped"
            );
        }
    }

    let json = serde_json::to_string_pretty(&report.status())
        .map_err(|e| ClientError::config(format!("failed to serialize status: {}", e)))?;
    println!("{}", json);
    Ok(())
}
