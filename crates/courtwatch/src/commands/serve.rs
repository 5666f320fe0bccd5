//! Long-running HTTP front-end.

use std::net::SocketAddr;
use std::sync::Arc;

use courtwatch_server::SignalHandler;
use tracing::info;

use crate::commands::build_monitor;
use crate::config::AppConfig;
use crate::error::ClientResult;

/// Serves the status page and `/api/status` until SIGINT or SIGTERM.
pub async fn run(config: &AppConfig, bind: Option<SocketAddr>) -> ClientResult<()> {
    let monitor = Arc::new(build_monitor(config, false)?);
    let server_config = config.server_config(bind);

    let signals = SignalHandler::new();
    signals.spawn_listener();

    let settings = monitor.settings();
    info!(
        first = %settings.first,
        last = %settings.last,
        aggregate = ?settings.aggregate.map(|a| a.get()),
        "Monitoring courts"
    );

    courtwatch_server::serve(monitor, &server_config, signals.shutdown()).await?;
    Ok(())
}
