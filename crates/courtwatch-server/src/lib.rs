//! Monitor: poll pipeline, change detection, email notifications, HTTP front-end.
//!
//! This crate provides the long-running side of courtwatch:
//! - The [`Monitor`] poll pipeline over a [`ScheduleSource`]
//! - The in-memory [`ChangeDetector`] that suppresses duplicate emails
//! - The [`Notifier`] seam and its SMTP implementation
//! - The axum router serving `/api/status` and the status page
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use courtwatch_core::MonitorClock;
//! use courtwatch_providers::large_screen::{LargeScreenClient, LargeScreenConfig};
//! use courtwatch_server::{LogNotifier, Monitor, MonitorSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LargeScreenClient::new(LargeScreenConfig::default())?;
//!     let monitor = Monitor::new(
//!         Arc::new(client),
//!         Arc::new(LogNotifier),
//!         MonitorSettings::default(),
//!         MonitorClock::Local,
//!     );
//!     let report = monitor.poll().await;
//!     println!("{:?}", report.status());
//!     Ok(())
//! }
//! ```
//!
//! [`ScheduleSource`]: courtwatch_providers::ScheduleSource

mod change;
mod config;
mod error;
mod http;
mod monitor;
mod notify;
mod signals;

pub use change::{
    ChangeDetector, SharedChangeDetector, new_change_detector, should_notify, summary,
    summary_digest,
};
pub use config::{MonitorSettings, PlannedFetch, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use http::{AppState, router, serve};
pub use monitor::{Monitor, PollReport, ResourceOutcome, StatusResponse};
pub use notify::{
    EmailConfig, EmailNotifier, LogNotifier, Notifier, NotifyError, NotifyResult, SMTPS_PORT,
    compose_body,
};
pub use signals::{ShutdownSignal, SignalHandler};
