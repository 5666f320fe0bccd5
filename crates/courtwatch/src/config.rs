//! Application configuration.
//!
//! All settings live in a single `config.toml`, by default at
//! `~/.config/courtwatch/config.toml`. The file is read once at startup; a
//! missing or malformed file is fatal.
//!
//! `email.password` supports secret references:
//! - `pass::path/in/store` resolved via `pass show`
//! - `env::VAR_NAME` resolved from the environment
//! - plain text used as-is

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use courtwatch_core::{MonitorClock, ResourceId};
use courtwatch_providers::CalendarOccupancy;
use courtwatch_providers::large_screen::LargeScreenConfig;
use courtwatch_server::{EmailConfig, MonitorSettings, SMTPS_PORT, ServerConfig};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Configuration for courtwatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP front-end settings.
    pub server: ServerSettings,

    /// Upstream API settings.
    pub upstream: UpstreamSettings,

    /// Which courts to monitor.
    pub courts: CourtSettings,

    /// Time zone used for "today", "tomorrow" and slot start times.
    pub clock: ClockSettings,

    /// Notification email settings.
    pub email: EmailSettings,
}

/// HTTP front-end settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address.
    pub bind: SocketAddr,

    /// Request timeout in seconds for the page, asset and health routes.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            bind: defaults.bind,
            request_timeout_secs: defaults.request_timeout.as_secs(),
        }
    }
}

/// Upstream API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// Root of the reservation API.
    pub base_url: String,

    /// Per-fetch timeout in seconds.
    pub timeout_secs: u64,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: LargeScreenConfig::DEFAULT_BASE_URL.to_string(),
            timeout_secs: LargeScreenConfig::DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
        }
    }
}

/// Which courts to monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtSettings {
    /// First court id.
    pub first: u32,

    /// Last court id, inclusive.
    pub last: u32,

    /// Aggregate board id used for today.
    pub aggregate: Option<u32>,

    /// Occupancy encoding of the per-court endpoints.
    pub calendar_occupancy: CalendarOccupancy,
}

impl Default for CourtSettings {
    fn default() -> Self {
        let defaults = MonitorSettings::default();
        Self {
            first: defaults.first.get(),
            last: defaults.last.get(),
            aggregate: None,
            calendar_occupancy: CalendarOccupancy::default(),
        }
    }
}

/// Clock settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// IANA zone name, e.g. `Asia/Shanghai`. The process zone if unset.
    pub timezone: Option<String>,
}

/// Notification email settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    /// Sender address and SMTP login.
    pub from: String,

    /// SMTP password or secret reference.
    pub password: String,

    /// Recipients.
    pub to: Vec<String>,

    /// SMTP host.
    pub smtp_host: String,

    /// SMTP port; 465 uses implicit TLS, others STARTTLS.
    pub smtp_port: u16,

    /// Display name on the `From` header.
    pub sender_name: Option<String>,

    /// Subject line.
    pub subject: Option<String>,

    /// Accept invalid SMTP server certificates.
    pub accept_invalid_certs: bool,

    /// Upper bound on one send in seconds; an expired send counts as failed.
    pub timeout_secs: u64,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            from: String::new(),
            password: String::new(),
            to: Vec::new(),
            smtp_host: String::new(),
            smtp_port: SMTPS_PORT,
            sender_name: None,
            subject: None,
            accept_invalid_certs: false,
            timeout_secs: EmailConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EmailSettings {
    /// Builds the notifier configuration, resolving the password reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the password reference cannot be resolved.
    pub fn to_email_config(&self) -> ClientResult<EmailConfig> {
        let password = secret::resolve(&self.password)
            .map_err(|e| ClientError::config(format!("email.password: {}", e)))?;

        let mut config = EmailConfig::new(&self.from, password, self.to.clone(), &self.smtp_host)
            .with_port(self.smtp_port)
            .with_accept_invalid_certs(self.accept_invalid_certs)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(ref name) = self.sender_name {
            config = config.with_sender_name(name);
        }
        if let Some(ref subject) = self.subject {
            config = config.with_subject(subject);
        }
        Ok(config)
    }
}

impl AppConfig {
    /// Loads configuration from `path`, or the default path if `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error message.
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("courtwatch")
    }

    /// Checks every section without contacting the network.
    ///
    /// The password reference is not resolved here.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> ClientResult<()> {
        if self.email.from.trim().is_empty() {
            return Err(ClientError::config("email.from is required"));
        }
        if self.email.smtp_host.trim().is_empty() {
            return Err(ClientError::config("email.smtp_host is required"));
        }
        if self.email.to.is_empty() {
            return Err(ClientError::config("email.to needs at least one recipient"));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ClientError::config("upstream.timeout_secs must be positive"));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ClientError::config("server.request_timeout_secs must be positive"));
        }
        if self.email.timeout_secs == 0 {
            return Err(ClientError::config("email.timeout_secs must be positive"));
        }
        self.large_screen_config()?;
        self.clock()?;
        self.monitor_settings().validate()?;
        self.server_config(None).validate()?;
        Ok(())
    }

    /// Returns the monitor settings.
    pub fn monitor_settings(&self) -> MonitorSettings {
        let mut settings = MonitorSettings::new(self.courts.first, self.courts.last)
            .with_occupancy(self.courts.calendar_occupancy)
            .with_fetch_timeout(Duration::from_secs(self.upstream.timeout_secs))
            .with_notify_timeout(Duration::from_secs(self.email.timeout_secs));
        if let Some(aggregate) = self.courts.aggregate {
            settings = settings.with_aggregate(ResourceId(aggregate));
        }
        settings
    }

    /// Returns the HTTP front-end configuration, with an optional bind override.
    pub fn server_config(&self, bind: Option<SocketAddr>) -> ServerConfig {
        ServerConfig::new(bind.unwrap_or(self.server.bind))
            .with_request_timeout(Duration::from_secs(self.server.request_timeout_secs))
    }

    /// Returns the upstream client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `upstream.base_url` is not a usable URL.
    pub fn large_screen_config(&self) -> ClientResult<LargeScreenConfig> {
        let mut config = LargeScreenConfig::new(&self.upstream.base_url)
            .map_err(|e| {
                ClientError::config(format!(
                    "upstream.base_url {:?}: {}",
                    self.upstream.base_url, e
                ))
            })?
            .with_timeout(Duration::from_secs(self.upstream.timeout_secs));
        if !self.upstream.verify_tls {
            config = config.with_insecure_tls();
        }
        Ok(config)
    }

    /// Returns the monitor clock.
    ///
    /// # Errors
    ///
    /// Returns an error if `clock.timezone` is not a known zone.
    pub fn clock(&self) -> ClientResult<MonitorClock> {
        MonitorClock::from_timezone(self.clock.timezone.as_deref())
            .map_err(|e| ClientError::config(format!("clock.timezone: {}", e)))
    }
}
