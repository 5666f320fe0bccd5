//! Large-screen client configuration.

use std::time::Duration;

use courtwatch_core::ResourceId;
use url::Url;

/// Configuration for the large-screen reservation API.
#[derive(Debug, Clone)]
pub struct LargeScreenConfig {
    /// Root of the reservation API; endpoints live under `resource/`.
    pub base_url: Url,

    /// Per-request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
}

impl LargeScreenConfig {
    /// Public root of the campus reservation API.
    pub const DEFAULT_BASE_URL: &'static str = "https://workflow.cuc.edu.cn/reservation/api";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Creates a configuration for the given API root.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or cannot carry a path
    /// (e.g. `mailto:`).
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(base_url.as_ref())?;
        if parsed.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        Ok(Self {
            base_url: parsed,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("courtwatch/{}", env!("CARGO_PKG_VERSION")),
            verify_tls: true,
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Disables TLS verification.
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Returns the `large-screen` URL serving `resource`.
    ///
    /// Any query string on the base URL is dropped.
    pub fn endpoint_url(&self, resource: ResourceId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["resource", "large-screen"]);
        }
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("id", &resource.to_string());
        url
    }
}

impl Default for LargeScreenConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(Self::DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("courtwatch/{}", env!("CARGO_PKG_VERSION")),
            verify_tls: true,
        }
    }
}
