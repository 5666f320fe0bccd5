//! HTTP client for the large-screen endpoint.

use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument, trace, warn};

use super::config::LargeScreenConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, FetchRequest, ScheduleSource};
use crate::raw_payload::RawPayload;

/// Longest body excerpt carried into error messages.
const BODY_EXCERPT_LEN: usize = 200;

/// Client for the reservation backend's large-screen API.
#[derive(Debug, Clone)]
pub struct LargeScreenClient {
    client: Client,
    config: LargeScreenConfig,
}

impl LargeScreenClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: LargeScreenConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("Failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &LargeScreenConfig {
        &self.config
    }

    /// Fetches the raw body served for one request.
    #[instrument(skip(self), fields(resource = %request.resource, role = request.role.as_str()))]
    async fn fetch_body(&self, request: &FetchRequest) -> ProviderResult<String> {
        let url = self.config.endpoint_url(request.resource);
        debug!(url = %url, "Fetching schedule");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::timeout(format!(
                    "No response within {}s",
                    self.config.timeout.as_secs()
                ))
            } else if e.is_connect() {
                ProviderError::network(format!("Connection failed: {}", e)).with_source(e)
            } else {
                ProviderError::network(format!("Request failed: {}", e)).with_source(e)
            }
        })?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: Response) -> ProviderResult<String> {
        let status = response.status();
        trace!(status = %status, "Received response");

        if status.is_success() {
            return response.text().await.map_err(|e| {
                if e.is_timeout() {
                    ProviderError::timeout("Timed out reading response body")
                } else {
                    ProviderError::network(format!("Failed to read response: {}", e))
                        .with_source(e)
                }
            });
        }

        let body = response.text().await.unwrap_or_default();
        let err = status_error(status, &body);
        warn!(status = %status, "Unexpected response status");
        Err(err)
    }
}

/// Maps a non-success status to a provider error.
fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    match status {
        StatusCode::NOT_FOUND => ProviderError::not_found("Resource not found"),
        s if s.is_server_error() => {
            ProviderError::server(format!("Server error ({}): {}", s, excerpt))
        }
        s => ProviderError::bad_status(format!("Unexpected status {}: {}", s, excerpt)),
    }
}

impl ScheduleSource for LargeScreenClient {
    fn name(&self) -> &str {
        "large-screen"
    }

    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, ProviderResult<RawPayload>> {
        Box::pin(async move {
            let body = self
                .fetch_body(&request)
                .await
                .map_err(|e| e.with_resource(request.resource))?;
            RawPayload::decode(request.variant, &body).map_err(|e| e.with_resource(request.resource))
        })
    }
}
