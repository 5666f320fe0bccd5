//! Error types for schedule fetching and decoding.
//!
//! Every failure on the way from the upstream API to a [`RawPayload`] is a
//! [`ProviderError`]. The monitor never aborts a poll on one; the failing
//! resource simply contributes no slots for that cycle.
//!
//! [`RawPayload`]: crate::raw_payload::RawPayload

use std::fmt;

use courtwatch_core::ResourceId;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Connection failed, DNS resolution, TLS handshake, reset.
    NetworkError,
    /// The request did not complete within the configured bound.
    Timeout,
    /// Upstream answered with a 5xx status.
    ServerError,
    /// Upstream answered 404.
    NotFound,
    /// Upstream answered with another non-success status.
    BadStatus,
    /// The body was not JSON of the expected shape.
    InvalidResponse,
    /// Missing or invalid client configuration.
    ConfigurationError,
    /// Unexpected state, bug.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if the failure happened while talking to upstream,
    /// as opposed to while decoding what it sent.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::Timeout | Self::ServerError | Self::NotFound | Self::BadStatus
        )
    }

    /// Returns a stable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::ServerError => "server_error",
            Self::NotFound => "not_found",
            Self::BadStatus => "bad_status",
            Self::InvalidResponse => "invalid_response",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while fetching or decoding one resource.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The resource being fetched, when known.
    resource: Option<ResourceId>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            resource: None,
            source: None,
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Timeout, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates an unexpected-status error.
    pub fn bad_status(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadStatus, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the resource this error belongs to.
    pub fn with_resource(mut self, resource: ResourceId) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the resource, if set.
    pub fn resource(&self) -> Option<ResourceId> {
        self.resource
    }

    /// Returns true if the body could not be decoded.
    pub fn is_decode(&self) -> bool {
        self.code == ProviderErrorCode::InvalidResponse
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(resource) = self.resource {
            write!(f, "[resource {}] ", resource)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_codes() {
        assert!(ProviderErrorCode::NetworkError.is_transport());
        assert!(ProviderErrorCode::Timeout.is_transport());
        assert!(ProviderErrorCode::ServerError.is_transport());
        assert!(!ProviderErrorCode::InvalidResponse.is_transport());
        assert!(!ProviderErrorCode::ConfigurationError.is_transport());
    }

    #[test]
    fn error_creation() {
        let err = ProviderError::invalid_response("expected object");
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
        assert_eq!(err.message(), "expected object");
        assert!(err.resource().is_none());
        assert!(err.is_decode());
    }

    #[test]
    fn display_includes_resource() {
        let err = ProviderError::timeout("no answer after 10s").with_resource(ResourceId(1297));
        let display = err.to_string();
        assert_eq!(display, "[resource 1297] timeout: no answer after 10s");
    }

    #[test]
    fn error_with_source() {
        use std::error::Error;
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = ProviderError::invalid_response("bad body").with_source(json_err);
        assert!(err.source().is_some());
    }
}
