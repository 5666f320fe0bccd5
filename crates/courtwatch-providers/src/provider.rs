//! ScheduleSource trait definition.
//!
//! A [`ScheduleSource`] turns a [`FetchRequest`] into a decoded
//! [`RawPayload`]. The production implementation talks HTTP to the
//! reservation backend; `FixtureSource` (feature `test-util`) serves canned
//! bodies to tests.

#[cfg(any(test, feature = "test-util"))]
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use courtwatch_core::ResourceId;
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;
#[cfg(any(test, feature = "test-util"))]
use crate::error::{ProviderError, ProviderErrorCode};
use crate::raw_payload::RawPayload;

/// What an upstream endpoint represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    /// The combined board listing every court for the current day.
    Aggregate,
    /// A single bookable court over several days.
    Court,
}

impl EndpointRole {
    /// Returns a stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::Court => "court",
        }
    }
}

/// How per-court calendar endpoints encode occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarOccupancy {
    /// `{occupy: bool}`.
    #[default]
    Flag,
    /// `{username: string | null}`.
    Username,
}

/// The payload shape an endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadVariant {
    /// Aggregate board shape.
    Flat,
    /// Calendar shape with occupancy flags.
    CalendarFlag,
    /// Calendar shape with nullable usernames.
    CalendarUsername,
}

impl PayloadVariant {
    /// Picks the variant served by an endpoint of the given role.
    pub fn for_role(role: EndpointRole, occupancy: CalendarOccupancy) -> Self {
        match (role, occupancy) {
            (EndpointRole::Aggregate, _) => Self::Flat,
            (EndpointRole::Court, CalendarOccupancy::Flag) => Self::CalendarFlag,
            (EndpointRole::Court, CalendarOccupancy::Username) => Self::CalendarUsername,
        }
    }
}

/// One upstream fetch to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Endpoint id.
    pub resource: ResourceId,
    /// What the endpoint represents.
    pub role: EndpointRole,
    /// Shape to decode the body as.
    pub variant: PayloadVariant,
    /// Display name for the court; unused for aggregate endpoints, which
    /// carry their own court names.
    pub label: String,
}

impl FetchRequest {
    /// Creates a request for the aggregate board.
    pub fn aggregate(resource: ResourceId) -> Self {
        Self {
            resource,
            role: EndpointRole::Aggregate,
            variant: PayloadVariant::Flat,
            label: String::new(),
        }
    }

    /// Creates a request for a single court.
    pub fn court(
        resource: ResourceId,
        occupancy: CalendarOccupancy,
        label: impl Into<String>,
    ) -> Self {
        Self {
            resource,
            role: EndpointRole::Court,
            variant: PayloadVariant::for_role(EndpointRole::Court, occupancy),
            label: label.into(),
        }
    }
}

/// A boxed future for async trait methods.
///
/// Keeps [`ScheduleSource`] object-safe so the monitor can hold a
/// `Box<dyn ScheduleSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The abstraction over the upstream reservation API.
///
/// Implementations must be `Send + Sync`; the monitor issues all fetches of a
/// poll concurrently against one shared source.
pub trait ScheduleSource: Send + Sync {
    /// Returns a short name for logs (e.g. "large-screen").
    fn name(&self) -> &str;

    /// Fetches and decodes one endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on transport failures, non-success statuses and
    /// undecodable bodies.
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, ProviderResult<RawPayload>>;
}

#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone)]
enum Fixture {
    Body(String),
    Failure(ProviderErrorCode, String),
}

/// A source serving canned response bodies.
///
/// Unknown resources answer with a `NotFound` error.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    fixtures: HashMap<ResourceId, Fixture>,
}

#[cfg(any(test, feature = "test-util"))]
impl FixtureSource {
    /// Creates an empty fixture source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to serve `body` for `resource`.
    pub fn with_body(mut self, resource: ResourceId, body: impl Into<String>) -> Self {
        self.fixtures.insert(resource, Fixture::Body(body.into()));
        self
    }

    /// Builder method to fail every fetch of `resource`.
    pub fn with_failure(
        mut self,
        resource: ResourceId,
        code: ProviderErrorCode,
        message: impl Into<String>,
    ) -> Self {
        self.fixtures
            .insert(resource, Fixture::Failure(code, message.into()));
        self
    }
}

#[cfg(any(test, feature = "test-util"))]
impl ScheduleSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, ProviderResult<RawPayload>> {
        let result = match self.fixtures.get(&request.resource) {
            Some(Fixture::Body(body)) => RawPayload::decode(request.variant, body),
            Some(Fixture::Failure(code, message)) => Err(ProviderError::new(*code, message.clone())),
            None => Err(ProviderError::not_found("no fixture for resource")),
        }
        .map_err(|e| e.with_resource(request.resource));
        Box::pin(async move { result })
    }
}
