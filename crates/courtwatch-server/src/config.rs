//! Monitor and HTTP front-end configuration.

use std::net::SocketAddr;
use std::time::Duration;

use courtwatch_core::{DayBucket, ResourceId};
use courtwatch_providers::{CalendarOccupancy, FetchRequest};

use crate::error::{ServerError, ServerResult};

/// Which endpoints a poll reads, and how.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// First individually bookable court id.
    pub first: ResourceId,

    /// Last individually bookable court id, inclusive.
    pub last: ResourceId,

    /// Optional aggregate board, used for today only.
    pub aggregate: Option<ResourceId>,

    /// Occupancy encoding of the per-court calendar endpoints.
    pub occupancy: CalendarOccupancy,

    /// Upper bound on one fetch, decode included.
    pub fetch_timeout: Duration,

    /// Upper bound on one notification; an expired send counts as failed.
    pub notify_timeout: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            first: ResourceId(1294),
            last: ResourceId(1303),
            aggregate: None,
            occupancy: CalendarOccupancy::Flag,
            fetch_timeout: Duration::from_secs(10),
            notify_timeout: Duration::from_secs(20),
        }
    }
}

/// One endpoint to fetch during a poll and the days its payload serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFetch {
    /// The upstream request.
    pub request: FetchRequest,
    /// Day buckets evaluated from the payload, in order.
    pub days: Vec<DayBucket>,
}

impl MonitorSettings {
    /// Creates settings for the inclusive court range `first..=last`.
    pub fn new(first: impl Into<ResourceId>, last: impl Into<ResourceId>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
            ..Default::default()
        }
    }

    /// Builder: read today from the aggregate board.
    pub fn with_aggregate(mut self, aggregate: impl Into<ResourceId>) -> Self {
        self.aggregate = Some(aggregate.into());
        self
    }

    /// Builder: set the calendar occupancy encoding.
    pub fn with_occupancy(mut self, occupancy: CalendarOccupancy) -> Self {
        self.occupancy = occupancy;
        self
    }

    /// Builder: set the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Builder: set the notification timeout.
    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    /// Returns the court ids in iteration order.
    pub fn courts(&self) -> impl Iterator<Item = ResourceId> {
        (self.first.get()..=self.last.get()).map(ResourceId)
    }

    /// Returns the display name of a court: its 1-based position in the range.
    pub fn court_label(&self, resource: ResourceId) -> String {
        format!(
            "场地ID {}",
            resource.get().saturating_sub(self.first.get()) + 1
        )
    }

    /// Checks the range and aggregate id for consistency.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty range, an aggregate id
    /// that is also a court id, or a zero timeout.
    pub fn validate(&self) -> ServerResult<()> {
        if self.first > self.last {
            return Err(ServerError::config(format!(
                "court range is empty: first {} > last {}",
                self.first, self.last
            )));
        }
        if let Some(aggregate) = self.aggregate {
            if (self.first..=self.last).contains(&aggregate) {
                return Err(ServerError::config(format!(
                    "aggregate id {} lies inside the court range {}..={}",
                    aggregate, self.first, self.last
                )));
            }
        }
        if self.fetch_timeout.is_zero() {
            return Err(ServerError::config("fetch timeout must be positive"));
        }
        if self.notify_timeout.is_zero() {
            return Err(ServerError::config("notify timeout must be positive"));
        }
        Ok(())
    }

    /// Builds the fetch plan for one poll.
    ///
    /// With an aggregate board, today comes from the board and every court
    /// endpoint is read for tomorrow only. Without one, each court endpoint
    /// serves both days from a single fetch.
    pub fn plan(&self, today: DayBucket, tomorrow: DayBucket) -> Vec<PlannedFetch> {
        let mut plan = Vec::new();
        let court_days = match self.aggregate {
            Some(aggregate) => {
                plan.push(PlannedFetch {
                    request: FetchRequest::aggregate(aggregate),
                    days: vec![today],
                });
                vec![tomorrow]
            }
            None => vec![today, tomorrow],
        };

        plan.extend(self.courts().map(|court| PlannedFetch {
            request: FetchRequest::court(court, self.occupancy, self.court_label(court)),
            days: court_days.clone(),
        }));
        plan
    }
}

/// HTTP front-end configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub bind: SocketAddr,

    /// Upper bound on one request to the page, asset and health routes.
    ///
    /// `/api/status` is not covered: a poll is bounded by its own fetch and
    /// notify timeouts and always answers.
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Creates a configuration listening on `bind`.
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            ..Default::default()
        }
    }

    /// Builder: set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Rejects a zero request timeout, which would fail every request.
    ///
    /// # Errors
    ///
    /// Returns a configuration error.
    pub fn validate(&self) -> ServerResult<()> {
        if self.request_timeout.is_zero() {
            return Err(ServerError::config("request timeout must be positive"));
        }
        Ok(())
    }
}
