//! The poll pipeline.
//!
//! One [`Monitor::poll`] runs fetch, normalize, evaluate, detect, notify and
//! commit. Every planned fetch runs concurrently under its own timeout; a
//! failing resource contributes no lines and never fails the poll. Change
//! detection only runs when every fetch succeeded, so a transient upstream
//! failure can neither trigger nor suppress a notification.
//!
//! Polls are single-flight: the change-detector lock is taken before the
//! first fetch and held until the summary is committed. Callers that may be
//! cancelled (HTTP handlers) go through [`Monitor::poll_detached`], so a sent
//! notification is always followed by its commit.

use std::sync::Arc;

use chrono::NaiveDateTime;
use courtwatch_core::{DayBucket, MonitorClock, ResourceId, evaluate};
use courtwatch_providers::{EndpointRole, ProviderError, ScheduleSource, normalize};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::change::{SharedChangeDetector, new_change_detector, summary, summary_digest};
use crate::config::{MonitorSettings, PlannedFetch};
use crate::notify::{Notifier, NotifyError, NotifyResult};

/// The result of one (resource, day) pair within a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOutcome {
    /// What the endpoint represents.
    pub role: EndpointRole,
    /// The endpoint id.
    pub resource: ResourceId,
    /// The day evaluated.
    pub day: DayBucket,
    /// Free lines, or the reason the resource was skipped.
    pub result: Result<Vec<String>, String>,
}

/// Everything one poll produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Free slots today, in plan order.
    pub today: Vec<String>,
    /// Free slots tomorrow, in plan order.
    pub tomorrow: Vec<String>,
    /// Per-resource outcomes, in plan order.
    pub outcomes: Vec<ResourceOutcome>,
    /// True if every fetch succeeded.
    pub complete: bool,
    /// True if a notification was delivered.
    pub notified: bool,
}

impl PollReport {
    /// A report with no slots, for a poll that never finished.
    fn aborted() -> Self {
        Self {
            today: Vec::new(),
            tomorrow: Vec::new(),
            outcomes: Vec::new(),
            complete: false,
            notified: false,
        }
    }

    /// Returns the outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Returns the wire form served by `/api/status`.
    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            today_available: self.today.clone(),
            tomorrow_available: self.tomorrow.clone(),
        }
    }
}

/// The `/api/status` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    /// Free slots today.
    pub today_available: Vec<String>,
    /// Free slots tomorrow.
    pub tomorrow_available: Vec<String>,
}

/// Polls upstream and notifies on change.
pub struct Monitor {
    source: Arc<dyn ScheduleSource>,
    notifier: Arc<dyn Notifier>,
    settings: MonitorSettings,
    clock: MonitorClock,
    detector: SharedChangeDetector,
}

impl Monitor {
    /// Creates a monitor with a fresh change detector.
    pub fn new(
        source: Arc<dyn ScheduleSource>,
        notifier: Arc<dyn Notifier>,
        settings: MonitorSettings,
        clock: MonitorClock,
    ) -> Self {
        Self {
            source,
            notifier,
            settings,
            clock,
            detector: new_change_detector(),
        }
    }

    /// Builder: share an existing change detector.
    pub fn with_detector(mut self, detector: SharedChangeDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Returns the change detector.
    pub fn detector(&self) -> SharedChangeDetector {
        self.detector.clone()
    }

    /// Returns the settings.
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Runs one poll at the clock's current time.
    pub async fn poll(&self) -> PollReport {
        self.poll_at(self.clock.now()).await
    }

    /// Runs one poll on its own task.
    ///
    /// Dropping the returned future does not cancel the poll; it runs to its
    /// commit in the background.
    pub async fn poll_detached(self: Arc<Self>) -> PollReport {
        match tokio::spawn(async move { self.poll().await }).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Poll task failed");
                PollReport::aborted()
            }
        }
    }

    /// Runs one poll as if the local time were `now`.
    pub async fn poll_at(&self, now: NaiveDateTime) -> PollReport {
        let span = info_span!("poll", %now, source = self.source.name());
        self.run(now).instrument(span).await
    }

    async fn run(&self, now: NaiveDateTime) -> PollReport {
        let mut detector = self.detector.lock().await;

        let (today, tomorrow) = MonitorClock::buckets_at(now);
        let plan = self.settings.plan(today, tomorrow);
        debug!(fetches = plan.len(), "Starting poll");

        let outcomes: Vec<ResourceOutcome> =
            join_all(plan.into_iter().map(|planned| self.fetch_planned(planned, now)))
                .await
                .into_iter()
                .flatten()
                .collect();

        let mut today_lines = Vec::new();
        let mut tomorrow_lines = Vec::new();
        for outcome in &outcomes {
            if let Ok(lines) = &outcome.result {
                if outcome.day == today {
                    today_lines.extend(lines.iter().cloned());
                } else {
                    tomorrow_lines.extend(lines.iter().cloned());
                }
            }
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        let complete = failed == 0;
        let mut notified = false;

        if complete {
            let current = summary(&today_lines, &tomorrow_lines);
            if detector.should_notify(&current) {
                info!(
                    digest = %summary_digest(&current),
                    today = today_lines.len(),
                    tomorrow = tomorrow_lines.len(),
                    notifier = self.notifier.name(),
                    "Availability changed"
                );
                match self.send(&today_lines, &tomorrow_lines).await {
                    Ok(()) => notified = true,
                    Err(e) => error!(error = %e, "Failed to send notification"),
                }
                detector.commit(current);
            } else {
                debug!(count = today_lines.len() + tomorrow_lines.len(), "No change");
            }
        } else {
            warn!(
                failed,
                total = outcomes.len(),
                "Incomplete poll, skipping change detection"
            );
        }

        PollReport {
            today: today_lines,
            tomorrow: tomorrow_lines,
            outcomes,
            complete,
            notified,
        }
    }

    async fn send(&self, today: &[String], tomorrow: &[String]) -> NotifyResult<()> {
        let timeout = self.settings.notify_timeout;
        tokio::time::timeout(timeout, self.notifier.notify(today, tomorrow))
            .await
            .unwrap_or(Err(NotifyError::Timeout(timeout)))
    }

    /// Fetches one endpoint and evaluates it for each planned day.
    async fn fetch_planned(&self, planned: PlannedFetch, now: NaiveDateTime) -> Vec<ResourceOutcome> {
        let PlannedFetch { request, days } = planned;
        let timeout = self.settings.fetch_timeout;

        let result = match tokio::time::timeout(timeout, self.source.fetch(request.clone())).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(format!(
                "No response within {}s",
                timeout.as_secs()
            ))
            .with_resource(request.resource)),
        };

        match result {
            Ok(raw) => days
                .into_iter()
                .map(|day| {
                    let schedule = normalize(&raw, day.date(), &request);
                    let lines = evaluate(&schedule, &day, now);
                    debug!(resource = %request.resource, %day, count = lines.len(), "Evaluated");
                    ResourceOutcome {
                        role: request.role,
                        resource: request.resource,
                        day,
                        result: Ok(lines),
                    }
                })
                .collect(),
            Err(e) => {
                warn!(resource = %request.resource, error = %e, "Skipping resource");
                let reason = e.to_string();
                days.into_iter()
                    .map(|day| ResourceOutcome {
                        role: request.role,
                        resource: request.resource,
                        day,
                        result: Err(reason.clone()),
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use courtwatch_providers::{
        BoxFuture, FetchRequest, FixtureSource, ProviderErrorCode, ProviderResult, RawPayload,
    };

    use super::*;
    use crate::notify::RecordingNotifier;

    const AGGREGATE: ResourceId = ResourceId(1293);

    fn now_at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn flat_body(occupy: bool) -> String {
        format!(
            r#"{{"d": {{
                "time": [{{"id": 5, "strTime": "20:00-21:00"}}],
                "resource": [{{"id": 1, "name": "Court A"}}],
                "data": {{"1": {{"5": {{"occupy": {}}}}}}}
            }}}}"#,
            occupy
        )
    }

    /// A calendar body publishing one free 19:00 slot on 2025-05-21.
    fn tomorrow_free_body() -> &'static str {
        r#"{"d": {
            "time": [{"id": 3, "str_time": "19:00-20:00"}],
            "day": ["2025-05-20", "2025-05-21"],
            "data": {"2025-05-20": {"3": {"occupy": true}}, "2025-05-21": {"3": {"occupy": false}}}
        }}"#
    }

    fn empty_calendar_body() -> &'static str {
        r#"{"d": {"time": [{"id": 3, "str_time": "19:00-20:00"}], "day": [], "data": {}}}"#
    }

    fn monitor(source: FixtureSource, settings: MonitorSettings) -> (Monitor, RecordingNotifier) {
        let notifier = RecordingNotifier::new();
        let monitor = Monitor::new(
            Arc::new(source),
            Arc::new(notifier.clone()),
            settings,
            MonitorClock::Local,
        );
        (monitor, notifier)
    }

    fn single_court_with_aggregate() -> MonitorSettings {
        MonitorSettings::new(1294, 1294).with_aggregate(AGGREGATE)
    }

    #[tokio::test]
    async fn free_aggregate_slot_is_reported_for_today() {
        let source = FixtureSource::new()
            .with_body(AGGREGATE, flat_body(false))
            .with_body(ResourceId(1294), empty_calendar_body());
        let (monitor, _) = monitor(source, single_court_with_aggregate());

        let report = monitor.poll_at(now_at(19, 0)).await;

        assert_eq!(report.today, vec!["【今天】Court A 20:00-21:00"]);
        assert!(report.tomorrow.is_empty());
        assert!(report.complete);
    }

    #[tokio::test]
    async fn occupied_aggregate_slot_is_not_reported() {
        let source = FixtureSource::new()
            .with_body(AGGREGATE, flat_body(true))
            .with_body(ResourceId(1294), empty_calendar_body());
        let (monitor, notifier) = monitor(source, single_court_with_aggregate());

        let report = monitor.poll_at(now_at(19, 0)).await;

        assert!(report.today.is_empty());
        assert!(!report.notified);
        assert!(notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn started_slots_are_dropped() {
        let source = FixtureSource::new()
            .with_body(AGGREGATE, flat_body(false))
            .with_body(ResourceId(1294), empty_calendar_body());
        let (monitor, _) = monitor(source, single_court_with_aggregate());

        let report = monitor.poll_at(now_at(20, 0)).await;
        assert!(report.today.is_empty());
    }

    #[tokio::test]
    async fn identical_polls_notify_once() {
        let source = FixtureSource::new()
            .with_body(AGGREGATE, flat_body(false))
            .with_body(ResourceId(1294), empty_calendar_body());
        let (monitor, notifier) = monitor(source, single_court_with_aggregate());

        let first = monitor.poll_at(now_at(19, 0)).await;
        let second = monitor.poll_at(now_at(19, 1)).await;

        assert!(first.notified);
        assert!(!second.notified);
        assert_eq!(second.today, first.today);
        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, vec!["【今天】Court A 20:00-21:00"]);
        assert_eq!(
            monitor.detector().lock().await.last_summary(),
            "【今天】Court A 20:00-21:00"
        );
    }

    #[tokio::test]
    async fn one_failing_court_does_not_hide_the_others() {
        let mut source = FixtureSource::new();
        for id in 1294..=1303 {
            source = source.with_body(ResourceId(id), tomorrow_free_body());
        }
        let source = source.with_failure(
            ResourceId(1298),
            ProviderErrorCode::ServerError,
            "502 Bad Gateway",
        );
        let (monitor, notifier) = monitor(source, MonitorSettings::default());

        let report = monitor.poll_at(now_at(12, 0)).await;

        assert!(report.today.is_empty());
        assert_eq!(report.tomorrow.len(), 9);
        assert!(!report.tomorrow.contains(&"【明天】场地ID 5 19:00-20:00".to_string()));
        assert_eq!(report.tomorrow[0], "【明天】场地ID 1 19:00-20:00");
        assert_eq!(report.tomorrow[8], "【明天】场地ID 10 19:00-20:00");

        let mut deduped = report.tomorrow.clone();
        deduped.dedup();
        assert_eq!(deduped, report.tomorrow);

        assert!(!report.complete);
        assert_eq!(report.failures().count(), 2);
        assert!(report
            .failures()
            .all(|o| o.resource == ResourceId(1298)));
        assert!(!report.notified);
        assert!(notifier.sent().await.is_empty());
        assert_eq!(monitor.detector().lock().await.last_summary(), "");
    }

    #[tokio::test]
    async fn court_endpoints_serve_both_days_without_aggregate() {
        let source = FixtureSource::new().with_body(
            ResourceId(1294),
            r#"{"d": {
                "time": [{"id": 3, "str_time": "19:00-20:00"}],
                "data": {"2025-05-20": {"3": {"occupy": false}}, "2025-05-21": {"3": {"occupy": false}}}
            }}"#,
        );
        let (monitor, notifier) = monitor(source, MonitorSettings::new(1294, 1294));

        let report = monitor.poll_at(now_at(8, 0)).await;

        assert_eq!(report.today, vec!["【今天】场地ID 1 19:00-20:00"]);
        assert_eq!(report.tomorrow, vec!["【明天】场地ID 1 19:00-20:00"]);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(
            notifier.sent().await,
            vec![(report.today.clone(), report.tomorrow.clone())]
        );
    }

    #[tokio::test]
    async fn failed_send_still_commits() {
        let source = FixtureSource::new()
            .with_body(AGGREGATE, flat_body(false))
            .with_body(ResourceId(1294), empty_calendar_body());
        let notifier = RecordingNotifier::failing();
        let monitor = Monitor::new(
            Arc::new(source),
            Arc::new(notifier.clone()),
            single_court_with_aggregate(),
            MonitorClock::Local,
        );

        let first = monitor.poll_at(now_at(19, 0)).await;
        let second = monitor.poll_at(now_at(19, 0)).await;

        assert!(!first.notified);
        assert!(!second.notified);
        assert_eq!(notifier.sent().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_send_is_bounded_and_committed() {
        let source = FixtureSource::new()
            .with_body(AGGREGATE, flat_body(false))
            .with_body(ResourceId(1294), empty_calendar_body());
        let notifier = RecordingNotifier::new().with_delay(Duration::from_secs(45));
        let monitor = Monitor::new(
            Arc::new(source),
            Arc::new(notifier.clone()),
            single_court_with_aggregate().with_notify_timeout(Duration::from_secs(5)),
            MonitorClock::Local,
        );

        let started = tokio::time::Instant::now();
        let first = monitor.poll_at(now_at(19, 0)).await;
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(!first.notified);

        let second = monitor.poll_at(now_at(19, 0)).await;
        assert!(!second.notified);
        assert_eq!(notifier.sent().await.len(), 1);
    }

    /// A calendar body with one free 19:00 slot on the real tomorrow, for
    /// polls that read the wall clock.
    fn free_tomorrow_by_wall_clock() -> String {
        let tomorrow = MonitorClock::Local.now().date().succ_opt().unwrap();
        format!(
            r#"{{"d": {{"time": [{{"id": 3, "str_time": "19:00-20:00"}}], "data": {{"{}": {{"3": {{"occupy": false}}}}}}}}}}"#,
            tomorrow.format("%Y-%m-%d")
        )
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_caller_does_not_cancel_commit() {
        let source = FixtureSource::new().with_body(ResourceId(1294), free_tomorrow_by_wall_clock());
        let notifier = RecordingNotifier::new().with_delay(Duration::from_secs(3));
        let monitor = Arc::new(Monitor::new(
            Arc::new(source),
            Arc::new(notifier.clone()),
            MonitorSettings::new(1294, 1294),
            MonitorClock::Local,
        ));

        let caller = tokio::time::timeout(Duration::from_secs(1), monitor.clone().poll_detached());
        assert!(caller.await.is_err());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(notifier.sent().await.len(), 1);
        assert_eq!(
            monitor.detector().lock().await.last_summary(),
            "【明天】场地ID 1 19:00-20:00"
        );
    }

    struct StalledSource;

    impl ScheduleSource for StalledSource {
        fn name(&self) -> &str {
            "stalled"
        }

        fn fetch(&self, _request: FetchRequest) -> BoxFuture<'_, ProviderResult<RawPayload>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::internal("unreachable"))
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_fetch_times_out() {
        let monitor = Monitor::new(
            Arc::new(StalledSource),
            Arc::new(RecordingNotifier::new()),
            MonitorSettings::new(1294, 1294).with_fetch_timeout(Duration::from_secs(2)),
            MonitorClock::Local,
        );

        let report = monitor.poll_at(now_at(8, 0)).await;

        assert!(!report.complete);
        assert_eq!(report.failures().count(), 2);
        let reason = report.outcomes[0].result.as_ref().unwrap_err();
        assert!(reason.contains("timeout"));
    }

    #[test]
    fn status_uses_wire_names() {
        let report = PollReport {
            today: vec!["a".to_string()],
            tomorrow: vec![],
            outcomes: vec![],
            complete: true,
            notified: false,
        };
        let json = serde_json::to_value(report.status()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"today_available": ["a"], "tomorrow_available": []})
        );
    }
}
