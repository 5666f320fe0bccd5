//! Slot evaluation.
//!
//! Turns a [`NormalizedSchedule`] into the human-readable lines shown to
//! users and used for change detection. Slots that have already started are
//! dropped, as are slots whose label carries no parseable start time.

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::slot::{NormalizedSchedule, TimeSlot};
use crate::time::DayBucket;

/// Formats one availability line, e.g. `【今天】Court A 20:00-21:00`.
pub fn format_line(day: &DayBucket, court: &str, label: &str) -> String {
    format!("【{}】{} {}", day.label(), court, label)
}

/// Evaluates a schedule against `now` and returns the free, not-yet-started slots.
///
/// Output order is court order × slot order, both as published upstream.
pub fn evaluate(schedule: &NormalizedSchedule, day: &DayBucket, now: NaiveDateTime) -> Vec<String> {
    let upcoming: Vec<&TimeSlot> = schedule
        .time_slots
        .iter()
        .filter(|slot| match slot.start_time() {
            Some(start) => day.date().and_time(start) > now,
            None => {
                debug!(
                    resource = %schedule.resource,
                    slot = slot.id,
                    label = %slot.label,
                    "Skipping slot without a parseable start time"
                );
                false
            }
        })
        .collect();

    let mut lines = Vec::new();
    for court in &schedule.courts {
        for slot in &upcoming {
            if court.availability(slot.id).is_some_and(|a| a.free) {
                lines.push(format_line(day, &court.name, &slot.label));
            }
        }
    }

    trace!(
        resource = %schedule.resource,
        day = %day,
        upcoming = upcoming.len(),
        count = lines.len(),
        "Evaluated schedule"
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{CanonicalAvailability, CourtSchedule, ResourceId};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn schedule() -> NormalizedSchedule {
        NormalizedSchedule::new(
            ResourceId(1294),
            vec![
                TimeSlot::new(1, "18:00-19:00"),
                TimeSlot::new(2, "19:00-20:00"),
                TimeSlot::new(3, "20:00-21:00"),
            ],
            vec![
                CourtSchedule::new("场地ID 1")
                    .with_slot(1, CanonicalAvailability::FREE)
                    .with_slot(2, CanonicalAvailability::FREE)
                    .with_slot(3, CanonicalAvailability::OCCUPIED),
            ],
        )
    }

    #[test]
    fn formats_line() {
        assert_eq!(
            format_line(&DayBucket::Today(day()), "Court A", "20:00-21:00"),
            "【今天】Court A 20:00-21:00"
        );
    }

    #[test]
    fn excludes_started_slots() {
        let lines = evaluate(&schedule(), &DayBucket::Today(day()), at(18, 30));
        assert_eq!(lines, vec!["【今天】场地ID 1 19:00-20:00"]);
    }

    #[test]
    fn slot_starting_now_is_excluded() {
        let lines = evaluate(&schedule(), &DayBucket::Today(day()), at(19, 0));
        assert!(lines.is_empty());
    }

    #[test]
    fn includes_free_future_slots() {
        let lines = evaluate(&schedule(), &DayBucket::Today(day()), at(8, 0));
        assert_eq!(
            lines,
            vec!["【今天】场地ID 1 18:00-19:00", "【今天】场地ID 1 19:00-20:00"]
        );
    }

    #[test]
    fn tomorrow_slots_survive_late_evening() {
        let tomorrow = day().succ_opt().unwrap();
        let lines = evaluate(&schedule(), &DayBucket::Tomorrow(tomorrow), at(23, 0));
        assert_eq!(
            lines,
            vec!["【明天】场地ID 1 18:00-19:00", "【明天】场地ID 1 19:00-20:00"]
        );
    }

    #[test]
    fn drops_unparseable_labels() {
        let mut schedule = schedule();
        schedule.time_slots.insert(0, TimeSlot::new(9, "待定"));
        schedule.courts[0].slots.push((9, CanonicalAvailability::FREE));

        let lines = evaluate(&schedule, &DayBucket::Today(day()), at(8, 0));
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| !l.contains("待定")));
    }

    #[test]
    fn preserves_court_major_order() {
        let schedule = NormalizedSchedule::new(
            ResourceId(1293),
            vec![TimeSlot::new(1, "10:00-11:00"), TimeSlot::new(2, "11:00-12:00")],
            vec![
                CourtSchedule::new("B")
                    .with_slot(2, CanonicalAvailability::FREE)
                    .with_slot(1, CanonicalAvailability::FREE),
                CourtSchedule::new("A").with_slot(1, CanonicalAvailability::FREE),
            ],
        );

        let lines = evaluate(&schedule, &DayBucket::Other(day()), at(9, 0));
        assert_eq!(
            lines,
            vec![
                "【2025-05-20】B 10:00-11:00",
                "【2025-05-20】B 11:00-12:00",
                "【2025-05-20】A 10:00-11:00",
            ]
        );
    }

    #[test]
    fn slot_missing_from_court_data_is_not_free() {
        let mut schedule = schedule();
        schedule.courts[0].slots.retain(|(id, _)| *id != 2);

        let lines = evaluate(&schedule, &DayBucket::Today(day()), at(8, 0));
        assert_eq!(lines, vec!["【今天】场地ID 1 18:00-19:00"]);
    }
}
