//! RawPayload to NormalizedSchedule conversion.
//!
//! Every payload variant maps through its own adapter into the canonical
//! [`NormalizedSchedule`]:
//!
//! 1. The `time` list becomes [`TimeSlot`]s, order preserved
//! 2. Courts are enumerated in upstream order (the board's `resource` list
//!    for the flat shape, the single requested court for calendar shapes)
//! 3. Each court/slot entry becomes a [`CanonicalAvailability`]
//!
//! A slot with no entry in the data map is left out of the court's schedule.

use std::collections::HashMap;

use chrono::NaiveDate;
use courtwatch_core::{
    CanonicalAvailability, CourtSchedule, NormalizedSchedule, ResourceId, TimeSlot,
};
use tracing::debug;

use crate::provider::FetchRequest;
use crate::raw_payload::{
    CalendarSchedule, FlagEntry, FlatSchedule, RawPayload, RawTimeSlot, UsernameEntry,
};

/// Converts a [`RawPayload`] to a [`NormalizedSchedule`] for `date`.
///
/// The flat shape is a live board for the current day and carries no date
/// keys, so `date` only selects data for calendar shapes. A calendar date that
/// upstream has not published yet yields an empty schedule.
pub fn normalize(raw: &RawPayload, date: NaiveDate, request: &FetchRequest) -> NormalizedSchedule {
    match raw {
        RawPayload::Flat(schedule) => normalize_flat(schedule, request.resource),
        RawPayload::CalendarFlag(schedule) => {
            normalize_calendar(schedule, date, request, |e: &FlagEntry| {
                CanonicalAvailability::from_occupy(e.occupy)
            })
        }
        RawPayload::CalendarUsername(schedule) => {
            normalize_calendar(schedule, date, request, |e: &UsernameEntry| {
                CanonicalAvailability::from_occupant(e.username.as_deref())
            })
        }
    }
}

fn convert_slots(time: &[RawTimeSlot]) -> Vec<TimeSlot> {
    time.iter()
        .map(|slot| TimeSlot::new(slot.id, &slot.str_time))
        .collect()
}

/// Collects `(slot id, availability)` for every listed slot present in `entries`.
fn court_slots<E>(
    time: &[RawTimeSlot],
    entries: &HashMap<String, E>,
    to_availability: impl Fn(&E) -> CanonicalAvailability,
) -> Vec<(u32, CanonicalAvailability)> {
    time.iter()
        .filter_map(|slot| {
            entries
                .get(&slot.id.to_string())
                .map(|entry| (slot.id, to_availability(entry)))
        })
        .collect()
}

fn normalize_flat(schedule: &FlatSchedule, resource: ResourceId) -> NormalizedSchedule {
    let courts = schedule
        .resource
        .iter()
        .filter_map(|court| {
            let Some(entries) = schedule.data.get(&court.id.to_string()) else {
                debug!(%resource, court = court.id, "Board lists a court without data");
                return None;
            };
            let mut normalized = CourtSchedule::new(&court.name);
            normalized.slots = court_slots(&schedule.time, entries, |e| {
                CanonicalAvailability::from_occupy(e.occupy)
            });
            Some(normalized)
        })
        .collect();

    NormalizedSchedule::new(resource, convert_slots(&schedule.time), courts)
}

fn normalize_calendar<E>(
    schedule: &CalendarSchedule<E>,
    date: NaiveDate,
    request: &FetchRequest,
    to_availability: impl Fn(&E) -> CanonicalAvailability,
) -> NormalizedSchedule {
    let date_key = date.format("%Y-%m-%d").to_string();
    let Some(entries) = schedule.day_entries(&date_key) else {
        debug!(resource = %request.resource, date = %date_key, "Date not published yet");
        return NormalizedSchedule::empty(request.resource);
    };

    let mut court = CourtSchedule::new(&request.label);
    court.slots = court_slots(&schedule.time, entries, to_availability);

    NormalizedSchedule::new(request.resource, convert_slots(&schedule.time), vec![court])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{CalendarOccupancy, PayloadVariant};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
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

    fn calendar_flag_body(occupy: bool) -> String {
        format!(
            r#"{{"d": {{
                "time": [{{"id": 3, "str_time": "19:00-20:00"}}],
                "day": ["2025-05-20"],
                "data": {{"2025-05-20": {{"3": {{"status": 1, "occupy": {}}}}}}}
            }}}}"#,
            occupy
        )
    }

    fn calendar_username_body(username: &str) -> String {
        format!(
            r#"{{"d": {{
                "time": [{{"id": 3, "str_time": "19:00-20:00"}}],
                "day": ["2025-05-20"],
                "data": {{"2025-05-20": {{"3": {{"username": {}}}}}}}
            }}}}"#,
            username
        )
    }

    fn court_request(occupancy: CalendarOccupancy) -> FetchRequest {
        FetchRequest::court(ResourceId(1296), occupancy, "场地ID 3")
    }

    fn decode(variant: PayloadVariant, body: &str) -> RawPayload {
        RawPayload::decode(variant, body).unwrap()
    }

    mod flat {
        use super::*;

        #[test]
        fn unoccupied_slot_is_free() {
            let raw = decode(PayloadVariant::Flat, &flat_body(false));
            let schedule = normalize(&raw, date(), &FetchRequest::aggregate(ResourceId(1293)));

            assert_eq!(schedule.resource, ResourceId(1293));
            assert_eq!(schedule.time_slots, vec![TimeSlot::new(5, "20:00-21:00")]);
            assert_eq!(schedule.courts.len(), 1);
            assert_eq!(schedule.courts[0].name, "Court A");
            assert_eq!(
                schedule.courts[0].availability(5),
                Some(CanonicalAvailability::FREE)
            );
        }

        #[test]
        fn occupied_slot_is_not_free() {
            let raw = decode(PayloadVariant::Flat, &flat_body(true));
            let schedule = normalize(&raw, date(), &FetchRequest::aggregate(ResourceId(1293)));
            assert_eq!(
                schedule.courts[0].availability(5),
                Some(CanonicalAvailability::OCCUPIED)
            );
        }

        #[test]
        fn keeps_board_court_order() {
            let body = r#"{"d": {
                "time": [{"id": 1, "str_time": "10:00-11:00"}],
                "resource": [{"id": 9, "name": "Z"}, {"id": 2, "name": "B"}, {"id": 4, "name": "no data"}],
                "data": {"2": {"1": {"occupy": false}}, "9": {"1": {"occupy": false}}}
            }}"#;
            let raw = decode(PayloadVariant::Flat, body);
            let schedule = normalize(&raw, date(), &FetchRequest::aggregate(ResourceId(1293)));

            let names: Vec<_> = schedule.courts.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["Z", "B"]);
        }
    }

    mod calendar_flag {
        use super::*;

        #[test]
        fn occupy_maps_to_free() {
            let request = court_request(CalendarOccupancy::Flag);

            let raw = decode(PayloadVariant::CalendarFlag, &calendar_flag_body(false));
            let schedule = normalize(&raw, date(), &request);
            assert_eq!(schedule.courts[0].name, "场地ID 3");
            assert_eq!(
                schedule.courts[0].availability(3),
                Some(CanonicalAvailability::FREE)
            );

            let raw = decode(PayloadVariant::CalendarFlag, &calendar_flag_body(true));
            let schedule = normalize(&raw, date(), &request);
            assert_eq!(
                schedule.courts[0].availability(3),
                Some(CanonicalAvailability::OCCUPIED)
            );
        }

        #[test]
        fn unpublished_date_is_empty() {
            let raw = decode(PayloadVariant::CalendarFlag, &calendar_flag_body(false));
            let later = date().succ_opt().unwrap();
            let schedule = normalize(&raw, later, &court_request(CalendarOccupancy::Flag));
            assert!(schedule.is_empty());
            assert_eq!(schedule.resource, ResourceId(1296));
        }
    }

    mod calendar_username {
        use super::*;

        #[test]
        fn null_username_is_free() {
            let raw = decode(PayloadVariant::CalendarUsername, &calendar_username_body("null"));
            let schedule = normalize(&raw, date(), &court_request(CalendarOccupancy::Username));
            assert_eq!(
                schedule.courts[0].availability(3),
                Some(CanonicalAvailability::FREE)
            );
        }

        #[test]
        fn present_username_is_occupied() {
            let raw = decode(
                PayloadVariant::CalendarUsername,
                &calendar_username_body("\"赵六\""),
            );
            let schedule = normalize(&raw, date(), &court_request(CalendarOccupancy::Username));
            assert_eq!(
                schedule.courts[0].availability(3),
                Some(CanonicalAvailability::OCCUPIED)
            );
        }

        #[test]
        fn missing_username_field_is_free() {
            let raw = decode(
                PayloadVariant::CalendarUsername,
                r#"{"d": {"time": [{"id": 3, "str_time": "19:00-20:00"}], "data": {"2025-05-20": {"3": {}}}}}"#,
            );
            let schedule = normalize(&raw, date(), &court_request(CalendarOccupancy::Username));
            assert_eq!(
                schedule.courts[0].availability(3),
                Some(CanonicalAvailability::FREE)
            );
        }
    }

    #[test]
    fn slots_without_entries_are_left_out() {
        let body = r#"{"d": {
            "time": [{"id": 1, "str_time": "08:00-09:00"}, {"id": 2, "str_time": "09:00-10:00"}],
            "day": ["2025-05-20"],
            "data": {"2025-05-20": {"2": {"occupy": false}}}
        }}"#;
        let raw = decode(PayloadVariant::CalendarFlag, body);
        let schedule = normalize(&raw, date(), &court_request(CalendarOccupancy::Flag));

        assert_eq!(schedule.time_slots.len(), 2);
        assert_eq!(
            schedule.courts[0].slots,
            vec![(2, CanonicalAvailability::FREE)]
        );
    }
}
