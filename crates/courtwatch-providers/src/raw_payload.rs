//! Raw payloads as served by the reservation backend.
//!
//! The `large-screen` endpoint has shipped several incompatible shapes over
//! time. They share an envelope (`{"d": {...}}`) and a `time` slot list but
//! differ in how occupancy is keyed and encoded:
//!
//! - **Flat**: `data[resourceId][slotId] = {occupy}`, with a `resource` list
//!   naming every court shown on the board
//! - **Calendar / flag**: `data[date][slotId] = {sign_status, occupy, user}`
//! - **Calendar / username**: `data[date][slotId] = {username}`, null when free
//!
//! Each endpoint serves exactly one shape, so decoding is directed by a
//! [`PayloadVariant`] chosen from the endpoint's role rather than by probing
//! the body.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::PayloadVariant;

/// The `{"d": ...}` wrapper around every payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// The payload proper.
    pub d: T,
}

/// A slot as listed in the `time` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimeSlot {
    /// Upstream slot id.
    pub id: u32,
    /// Display label, e.g. `"20:00-21:00"`.
    #[serde(alias = "strTime")]
    pub str_time: String,
}

/// A court listed on the aggregate board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResource {
    /// Board-local court id; keys the `data` map.
    pub id: u32,
    /// Display name.
    pub name: String,
}

/// Occupancy entry of the flat shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatEntry {
    /// Whether the slot is booked. Absent means not booked.
    #[serde(default)]
    pub occupy: bool,
}

/// Aggregate board payload: every court for the current day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatSchedule {
    /// Slots in display order.
    #[serde(default)]
    pub time: Vec<RawTimeSlot>,
    /// Courts in display order.
    #[serde(default)]
    pub resource: Vec<RawResource>,
    /// `court id -> slot id -> entry`.
    #[serde(default)]
    pub data: HashMap<String, HashMap<String, FlatEntry>>,
}

/// Calendar entry carrying an occupancy flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEntry {
    /// Upstream sign-in status; informational only.
    #[serde(default, alias = "signStatus", alias = "status")]
    pub sign_status: Option<i64>,
    /// Whether the slot is booked. Absent means not booked.
    #[serde(default)]
    pub occupy: bool,
    /// Name of the booking user, if disclosed.
    #[serde(default)]
    pub user: Option<String>,
}

/// Calendar entry carrying a nullable occupant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameEntry {
    /// The booking user; `null` or absent when the slot is free.
    #[serde(default)]
    pub username: Option<String>,
}

/// Per-court calendar payload: one court over several days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSchedule<E> {
    /// Slots in display order.
    #[serde(default)]
    pub time: Vec<RawTimeSlot>,
    /// Published dates, `YYYY-MM-DD`.
    #[serde(default)]
    pub day: Vec<String>,
    /// `date -> slot id -> entry`.
    #[serde(default = "HashMap::new")]
    pub data: HashMap<String, HashMap<String, E>>,
}

impl<E> CalendarSchedule<E> {
    /// Returns the entries published for `date_key`, if any.
    pub fn day_entries(&self, date_key: &str) -> Option<&HashMap<String, E>> {
        self.data.get(date_key)
    }
}

/// A decoded payload, tagged with the shape it was decoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload {
    /// Aggregate board shape.
    Flat(FlatSchedule),
    /// Calendar shape with `occupy` flags.
    CalendarFlag(CalendarSchedule<FlagEntry>),
    /// Calendar shape with nullable `username`.
    CalendarUsername(CalendarSchedule<UsernameEntry>),
}

impl RawPayload {
    /// Decodes a response body as the given variant.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidResponse` error if the body is not JSON of that shape.
    pub fn decode(variant: PayloadVariant, body: &str) -> ProviderResult<Self> {
        match variant {
            PayloadVariant::Flat => decode_envelope(body).map(Self::Flat),
            PayloadVariant::CalendarFlag => decode_envelope(body).map(Self::CalendarFlag),
            PayloadVariant::CalendarUsername => decode_envelope(body).map(Self::CalendarUsername),
        }
    }

    /// Returns the variant this payload was decoded as.
    pub fn variant(&self) -> PayloadVariant {
        match self {
            Self::Flat(_) => PayloadVariant::Flat,
            Self::CalendarFlag(_) => PayloadVariant::CalendarFlag,
            Self::CalendarUsername(_) => PayloadVariant::CalendarUsername,
        }
    }

    /// Returns the slot list shared by every shape.
    pub fn time_slots(&self) -> &[RawTimeSlot] {
        match self {
            Self::Flat(s) => &s.time,
            Self::CalendarFlag(s) => &s.time,
            Self::CalendarUsername(s) => &s.time,
        }
    }
}

fn decode_envelope<T>(body: &str) -> ProviderResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_str::<Envelope<T>>(body)
        .map(|envelope| envelope.d)
        .map_err(|e| {
            ProviderError::invalid_response(format!("Failed to decode payload: {}", e))
                .with_source(e)
        })
}
