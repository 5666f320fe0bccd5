//! Slot and availability types.
//!
//! This module provides the canonical view every upstream payload is
//! normalized into:
//!
//! - [`ResourceId`] identifies a court (or the aggregate view) upstream
//! - [`TimeSlot`] is one bookable interval with its display label
//! - [`CanonicalAvailability`] is the normalized "free" fact for a slot
//! - [`CourtSchedule`] and [`NormalizedSchedule`] group those facts per court

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Integer identifier assigned by the reservation backend to a resource.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// Returns the raw numeric id.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for ResourceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bookable interval as published upstream, e.g. `{id: 5, label: "20:00-21:00"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Upstream slot id.
    pub id: u32,
    /// Display text. Only the leading start time is ever interpreted.
    pub label: String,
}

impl TimeSlot {
    /// Creates a new time slot.
    pub fn new(id: u32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// Returns the nominal start time parsed from the label, if any.
    pub fn start_time(&self) -> Option<NaiveTime> {
        parse_slot_start(&self.label)
    }
}

/// Parses the `HH:MM` token before the first `-` of a slot label.
///
/// Returns `None` when the label has no such token.
pub fn parse_slot_start(label: &str) -> Option<NaiveTime> {
    let head = label.split('-').next()?.trim();
    NaiveTime::parse_from_str(head, "%H:%M").ok()
}

/// Normalized availability of one slot, independent of the upstream schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalAvailability {
    /// Whether the slot can still be booked.
    pub free: bool,
}

impl CanonicalAvailability {
    /// A free slot.
    pub const FREE: Self = Self { free: true };
    /// An occupied slot.
    pub const OCCUPIED: Self = Self { free: false };

    /// Builds availability from an explicit occupancy flag.
    pub fn from_occupy(occupy: bool) -> Self {
        Self { free: !occupy }
    }

    /// Builds availability from a nullable occupant identifier.
    pub fn from_occupant<S: AsRef<str>>(occupant: Option<S>) -> Self {
        Self {
            free: occupant.is_none(),
        }
    }
}

/// One court's availability for a single date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtSchedule {
    /// Display name of the court.
    pub name: String,
    /// `(slot id, availability)` pairs in upstream slot order.
    pub slots: Vec<(u32, CanonicalAvailability)>,
}

impl CourtSchedule {
    /// Creates an empty schedule for the named court.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
        }
    }

    /// Builder method to append a slot.
    pub fn with_slot(mut self, slot_id: u32, availability: CanonicalAvailability) -> Self {
        self.slots.push((slot_id, availability));
        self
    }

    /// Looks up the availability of a slot.
    pub fn availability(&self, slot_id: u32) -> Option<CanonicalAvailability> {
        self.slots
            .iter()
            .find(|(id, _)| *id == slot_id)
            .map(|(_, availability)| *availability)
    }

    /// Number of free slots on this court.
    pub fn free_count(&self) -> usize {
        self.slots.iter().filter(|(_, a)| a.free).count()
    }
}

/// The normalizer's output for one upstream payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSchedule {
    /// The endpoint the payload was fetched from.
    pub resource: ResourceId,
    /// Time slots in upstream order.
    pub time_slots: Vec<TimeSlot>,
    /// Courts in upstream order.
    pub courts: Vec<CourtSchedule>,
}

impl NormalizedSchedule {
    /// Creates a schedule with no courts.
    pub fn empty(resource: ResourceId) -> Self {
        Self {
            resource,
            time_slots: Vec::new(),
            courts: Vec::new(),
        }
    }

    /// Creates a schedule from slots and courts.
    pub fn new(resource: ResourceId, time_slots: Vec<TimeSlot>, courts: Vec<CourtSchedule>) -> Self {
        Self {
            resource,
            time_slots,
            courts,
        }
    }

    /// Returns true if no court data was published.
    pub fn is_empty(&self) -> bool {
        self.courts.is_empty()
    }
}
