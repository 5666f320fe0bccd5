//! Core types: slots, canonical availability, day buckets, slot evaluation

pub mod evaluate;
pub mod slot;
pub mod time;
pub mod tracing;

pub use evaluate::{evaluate, format_line};
pub use slot::{
    CanonicalAvailability, CourtSchedule, NormalizedSchedule, ResourceId, TimeSlot,
    parse_slot_start,
};
pub use time::{ClockError, DayBucket, MonitorClock};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
