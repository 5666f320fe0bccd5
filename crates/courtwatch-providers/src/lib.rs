//! ScheduleSource trait, upstream payload variants and normalization.
//!
//! - [`ScheduleSource`] - What every upstream backend implements
//! - [`RawPayload`] - The payload shapes the reservation API has served
//! - [`normalize`] - Conversion of any shape into a [`NormalizedSchedule`]
//! - [`ProviderError`] - Error types for fetch and decode
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐    ┌─────────────────┐
//! │ large-screen API     │    │ canned bodies   │
//! └──────────┬───────────┘    └────────┬────────┘
//!            │                         │
//!            ▼                         ▼
//! ┌──────────────────────┐    ┌─────────────────┐
//! │ LargeScreenClient    │    │ FixtureSource   │  (test-util)
//! └──────────┬───────────┘    └────────┬────────┘
//!            │     ScheduleSource      │
//!            └───────────┬─────────────┘
//!                        ▼
//!                 ┌─────────────┐
//!                 │ RawPayload  │  Flat | CalendarFlag | CalendarUsername
//!                 └──────┬──────┘
//!                        ▼ normalize()
//!              ┌────────────────────┐
//!              │ NormalizedSchedule │
//!              └────────────────────┘
//! ```
//!
//! [`NormalizedSchedule`]: courtwatch_core::NormalizedSchedule

pub mod error;
#[cfg(feature = "large-screen")]
pub mod large_screen;
pub mod normalize;
pub mod provider;
pub mod raw_payload;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::normalize;
#[cfg(any(test, feature = "test-util"))]
pub use provider::FixtureSource;
pub use provider::{
    BoxFuture, CalendarOccupancy, EndpointRole, FetchRequest, PayloadVariant, ScheduleSource,
};
pub use raw_payload::{
    CalendarSchedule, FlagEntry, FlatEntry, FlatSchedule, RawPayload, RawResource, RawTimeSlot,
    UsernameEntry,
};
