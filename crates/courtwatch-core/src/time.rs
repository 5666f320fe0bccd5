//! Day buckets and the monitor clock.
//!
//! All comparisons happen on naive local times in the monitor's zone. The
//! same zone decides which date is "today" and which is "tomorrow".

use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Errors raised while building a [`MonitorClock`].
#[derive(Debug, Error)]
pub enum ClockError {
    /// The configured zone is not a known IANA identifier.
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// The logical day a slot list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayBucket {
    /// The current local date.
    Today(NaiveDate),
    /// The day after the current local date.
    Tomorrow(NaiveDate),
    /// Any other date; rendered literally.
    Other(NaiveDate),
}

impl DayBucket {
    /// Classifies `date` relative to `today`.
    pub fn classify(date: NaiveDate, today: NaiveDate) -> Self {
        if date == today {
            Self::Today(date)
        } else if Some(date) == today.succ_opt() {
            Self::Tomorrow(date)
        } else {
            Self::Other(date)
        }
    }

    /// Returns the calendar date of this bucket.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Today(d) | Self::Tomorrow(d) | Self::Other(d) => *d,
        }
    }

    /// Returns the upstream date key, `YYYY-MM-DD`.
    pub fn date_key(&self) -> String {
        self.date().format("%Y-%m-%d").to_string()
    }

    /// Returns the label shown in availability lines.
    pub fn label(&self) -> String {
        match self {
            Self::Today(_) => "今天".to_string(),
            Self::Tomorrow(_) => "明天".to_string(),
            Self::Other(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Returns true for the today bucket.
    pub fn is_today(&self) -> bool {
        matches!(self, Self::Today(_))
    }
}

impl fmt::Display for DayBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today(d) => write!(f, "today ({})", d),
            Self::Tomorrow(d) => write!(f, "tomorrow ({})", d),
            Self::Other(d) => write!(f, "{}", d),
        }
    }
}

/// Source of "now" for the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorClock {
    /// The process-local time zone.
    #[default]
    Local,
    /// An explicit IANA time zone.
    Zone(Tz),
}

impl MonitorClock {
    /// Builds a clock from an optional zone name.
    ///
    /// `None` selects the process-local zone.
    pub fn from_timezone(name: Option<&str>) -> Result<Self, ClockError> {
        match name {
            None => Ok(Self::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(Self::Zone)
                .map_err(|_| ClockError::UnknownTimezone(name.to_string())),
        }
    }

    /// Returns the current wall-clock time in the monitor's zone.
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Self::Local => Local::now().naive_local(),
            Self::Zone(tz) => Utc::now().with_timezone(tz).naive_local(),
        }
    }

    /// Returns the today and tomorrow buckets for a given local time.
    pub fn buckets_at(now: NaiveDateTime) -> (DayBucket, DayBucket) {
        let today = now.date();
        // NaiveDate::MAX has no successor; the monitor never runs there.
        let tomorrow = today.succ_opt().unwrap_or(today);
        (DayBucket::Today(today), DayBucket::Tomorrow(tomorrow))
    }
}
