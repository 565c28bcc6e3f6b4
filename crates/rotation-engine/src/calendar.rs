//! Calendar input consumed by the pipeline.
//!
//! Parsing calendar bytes is the caller's job. The engine only sees already
//! structured occurrences plus the calendar's declared timezone.

use crate::error::{Result, RotationError};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// One VEVENT as delivered by the calendar source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOccurrence {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// Participant identifier (the event summary in most feeds). Opaque.
    pub user: String,
    /// Raw RRULE value, e.g. `FREQ=WEEKLY;BYDAY=MO,WE,FR`. Parsed by the
    /// table builder so that a bad rule only affects its own event.
    pub rrule: Option<String>,
}

impl RawOccurrence {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>, user: impl Into<String>) -> Self {
        Self {
            start,
            end,
            user: user.into(),
            rrule: None,
        }
    }

    pub fn with_rrule(mut self, rrule: impl Into<String>) -> Self {
        self.rrule = Some(rrule.into());
        self
    }
}

/// A parsed calendar: its events and declared timezone (`X-WR-TIMEZONE`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calendar {
    pub timezone: Option<Tz>,
    pub events: Vec<RawOccurrence>,
}

impl Calendar {
    pub fn new(timezone: Option<Tz>, events: Vec<RawOccurrence>) -> Self {
        Self { timezone, events }
    }

    /// The reference timezone for derived fields. Falls back to UTC.
    pub fn reference_timezone(&self) -> Tz {
        self.timezone.unwrap_or(Tz::UTC)
    }
}

/// Parse an IANA timezone name such as `Europe/Zurich`.
///
/// # Errors
/// Returns `RotationError::InvalidTimezone` if the name is unknown.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse()
        .map_err(|_| RotationError::InvalidTimezone(name.to_string()))
}

/// Resolve a wall-clock time in `tz`.
///
/// Ambiguous times (DST fold) take the earlier instant. Times inside a DST gap
/// are read with the offset in effect before the gap, which lands them one
/// hour later on the wall clock (RFC 5545 §3.3.5).
pub fn resolve_local(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(naive).earliest().or_else(|| {
        let shifted = naive.checked_add_signed(Duration::hours(1))?;
        tz.from_local_datetime(&shifted).earliest()
    })
}
