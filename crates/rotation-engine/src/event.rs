//! Normalized shift occurrences.

use crate::rule::RecurrenceRule;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// ISO-8601 week, keyed by ISO year so weeks never wrap across years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

/// The fields that make two occurrences "the same kind of shift".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ShiftShape {
    pub start_time_of_day: NaiveTime,
    pub duration_seconds: i64,
    pub day_pattern: Vec<String>,
    pub is_recurring: bool,
}

/// One concrete occurrence of a shift.
///
/// `start_time_of_day`, `weekday` and `iso_week` are computed in the calendar's
/// reference timezone; `start_utc` and `end_utc` are UTC instants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEvent {
    pub user: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub start_time_of_day: NaiveTime,
    pub duration_seconds: i64,
    /// 1 (Monday) through 7 (Sunday).
    pub weekday: u32,
    pub iso_week: WeekKey,
    pub is_recurring: bool,
    pub day_pattern: Vec<String>,
    /// The source rule's `UNTIL` bound, when there is one.
    pub until: Option<DateTime<Utc>>,
}

impl NormalizedEvent {
    pub fn shape(&self) -> ShiftShape {
        ShiftShape {
            start_time_of_day: self.start_time_of_day,
            duration_seconds: self.duration_seconds,
            day_pattern: self.day_pattern.clone(),
            is_recurring: self.is_recurring,
        }
    }
}

/// Build a [`NormalizedEvent`] from a start instant and the shift duration.
///
/// `rule` is `None` for single occurrences, including degraded recurring
/// events. `duration` must be positive; the table builder checks this before
/// calling.
pub fn normalize(
    start: DateTime<Utc>,
    duration: Duration,
    user: &str,
    rule: Option<&RecurrenceRule>,
    tz: &Tz,
) -> NormalizedEvent {
    let local = start.with_timezone(tz);
    let iso = local.iso_week();

    NormalizedEvent {
        user: user.to_string(),
        start_utc: start,
        end_utc: start + duration,
        start_time_of_day: local.time(),
        duration_seconds: duration.num_seconds(),
        weekday: local.weekday().number_from_monday(),
        iso_week: WeekKey {
            year: iso.year(),
            week: iso.week(),
        },
        is_recurring: rule.is_some(),
        day_pattern: rule.map(RecurrenceRule::day_pattern).unwrap_or_default(),
        until: rule.and_then(|r| r.until),
    }
}
