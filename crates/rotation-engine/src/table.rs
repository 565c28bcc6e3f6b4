//! Event table construction.
//!
//! Walks every calendar event, expands recurring ones within the horizon and
//! normalizes each occurrence. Failures are contained per event: an
//! unsupported frequency degrades to a single occurrence, a malformed rule or
//! interval drops only that event.

use crate::calendar::{Calendar, RawOccurrence};
use crate::error::{Result, RotationError};
use crate::event::{normalize, NormalizedEvent};
use crate::expander::{expand, Horizon};
use crate::rule::RecurrenceRule;
use chrono::Utc;
use chrono_tz::Tz;
use tracing::{debug, warn};

/// A calendar event that could not be turned into occurrences.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEvent {
    /// Position of the event in `Calendar::events`.
    pub index: usize,
    pub user: String,
    pub error: RotationError,
}

/// All normalized occurrences of a calendar, sorted by `(start_utc, user)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventTable {
    pub events: Vec<NormalizedEvent>,
    pub rejected: Vec<RejectedEvent>,
}

impl EventTable {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Build the event table for `calendar`.
///
/// # Errors
/// Returns `RotationError::EmptyCalendar` if the calendar has no events or
/// none of them yields an occurrence.
pub fn build(calendar: &Calendar, horizon: &Horizon) -> Result<EventTable> {
    if calendar.events.is_empty() {
        return Err(RotationError::EmptyCalendar);
    }

    let tz = calendar.reference_timezone();
    let mut table = EventTable::default();

    for (index, raw) in calendar.events.iter().enumerate() {
        match occurrences(raw, horizon, &tz) {
            Ok(mut events) => table.events.append(&mut events),
            Err(error) => {
                warn!(index, user = %raw.user, %error, "skipping calendar event");
                table.rejected.push(RejectedEvent {
                    index,
                    user: raw.user.clone(),
                    error,
                });
            }
        }
    }

    if table.events.is_empty() {
        return Err(RotationError::EmptyCalendar);
    }

    table
        .events
        .sort_by(|a, b| (a.start_utc, &a.user).cmp(&(b.start_utc, &b.user)));

    debug!(
        events = table.events.len(),
        rejected = table.rejected.len(),
        "built event table"
    );
    Ok(table)
}

fn occurrences(raw: &RawOccurrence, horizon: &Horizon, tz: &Tz) -> Result<Vec<NormalizedEvent>> {
    let duration = raw.end - raw.start;
    if duration <= chrono::Duration::zero() {
        return Err(RotationError::InvalidOccurrence(format!(
            "'{}' ends at {} but starts at {}",
            raw.user, raw.end, raw.start
        )));
    }

    let start_utc = raw.start.with_timezone(&Utc);
    let single = || vec![normalize(start_utc, duration, &raw.user, None, tz)];

    let Some(text) = raw.rrule.as_deref() else {
        return Ok(single());
    };

    let rule = RecurrenceRule::parse(text, &raw.start.timezone())?;
    match expand(&rule, raw.start, raw.end, horizon) {
        Ok(starts) => Ok(starts
            .into_iter()
            .map(|start| normalize(start, duration, &raw.user, Some(&rule), tz))
            .collect()),
        Err(RotationError::UnsupportedRecurrence { frequency }) => {
            warn!(user = %raw.user, %frequency, "unsupported recurrence, treating as a single occurrence");
            Ok(single())
        }
        Err(e) => Err(e),
    }
}
