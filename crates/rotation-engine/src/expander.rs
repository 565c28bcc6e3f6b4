//! RRULE expansion -- turns one recurring shift into its concrete start instants.
//!
//! Wraps the `rrule` crate (v0.13). Expansion is always bounded: only instants
//! in `[now, min(UNTIL, now + horizon)]` are produced, so past occurrences are
//! never emitted and unbounded rules still terminate.

use crate::error::{Result, RotationError};
use crate::rule::RecurrenceRule;
use chrono::{DateTime, Duration, TimeDelta, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;
use tracing::warn;

/// Default safety horizon for rules without an `UNTIL`.
pub const DEFAULT_HORIZON_DAYS: i64 = 365;

/// Upper bound on instants returned by a single expansion.
pub const MAX_INSTANCES: u16 = u16::MAX;

/// The window expansion is allowed to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    pub now: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Horizon {
    /// Horizon of `days` days starting at `now`.
    ///
    /// # Errors
    /// Returns `RotationError::InvalidHorizon` if `days` is negative or
    /// `now + days` is not a representable instant.
    pub fn new(now: DateTime<Utc>, days: i64) -> Result<Self> {
        let end = Some(days)
            .filter(|d| *d >= 0)
            .and_then(TimeDelta::try_days)
            .and_then(|span| now.checked_add_signed(span))
            .ok_or(RotationError::InvalidHorizon { days })?;
        Ok(Self { now, end })
    }

    /// Horizon of [`DEFAULT_HORIZON_DAYS`] starting at `now`, clamped to the
    /// last representable instant.
    pub fn from_now(now: DateTime<Utc>) -> Self {
        Self::new(now, DEFAULT_HORIZON_DAYS).unwrap_or(Self {
            now,
            end: DateTime::<Utc>::MAX_UTC,
        })
    }

    /// Effective upper bound for a rule: `min(until, horizon end)`.
    pub fn upper_bound(&self, until: Option<DateTime<Utc>>) -> DateTime<Utc> {
        until.map_or(self.end, |u| u.min(self.end))
    }
}

/// Expand `rule` anchored at the first occurrence into start instants.
///
/// The returned instants are strictly increasing and all lie within
/// `[horizon.now, horizon.upper_bound(rule.until)]`, inclusive. Wall-clock
/// time is preserved across DST in the first occurrence's timezone.
///
/// # Errors
/// Returns `RotationError::UnsupportedRecurrence` for frequencies other than
/// DAILY and WEEKLY; callers treat the event as a single occurrence.
/// Returns `RotationError::MalformedRule` if the first occurrence does not end
/// after it starts, if `UNTIL` precedes the first start, or if the `rrule`
/// crate rejects the rule.
pub fn expand(
    rule: &RecurrenceRule,
    first_start: DateTime<Tz>,
    first_end: DateTime<Tz>,
    horizon: &Horizon,
) -> Result<Vec<DateTime<Utc>>> {
    if !rule.frequency.is_supported() {
        return Err(RotationError::UnsupportedRecurrence {
            frequency: rule.frequency.to_string(),
        });
    }

    if first_end <= first_start {
        return Err(RotationError::MalformedRule(format!(
            "occurrence ends at {first_end} before it starts at {first_start}"
        )));
    }

    if let Some(until) = rule.until {
        if until < first_start.with_timezone(&Utc) {
            return Err(RotationError::MalformedRule(format!(
                "UNTIL {until} precedes DTSTART {first_start}"
            )));
        }
    }

    let lower = horizon.now;
    let upper = horizon.upper_bound(rule.until);
    if upper < lower {
        return Ok(Vec::new());
    }

    // DTSTART carries the event's own zone so BYDAY and wall-clock times are
    // evaluated where the shift was authored.
    let rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        first_start.timezone().name(),
        first_start.naive_local().format("%Y%m%dT%H%M%S"),
        rule.unbounded_text()
    );

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| RotationError::MalformedRule(format!("{}", e)))?;

    // Widen the crate-side window by a second on each end; the exact inclusive
    // bounds are enforced below regardless of how the crate treats its limits.
    let one_second = Duration::seconds(1);
    let after = lower.checked_sub_signed(one_second).unwrap_or(lower);
    let before = upper.checked_add_signed(one_second).unwrap_or(upper);
    let instances = rrule_set
        .after(after.with_timezone(&rrule::Tz::UTC))
        .before(before.with_timezone(&rrule::Tz::UTC))
        .all(MAX_INSTANCES);

    if instances.limited {
        warn!(
            limit = MAX_INSTANCES,
            rule = %rule.unbounded_text(),
            "expansion hit the instance limit; later occurrences are dropped"
        );
    }

    let mut starts: Vec<DateTime<Utc>> = instances
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| *dt >= lower && *dt <= upper)
        .collect();

    starts.sort();
    starts.dedup();

    Ok(starts)
}
