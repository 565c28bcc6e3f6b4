//! Recurrence rule parsing.
//!
//! Only the parts that matter for rotation detection are interpreted:
//! `FREQ`, `UNTIL` and `BYDAY`. Every other part is kept verbatim and handed
//! to the `rrule` crate during expansion.

use crate::calendar::resolve_local;
use crate::error::{Result, RotationError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use std::fmt;

/// Recurrence frequency. Only daily and weekly rules are expanded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Other(String),
}

impl Frequency {
    fn parse(value: &str) -> Self {
        match value {
            "DAILY" => Frequency::Daily,
            "WEEKLY" => Frequency::Weekly,
            other => Frequency::Other(other.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Frequency::Other(_))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => f.write_str("DAILY"),
            Frequency::Weekly => f.write_str("WEEKLY"),
            Frequency::Other(s) => f.write_str(s),
        }
    }
}

/// A parsed RRULE value. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub until: Option<DateTime<Utc>>,
    /// `BYDAY` tokens in source order, e.g. `["MO", "WE", "FR"]`.
    pub by_day: Vec<String>,
    /// Rule parts other than `UNTIL`, in source order.
    parts: Vec<(String, String)>,
}

impl RecurrenceRule {
    /// Parse an RRULE value such as `FREQ=WEEKLY;UNTIL=20261231T000000Z;BYDAY=MO,FR`.
    ///
    /// A floating or date-only `UNTIL` is interpreted in `tz`; a date-only
    /// bound covers the whole day.
    ///
    /// # Errors
    /// Returns `RotationError::MalformedRule` if the text is empty, a part has no
    /// `=`, `FREQ` is missing, or `UNTIL` cannot be parsed.
    pub fn parse(text: &str, tz: &Tz) -> Result<Self> {
        let text = text.trim();
        let text = text.strip_prefix("RRULE:").unwrap_or(text);
        if text.is_empty() {
            return Err(RotationError::MalformedRule("empty RRULE string".to_string()));
        }

        let mut frequency = None;
        let mut until = None;
        let mut by_day = Vec::new();
        let mut parts = Vec::new();

        for part in text.split(';').filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| RotationError::MalformedRule(format!("missing '=' in '{part}'")))?;
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim().to_ascii_uppercase();

            match key.as_str() {
                "FREQ" => frequency = Some(Frequency::parse(&value)),
                "UNTIL" => {
                    until = Some(parse_until(&value, tz)?);
                    continue;
                }
                "BYDAY" => {
                    by_day = value
                        .split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => {}
            }
            parts.push((key, value));
        }

        let frequency = frequency
            .ok_or_else(|| RotationError::MalformedRule(format!("no FREQ in '{text}'")))?;

        Ok(Self {
            frequency,
            until,
            by_day,
            parts,
        })
    }

    /// The rule without its `UNTIL` part, ready for an `RRULE:` line.
    /// The expander applies the bound itself.
    pub fn unbounded_text(&self) -> String {
        self.parts
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// `BYDAY` tokens sorted lexicographically, used as the shape's day pattern.
    pub fn day_pattern(&self) -> Vec<String> {
        let mut days = self.by_day.clone();
        days.sort();
        days.dedup();
        days
    }
}

fn parse_until(value: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let malformed = || RotationError::MalformedRule(format!("invalid UNTIL '{value}'"));

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").map_err(|_| malformed())?;
        return Ok(naive.and_utc());
    }

    let naive = match NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        Ok(naive) => naive,
        Err(_) => {
            let date = NaiveDate::parse_from_str(value, "%Y%m%d").map_err(|_| malformed())?;
            let last_second = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(malformed)?;
            date.and_time(last_second)
        }
    };

    resolve_local(tz, &naive)
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(malformed)
}
