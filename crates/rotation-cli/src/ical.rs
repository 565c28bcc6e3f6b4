//! Minimal iCalendar reader (RFC 5545) for shift calendars.
//!
//! Only what rotation detection needs is read: `VEVENT` start/end (or
//! duration), `SUMMARY` as the participant, the raw `RRULE` value, and the
//! calendar-level `X-WR-TIMEZONE`. Everything else is ignored.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use rotation_engine::{parse_timezone, resolve_local, Calendar, RawOccurrence};
use tracing::{debug, warn};

/// One `name;param=value:value` content line.
#[derive(Debug, Clone)]
struct ContentLine {
    name: String,
    params: Vec<(String, String)>,
    value: String,
}

impl ContentLine {
    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct PendingEvent {
    line: usize,
    dtstart: Option<ContentLine>,
    dtend: Option<ContentLine>,
    duration: Option<String>,
    summary: Option<String>,
    rrule: Option<String>,
}

impl PendingEvent {
    fn absorb(&mut self, line: ContentLine) {
        let name = line.name.clone();
        match name.as_str() {
            "DTSTART" => self.dtstart = Some(line),
            "DTEND" => self.dtend = Some(line),
            "DURATION" => self.duration = Some(line.value),
            "SUMMARY" => self.summary = Some(unescape_text(&line.value)),
            "RRULE" => self.rrule = Some(line.value),
            _ => {}
        }
    }
}

/// Read a calendar from iCalendar text.
///
/// `timezone_override` replaces the calendar's `X-WR-TIMEZONE`. Events that
/// cannot be read are logged and skipped.
///
/// # Errors
/// Fails if the text has no `VCALENDAR` or the declared timezone is unknown.
pub fn parse_calendar(text: &str, timezone_override: Option<Tz>) -> Result<Calendar> {
    let mut declared_tz: Option<String> = None;
    let mut pending: Vec<PendingEvent> = Vec::new();
    let mut current: Option<PendingEvent> = None;
    let mut seen_calendar = false;

    for (line_num, raw) in split_lines(text) {
        let line = match parse_content_line(&raw) {
            Some(line) => line,
            None => {
                debug!(line = line_num, "ignoring unparseable content line");
                continue;
            }
        };

        let name = line.name.clone();
        let in_event = current.is_some();
        match name.as_str() {
            "BEGIN" if line.value.eq_ignore_ascii_case("VCALENDAR") => seen_calendar = true,
            "BEGIN" if !in_event && line.value.eq_ignore_ascii_case("VEVENT") => {
                current = Some(PendingEvent {
                    line: line_num,
                    ..PendingEvent::default()
                });
            }
            "END" if line.value.eq_ignore_ascii_case("VEVENT") => pending.extend(current.take()),
            "X-WR-TIMEZONE" if !in_event => declared_tz = Some(line.value),
            _ => {
                if let Some(event) = current.as_mut() {
                    event.absorb(line);
                }
            }
        }
    }

    if !seen_calendar {
        bail!("input is not an iCalendar file (no BEGIN:VCALENDAR)");
    }

    let timezone = match (timezone_override, declared_tz) {
        (Some(tz), _) => Some(tz),
        (None, Some(name)) => Some(
            parse_timezone(&name).with_context(|| format!("Unknown X-WR-TIMEZONE '{}'", name))?,
        ),
        (None, None) => None,
    };
    let floating_tz = timezone.unwrap_or(Tz::UTC);

    let mut events = Vec::with_capacity(pending.len());
    for event in pending {
        let line = event.line;
        match into_occurrence(event, &floating_tz) {
            Ok(occurrence) => events.push(occurrence),
            Err(error) => warn!(line, %error, "skipping VEVENT"),
        }
    }

    debug!(events = events.len(), timezone = ?timezone, "read calendar");
    Ok(Calendar::new(timezone, events))
}

fn into_occurrence(event: PendingEvent, floating_tz: &Tz) -> Result<RawOccurrence> {
    let dtstart = event.dtstart.ok_or_else(|| anyhow!("missing DTSTART"))?;
    let start = parse_date_time(&dtstart, floating_tz)?;

    let end = match (event.dtend, event.duration) {
        (Some(dtend), _) => parse_date_time(&dtend, floating_tz)?,
        (None, Some(duration)) => start
            .checked_add_signed(parse_duration(&duration)?)
            .ok_or_else(|| anyhow!("DURATION '{}' overflows", duration))?,
        (None, None) => bail!("missing DTEND and DURATION"),
    };

    let user = event
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("missing SUMMARY (participant id)"))?;

    Ok(RawOccurrence {
        start,
        end,
        user,
        rrule: event.rrule,
    })
}

/// Split input into unfolded content lines, keeping 1-based line numbers.
///
/// Lines starting with SP/HTAB continue the previous line (RFC 5545 §3.1).
fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (i, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        if let Some(continuation) = line.strip_prefix([' ', '\t']) {
            if let Some((_, prev)) = lines.last_mut() {
                prev.push_str(continuation);
                continue;
            }
        }
        lines.push((i + 1, line.to_string()));
    }

    lines
}

/// Parse `name *(";" param) ":" value`. Quoted parameter values may contain
/// `:` and `;`.
fn parse_content_line(line: &str) -> Option<ContentLine> {
    let mut in_quotes = false;
    let mut colon = None;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                colon = Some(i);
                break;
            }
            _ => {}
        }
    }
    let colon = colon?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);

    let mut segments = split_unquoted(head, ';').into_iter();
    let name = segments.next()?.trim().to_ascii_uppercase();
    if name.is_empty() {
        return None;
    }

    let params = segments
        .filter_map(|segment| {
            let (k, v) = segment.split_once('=')?;
            Some((k.trim().to_ascii_uppercase(), v.trim().trim_matches('"').to_string()))
        })
        .collect();

    Some(ContentLine {
        name,
        params,
        value: value.to_string(),
    })
}

fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut begin = 0;
    for (i, c) in s.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            parts.push(&s[begin..i]);
            begin = i + c.len_utf8();
        }
    }
    parts.push(&s[begin..]);
    parts
}

/// Parse a DATE or DATE-TIME property into a zoned instant.
///
/// `...Z` is UTC, a `TZID` parameter names the zone, anything else is
/// floating and read in `floating_tz`. Dates become local midnight.
fn parse_date_time(line: &ContentLine, floating_tz: &Tz) -> Result<DateTime<Tz>> {
    let value = line.value.trim();
    let tz = match line.param("TZID") {
        Some(name) => {
            parse_timezone(name).with_context(|| format!("{} has unknown TZID '{}'", line.name, name))?
        }
        None => *floating_tz,
    };

    let is_date = line.param("VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
        || value.len() == 8;

    let naive = if is_date {
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .with_context(|| format!("invalid {} date '{}'", line.name, value))?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("invalid {} date '{}'", line.name, value))?
    } else if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .with_context(|| format!("invalid {} '{}'", line.name, value))?;
        return Ok(Tz::UTC.from_utc_datetime(&naive));
    } else {
        NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
            .with_context(|| format!("invalid {} '{}'", line.name, value))?
    };

    resolve_local(&tz, &naive)
        .ok_or_else(|| anyhow!("{} '{}' does not exist in {}", line.name, value, tz.name()))
}

/// Parse an RFC 5545 duration such as `PT8H`, `P1D` or `P1W`.
fn parse_duration(value: &str) -> Result<Duration> {
    let invalid = || anyhow!("invalid DURATION '{}'", value);

    let (negative, body) = match value.trim().strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.trim().trim_start_matches('+')),
    };
    let body = body.strip_prefix('P').ok_or_else(invalid)?;

    let mut total = Duration::zero();
    let mut digits = String::new();
    let mut in_time = false;
    for c in body.chars() {
        match c {
            'T' => in_time = true,
            '0'..='9' => digits.push(c),
            unit => {
                let n: i64 = digits.parse().map_err(|_| invalid())?;
                digits.clear();
                let part = match (unit, in_time) {
                    ('W', false) => Duration::try_weeks(n),
                    ('D', false) => Duration::try_days(n),
                    ('H', true) => Duration::try_hours(n),
                    ('M', true) => Duration::try_minutes(n),
                    ('S', true) => Duration::try_seconds(n),
                    _ => return Err(invalid()),
                };
                total = part
                    .and_then(|part| total.checked_add(&part))
                    .ok_or_else(invalid)?;
            }
        }
    }
    if !digits.is_empty() {
        return Err(invalid());
    }

    Ok(if negative { -total } else { total })
}

/// Decode TEXT escapes (`\\`, `\;`, `\,`, `\n`) in a single pass.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}
