//! Tests for bounded RRULE expansion.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use rotation_engine::{expand, Horizon, RecurrenceRule, RotationError};

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
    Tz::UTC.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn rule(text: &str) -> RecurrenceRule {
    RecurrenceRule::parse(text, &Tz::UTC).expect("rule should parse")
}

fn now(y: i32, m: u32, d: u32, h: u32) -> Horizon {
    Horizon::from_now(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
}

// ---------------------------------------------------------------------------
// Frequencies
// ---------------------------------------------------------------------------

#[test]
fn daily_until_is_inclusive() {
    let starts = expand(
        &rule("FREQ=DAILY;UNTIL=20260306T090000Z"),
        utc(2026, 2, 25, 9, 0),
        utc(2026, 2, 25, 17, 0),
        &now(2026, 3, 2, 0),
    )
    .expect("should expand");

    let expected: Vec<_> = (2..=6)
        .map(|d| Utc.with_ymd_and_hms(2026, 3, d, 9, 0, 0).unwrap())
        .collect();
    assert_eq!(starts, expected);
}

#[test]
fn weekly_byday_expands_each_listed_day() {
    let starts = expand(
        &rule("FREQ=WEEKLY;BYDAY=MO,WE,FR;UNTIL=20260313T235959Z"),
        utc(2026, 3, 2, 9, 0),
        utc(2026, 3, 2, 13, 0),
        &now(2026, 3, 1, 0),
    )
    .expect("should expand");

    let days: Vec<u32> = starts.iter().map(|s| chrono::Datelike::day(s)).collect();
    assert_eq!(days, vec![2, 4, 6, 9, 11, 13]);
}

#[test]
fn occurrence_exactly_at_now_is_included() {
    let starts = expand(
        &rule("FREQ=DAILY;UNTIL=20260303T090000Z"),
        utc(2026, 3, 1, 9, 0),
        utc(2026, 3, 1, 10, 0),
        &now(2026, 3, 2, 9),
    )
    .unwrap();

    assert_eq!(
        starts,
        vec![
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap(),
        ]
    );
}

#[test]
fn past_occurrences_are_not_emitted() {
    let starts = expand(
        &rule("FREQ=DAILY;UNTIL=20260301T000000Z"),
        utc(2026, 2, 1, 9, 0),
        utc(2026, 2, 1, 10, 0),
        &now(2026, 3, 2, 0),
    )
    .unwrap();

    assert!(starts.is_empty(), "a rule that ended before now yields nothing");
}

#[test]
fn unbounded_rule_is_capped_at_horizon() {
    let horizon = now(2026, 3, 2, 0);
    let starts = expand(
        &rule("FREQ=DAILY"),
        utc(2026, 3, 2, 9, 0),
        utc(2026, 3, 2, 17, 0),
        &horizon,
    )
    .unwrap();

    assert_eq!(starts.len(), 365);
    assert!(starts.iter().all(|s| *s <= horizon.end));
    assert_eq!(
        starts.last().copied(),
        Some(Utc.with_ymd_and_hms(2027, 3, 1, 9, 0, 0).unwrap())
    );
}

#[test]
fn until_beyond_horizon_is_capped_at_horizon() {
    let horizon = Horizon::new(Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(), 7).unwrap();
    let starts = expand(
        &rule("FREQ=DAILY;UNTIL=20301231T000000Z"),
        utc(2026, 3, 2, 9, 0),
        utc(2026, 3, 2, 17, 0),
        &horizon,
    )
    .unwrap();

    assert_eq!(starts.len(), 7);
    assert!(starts.iter().all(|s| *s <= horizon.end));
}

#[test]
fn output_is_strictly_increasing() {
    let starts = expand(
        &rule("FREQ=WEEKLY;BYDAY=TU,TH"),
        utc(2026, 1, 6, 22, 0),
        utc(2026, 1, 7, 6, 0),
        &now(2026, 3, 2, 0),
    )
    .unwrap();

    assert!(!starts.is_empty());
    assert!(starts.windows(2).all(|w| w[0] < w[1]));
}

// ---------------------------------------------------------------------------
// DST
// ---------------------------------------------------------------------------

#[test]
fn wall_clock_time_survives_dst_transition() {
    // Europe/Zurich springs forward on 2026-03-29.
    let zurich: Tz = "Europe/Zurich".parse().unwrap();
    let start = zurich.with_ymd_and_hms(2026, 3, 27, 9, 0, 0).unwrap();
    let end = start + Duration::hours(8);
    let rule = RecurrenceRule::parse("FREQ=DAILY;UNTIL=20260330T235959", &zurich).unwrap();

    let starts = expand(
        &rule,
        start,
        end,
        &Horizon::from_now(Utc.with_ymd_and_hms(2026, 3, 27, 0, 0, 0).unwrap()),
    )
    .unwrap();

    assert_eq!(
        starts,
        vec![
            Utc.with_ymd_and_hms(2026, 3, 27, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 28, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 29, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 30, 7, 0, 0).unwrap(),
        ]
    );
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn monthly_is_unsupported() {
    let err = expand(
        &rule("FREQ=MONTHLY"),
        utc(2026, 3, 2, 9, 0),
        utc(2026, 3, 2, 17, 0),
        &now(2026, 3, 1, 0),
    )
    .unwrap_err();

    assert_eq!(
        err,
        RotationError::UnsupportedRecurrence {
            frequency: "MONTHLY".to_string()
        }
    );
}

#[test]
fn until_before_start_is_malformed() {
    let err = expand(
        &rule("FREQ=DAILY;UNTIL=20260101T000000Z"),
        utc(2026, 3, 2, 9, 0),
        utc(2026, 3, 2, 17, 0),
        &now(2026, 3, 1, 0),
    )
    .unwrap_err();

    assert!(matches!(err, RotationError::MalformedRule(_)));
}

#[test]
fn end_before_start_is_malformed() {
    let err = expand(
        &rule("FREQ=DAILY"),
        utc(2026, 3, 2, 17, 0),
        utc(2026, 3, 2, 9, 0),
        &now(2026, 3, 1, 0),
    )
    .unwrap_err();

    assert!(matches!(err, RotationError::MalformedRule(_)));
}

// ---------------------------------------------------------------------------
// Horizon bounds
// ---------------------------------------------------------------------------

#[test]
fn negative_or_unrepresentable_horizon_is_rejected() {
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();

    assert_eq!(
        Horizon::new(now, -1).unwrap_err(),
        RotationError::InvalidHorizon { days: -1 }
    );
    assert_eq!(
        Horizon::new(now, i64::MAX).unwrap_err(),
        RotationError::InvalidHorizon { days: i64::MAX }
    );
}

#[test]
fn century_horizon_expands_every_day() {
    let horizon = Horizon::new(Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(), 36_500).unwrap();
    let starts = expand(
        &rule("FREQ=DAILY"),
        utc(2026, 3, 2, 9, 0),
        utc(2026, 3, 2, 17, 0),
        &horizon,
    )
    .unwrap();

    assert_eq!(starts.len(), 36_500);
    assert!(starts.windows(2).all(|w| w[1] - w[0] == Duration::days(1)));
}
