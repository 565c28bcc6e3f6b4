//! Tests for RRULE value parsing.

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use rotation_engine::{Frequency, RecurrenceRule, RotationError};

#[test]
fn parses_weekly_rule_with_byday_and_utc_until() {
    let rule = RecurrenceRule::parse("FREQ=WEEKLY;UNTIL=20261231T235959Z;BYDAY=MO,WE,FR", &Tz::UTC)
        .expect("should parse");

    assert_eq!(rule.frequency, Frequency::Weekly);
    assert_eq!(
        rule.until,
        Some(Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap())
    );
    assert_eq!(rule.by_day, vec!["MO", "WE", "FR"]);
}

#[test]
fn unbounded_text_drops_until_only() {
    let rule = RecurrenceRule::parse("FREQ=DAILY;INTERVAL=2;UNTIL=20261231T000000Z;COUNT=4", &Tz::UTC)
        .expect("should parse");

    assert_eq!(rule.unbounded_text(), "FREQ=DAILY;INTERVAL=2;COUNT=4");
}

#[test]
fn day_pattern_is_sorted_and_deduplicated() {
    let rule = RecurrenceRule::parse("FREQ=WEEKLY;BYDAY=WE,MO,FR,MO", &Tz::UTC).unwrap();

    assert_eq!(rule.day_pattern(), vec!["FR", "MO", "WE"]);
}

#[test]
fn lowercase_and_rrule_prefix_are_accepted() {
    let rule = RecurrenceRule::parse("RRULE:freq=daily;byday=tu", &Tz::UTC).unwrap();

    assert_eq!(rule.frequency, Frequency::Daily);
    assert_eq!(rule.by_day, vec!["TU"]);
}

#[test]
fn floating_until_uses_the_given_timezone() {
    let zurich: Tz = "Europe/Zurich".parse().unwrap();
    let rule = RecurrenceRule::parse("FREQ=DAILY;UNTIL=20260115T090000", &zurich).unwrap();

    // 09:00 CET == 08:00 UTC
    assert_eq!(
        rule.until,
        Some(Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap())
    );
}

#[test]
fn floating_until_inside_dst_gap_uses_offset_before_the_gap() {
    let zurich: Tz = "Europe/Zurich".parse().unwrap();
    // 02:30 does not exist on 2026-03-29 in Zurich; read it at +01:00.
    let rule = RecurrenceRule::parse("FREQ=DAILY;UNTIL=20260329T023000", &zurich)
        .expect("a nonexistent local UNTIL is still a valid bound");

    assert_eq!(
        rule.until,
        Some(Utc.with_ymd_and_hms(2026, 3, 29, 1, 30, 0).unwrap())
    );
}

#[test]
fn date_only_until_covers_the_whole_day() {
    let rule = RecurrenceRule::parse("FREQ=DAILY;UNTIL=20260115", &Tz::UTC).unwrap();

    assert_eq!(
        rule.until,
        Some(Utc.with_ymd_and_hms(2026, 1, 15, 23, 59, 59).unwrap())
    );
}

#[test]
fn monthly_is_parsed_as_other_frequency() {
    let rule = RecurrenceRule::parse("FREQ=MONTHLY;BYMONTHDAY=1", &Tz::UTC).unwrap();

    assert_eq!(rule.frequency, Frequency::Other("MONTHLY".to_string()));
    assert!(!rule.frequency.is_supported());
}

#[test]
fn missing_freq_is_malformed() {
    let err = RecurrenceRule::parse("BYDAY=MO", &Tz::UTC).unwrap_err();
    assert!(matches!(err, RotationError::MalformedRule(_)));
}

#[test]
fn empty_rule_is_malformed() {
    let err = RecurrenceRule::parse("   ", &Tz::UTC).unwrap_err();
    assert!(matches!(err, RotationError::MalformedRule(_)));
}

#[test]
fn part_without_equals_is_malformed() {
    let err = RecurrenceRule::parse("FREQ=DAILY;BOGUS", &Tz::UTC).unwrap_err();
    assert!(matches!(err, RotationError::MalformedRule(_)));
}

#[test]
fn garbage_until_is_malformed() {
    let err = RecurrenceRule::parse("FREQ=DAILY;UNTIL=tomorrow", &Tz::UTC).unwrap_err();
    assert!(matches!(err, RotationError::MalformedRule(_)));
}
