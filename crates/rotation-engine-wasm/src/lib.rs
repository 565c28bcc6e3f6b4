//! WASM bindings for rotation-engine.
//!
//! Exposes rotation layer detection and bounded RRULE expansion to JavaScript
//! via `wasm-bindgen`. All complex types are passed as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p rotation-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/rotation-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/rotation_engine_wasm.wasm
//! ```

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rotation_engine::{
    parse_timezone, Calendar, Horizon, PipelineOptions, RawOccurrence, RecurrenceRule,
    RotationError,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

/// Calendar format passed from JavaScript.
#[derive(Deserialize)]
struct CalendarInput {
    /// Declared calendar timezone (IANA name).
    #[serde(default)]
    timezone: Option<String>,
    events: Vec<EventInput>,
}

#[derive(Deserialize)]
struct EventInput {
    start: String,
    end: String,
    user: String,
    #[serde(default)]
    rrule: Option<String>,
    /// Zone the event was authored in; defaults to the calendar timezone.
    #[serde(default)]
    timezone: Option<String>,
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_tz(name: &str) -> Result<Tz, JsValue> {
    parse_timezone(name).map_err(js_error)
}

/// Parse an ISO 8601 datetime string into a zoned datetime in `tz`.
///
/// RFC 3339 strings (with offset) are converted into `tz`; naive strings
/// (e.g., "2026-03-02T09:00:00") are read as wall-clock time in `tz`.
fn parse_datetime(s: &str, tz: &Tz) -> Result<DateTime<Tz>, JsValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(tz));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| JsValue::from_str(&format!("Invalid datetime '{}': {}", s, e)))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| JsValue::from_str(&format!("'{}' does not exist in {}", s, tz.name())))
}

fn parse_now(now: &str) -> Result<DateTime<Utc>, JsValue> {
    Ok(parse_datetime(now, &Tz::UTC)?.with_timezone(&Utc))
}

fn parse_calendar_json(json: &str) -> Result<Calendar, JsValue> {
    let input: CalendarInput = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid calendar JSON: {}", e)))?;

    let timezone = input.timezone.as_deref().map(parse_tz).transpose()?;
    let default_tz = timezone.unwrap_or(Tz::UTC);

    let events = input
        .events
        .into_iter()
        .map(|event| {
            let tz = match event.timezone.as_deref() {
                Some(name) => parse_tz(name)?,
                None => default_tz,
            };
            Ok(RawOccurrence {
                start: parse_datetime(&event.start, &tz)?,
                end: parse_datetime(&event.end, &tz)?,
                user: event.user,
                rrule: event.rrule,
            })
        })
        .collect::<Result<Vec<_>, JsValue>>()?;

    Ok(Calendar::new(timezone, events))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Detect rotation layers in a calendar.
///
/// `calendar_json` is `{timezone?, events: [{start, end, user, rrule?, timezone?}]}`.
/// `now` is the reference instant (ISO 8601). Returns a JSON array of layer
/// records; an empty calendar yields `[]`.
#[wasm_bindgen(js_name = "detectLayers")]
pub fn detect_layers(
    calendar_json: &str,
    now: &str,
    horizon_days: Option<u32>,
) -> Result<String, JsValue> {
    let calendar = parse_calendar_json(calendar_json)?;
    let mut options = PipelineOptions::at(parse_now(now)?);
    if let Some(days) = horizon_days {
        options = options.with_horizon_days(i64::from(days));
    }

    let records = match rotation_engine::detect_layers(&calendar, &options) {
        Ok(layers) => rotation_engine::render_layers(&layers, &calendar),
        Err(RotationError::EmptyCalendar) => Vec::new(),
        Err(e) => return Err(js_error(e)),
    };

    serde_json::to_string(&records)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Expand an RRULE into the occurrence start instants between `now` and the
/// horizon.
///
/// # Arguments
/// - `rrule` -- RFC 5545 RRULE value (e.g., "FREQ=WEEKLY;BYDAY=MO,WE,FR")
/// - `dtstart` -- Local datetime string of the first occurrence
/// - `duration_minutes` -- Shift length in minutes
/// - `timezone` -- IANA timezone of `dtstart`
/// - `now` -- Reference instant (ISO 8601)
///
/// Returns a JSON array of RFC 3339 UTC start instants.
#[wasm_bindgen(js_name = "expandRule")]
pub fn expand_rule(
    rrule: &str,
    dtstart: &str,
    duration_minutes: u32,
    timezone: &str,
    now: &str,
) -> Result<String, JsValue> {
    let tz = parse_tz(timezone)?;
    let rule = RecurrenceRule::parse(rrule, &tz).map_err(js_error)?;
    let start = parse_datetime(dtstart, &tz)?;
    let end = start + Duration::minutes(i64::from(duration_minutes));

    let starts = rotation_engine::expand(&rule, start, end, &Horizon::from_now(parse_now(now)?))
        .map_err(js_error)?;

    let out: Vec<String> = starts.iter().map(|s| s.to_rfc3339()).collect();
    serde_json::to_string(&out)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
