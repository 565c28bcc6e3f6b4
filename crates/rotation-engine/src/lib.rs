//! # rotation-engine
//!
//! Infers on-call rotation layers from a calendar's shift events.
//!
//! Recurring and one-off shifts are expanded within a bounded horizon,
//! normalized, grouped by shift shape, and reduced to the shortest participant
//! cycle that reproduces the observed assignments exactly.
//!
//! ## Modules
//!
//! - [`calendar`] — Structured calendar input (occurrences + declared timezone)
//! - [`rule`] — RRULE value → [`RecurrenceRule`]
//! - [`expander`] — Bounded RRULE expansion into start instants
//! - [`event`] — Occurrence normalization and shift shapes
//! - [`table`] — Time-ordered event table with per-event failure containment
//! - [`grouping`] — Shape + weekday-signature partitioning
//! - [`classifier`] — Handover cadence and minimal rotation cycle
//! - [`layer`] — Layer numbering and the emitted record shape
//! - [`error`] — Error types

pub mod calendar;
pub mod classifier;
pub mod error;
pub mod event;
pub mod expander;
pub mod grouping;
pub mod layer;
pub mod rule;
pub mod table;

pub use calendar::{parse_timezone, resolve_local, Calendar, RawOccurrence};
pub use classifier::{classify, rotation_pattern, Cadence, Rotation};
pub use error::RotationError;
pub use event::{normalize, NormalizedEvent, ShiftShape, WeekKey};
pub use expander::{expand, Horizon, DEFAULT_HORIZON_DAYS, MAX_INSTANCES};
pub use grouping::{group, ShapeGroup};
pub use layer::{assemble, LayerRecord, RotationLayer, UserReference};
pub use rule::{Frequency, RecurrenceRule};
pub use table::{build, EventTable, RejectedEvent};

use chrono::{DateTime, Utc};
use tracing::debug;

/// Inputs that would otherwise be ambient: the reference instant and the
/// expansion horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub now: DateTime<Utc>,
    pub horizon_days: i64,
}

impl PipelineOptions {
    /// Options anchored at `now` with the default 365-day horizon.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }

    pub fn with_horizon_days(mut self, days: i64) -> Self {
        self.horizon_days = days;
        self
    }

    /// # Errors
    /// Returns `RotationError::InvalidHorizon` for a negative or out-of-range
    /// `horizon_days`.
    pub fn horizon(&self) -> error::Result<Horizon> {
        Horizon::new(self.now, self.horizon_days)
    }
}

/// Run the full pipeline: build the event table, group it, classify every
/// group and number the resulting layers.
///
/// # Errors
/// Returns `RotationError::EmptyCalendar` if no event yields an occurrence, or
/// `RotationError::InvalidHorizon` if the options' horizon is out of range.
/// Per-event failures never surface here; see [`detect_layers_with_table`] to
/// inspect rejected events.
pub fn detect_layers(
    calendar: &Calendar,
    options: &PipelineOptions,
) -> error::Result<Vec<RotationLayer>> {
    detect_layers_with_table(calendar, options).map(|(layers, _)| layers)
}

/// Same as [`detect_layers`], also returning the event table the layers were
/// derived from.
///
/// # Errors
/// Returns `RotationError::EmptyCalendar` if no event yields an occurrence.
pub fn detect_layers_with_table(
    calendar: &Calendar,
    options: &PipelineOptions,
) -> error::Result<(Vec<RotationLayer>, EventTable)> {
    let table = build(calendar, &options.horizon()?)?;
    let rotations = group(&table).iter().map(classify).collect();
    let layers = assemble(rotations);
    debug!(layers = layers.len(), "detected rotation layers");
    Ok((layers, table))
}

/// Render layers as records with timestamps in the calendar's timezone.
pub fn render_layers(layers: &[RotationLayer], calendar: &Calendar) -> Vec<LayerRecord> {
    let tz = calendar.reference_timezone();
    layers.iter().map(|layer| layer.to_record(&tz)).collect()
}
