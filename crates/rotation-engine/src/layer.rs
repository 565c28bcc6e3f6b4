//! Layer assembly and the emitted record shape.

use crate::classifier::{Cadence, Rotation};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// A numbered rotation, in group-discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationLayer {
    /// 1-based position among the calendar's layers.
    pub index: usize,
    pub cadence: Cadence,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub rotation_virtual_start: DateTime<Utc>,
    pub rotation_turn_length_seconds: u32,
    pub users: Vec<String>,
}

impl RotationLayer {
    pub fn name(&self) -> String {
        format!("Layer {}", self.index)
    }

    /// Render the layer with local-format timestamps in `tz`.
    pub fn to_record(&self, tz: &Tz) -> LayerRecord {
        LayerRecord {
            name: self.name(),
            start: local_timestamp(self.start, tz),
            end: self.end.map(|end| local_timestamp(end, tz)),
            rotation_virtual_start: local_timestamp(self.rotation_virtual_start, tz),
            rotation_turn_length_seconds: self.rotation_turn_length_seconds,
            users: self.users.iter().map(UserReference::new).collect(),
        }
    }
}

/// Reference to a participant in the emitted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserReference {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl UserReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "user_reference",
        }
    }
}

/// The serialized form of a [`RotationLayer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerRecord {
    pub name: String,
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    pub rotation_virtual_start: String,
    pub rotation_turn_length_seconds: u32,
    pub users: Vec<UserReference>,
}

/// Number classified rotations as layers, preserving their order.
pub fn assemble(rotations: Vec<Rotation>) -> Vec<RotationLayer> {
    rotations
        .into_iter()
        .enumerate()
        .map(|(i, rotation)| RotationLayer {
            index: i + 1,
            cadence: rotation.cadence,
            start: rotation.start,
            end: rotation.end,
            rotation_virtual_start: rotation.rotation_virtual_start,
            rotation_turn_length_seconds: rotation.rotation_turn_length_seconds,
            users: rotation.users,
        })
        .collect()
}

fn local_timestamp(instant: DateTime<Utc>, tz: &Tz) -> String {
    instant
        .with_timezone(tz)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}
