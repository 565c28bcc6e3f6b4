//! Rotation classification: handover cadence and minimal participant cycle.

use crate::grouping::ShapeGroup;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::collections::HashSet;

/// How often the rotation hands over to the next participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
}

impl Cadence {
    pub const DAY_SECONDS: u32 = 86_400;
    pub const WEEK_SECONDS: u32 = 604_800;

    pub fn turn_length_seconds(self) -> u32 {
        match self {
            Cadence::Daily => Self::DAY_SECONDS,
            Cadence::Weekly => Self::WEEK_SECONDS,
        }
    }
}

/// A classified group, before it is numbered as a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    pub cadence: Cadence,
    pub start: DateTime<Utc>,
    pub rotation_virtual_start: DateTime<Utc>,
    pub rotation_turn_length_seconds: u32,
    /// One minimal repeating unit of participants. May name a user twice if
    /// the period requires it.
    pub users: Vec<String>,
    /// Latest `UNTIL` bound, present only when every member had one.
    pub end: Option<DateTime<Utc>>,
}

/// Decide the handover cadence of `group`.
///
/// Weekly when the group spans more than one occurrence and every ISO week in
/// it maps to exactly one user; daily otherwise. A lone occurrence carries no
/// handover information and is treated as daily.
pub fn cadence(group: &ShapeGroup) -> Cadence {
    if group.events.len() < 2 {
        return Cadence::Daily;
    }

    let mut week_users: HashMap<_, HashSet<&str>> = HashMap::new();
    for (week, user) in &group.weeks {
        week_users.entry(*week).or_default().insert(user.as_str());
    }

    if week_users.values().all(|users| users.len() == 1) {
        Cadence::Weekly
    } else {
        Cadence::Daily
    }
}

/// The ordered participant sequence the cycle is searched in.
///
/// Weekly: one user per week, by week. Daily: one user per occurrence.
pub fn participant_sequence(group: &ShapeGroup, cadence: Cadence) -> Vec<&str> {
    match cadence {
        Cadence::Weekly => group.weeks.iter().map(|(_, user)| user.as_str()).collect(),
        Cadence::Daily => group.users().collect(),
    }
}

/// Shortest prefix of `sequence` whose repetition, truncated to
/// `sequence.len()`, reproduces `sequence` exactly.
///
/// Candidates are tried in increasing length, so the smallest period wins.
/// Falls back to the whole sequence when no shorter period exists.
pub fn rotation_pattern<T: PartialEq>(sequence: &[T]) -> &[T] {
    (1..sequence.len())
        .find(|&k| is_period(sequence, k))
        .map_or(sequence, |k| &sequence[..k])
}

/// `true` when `sequence[i] == sequence[i % k]` for every index.
pub fn is_period<T: PartialEq>(sequence: &[T], k: usize) -> bool {
    k > 0
        && sequence
            .iter()
            .enumerate()
            .all(|(i, item)| *item == sequence[i % k])
}

/// Classify one group into a rotation.
pub fn classify(group: &ShapeGroup) -> Rotation {
    let cadence = cadence(group);
    let sequence = participant_sequence(group, cadence);
    let users = rotation_pattern(&sequence)
        .iter()
        .map(|u| u.to_string())
        .collect();

    let end = group
        .events
        .iter()
        .map(|e| e.until)
        .collect::<Option<Vec<_>>>()
        .and_then(|bounds| bounds.into_iter().max());

    Rotation {
        cadence,
        start: group.first_start,
        rotation_virtual_start: group.first_start,
        rotation_turn_length_seconds: cadence.turn_length_seconds(),
        users,
        end,
    }
}
