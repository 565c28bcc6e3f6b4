//! Partition the event table into groups of identically shaped shifts.
//!
//! Grouping is two-level: first by [`ShiftShape`], then by each user's set of
//! worked weekdays. Two users with different weekday sets inside the same
//! shape fill different rotation slots and are never merged.

use crate::event::{NormalizedEvent, ShiftShape, WeekKey};
use crate::table::EventTable;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// A non-empty set of occurrences sharing one shape and weekday signature.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeGroup {
    pub shape: ShiftShape,
    /// Weekdays (1 = Monday) worked by every user in this group.
    pub weekdays: BTreeSet<u32>,
    /// Member occurrences in `(start_utc, user)` order.
    pub events: Vec<NormalizedEvent>,
    /// `(week, user)` pairs in time order, one entry per pair.
    pub weeks: Vec<(WeekKey, String)>,
    pub first_start: DateTime<Utc>,
    pub last_end: DateTime<Utc>,
}

impl ShapeGroup {
    /// Build a group from time-ordered member events. Returns `None` when
    /// `events` is empty.
    pub fn new(
        shape: ShiftShape,
        weekdays: BTreeSet<u32>,
        events: Vec<NormalizedEvent>,
    ) -> Option<Self> {
        let first_start = events.first()?.start_utc;
        let last_end = events.iter().map(|e| e.end_utc).max()?;

        let weeks = {
            let mut seen = HashSet::new();
            events
                .iter()
                .filter(|e| seen.insert((e.iso_week, e.user.as_str())))
                .map(|e| (e.iso_week, e.user.clone()))
                .collect()
        };

        Some(Self {
            shape,
            weekdays,
            events,
            weeks,
            first_start,
            last_end,
        })
    }

    /// Per-occurrence participants in time order.
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.user.as_str())
    }
}

/// Group `table` into shape groups, ordered by first occurrence.
pub fn group(table: &EventTable) -> Vec<ShapeGroup> {
    let mut partitions: Vec<(ShiftShape, Vec<&NormalizedEvent>)> = Vec::new();
    let mut partition_index: HashMap<ShiftShape, usize> = HashMap::new();

    for event in &table.events {
        let shape = event.shape();
        let slot = *partition_index.entry(shape.clone()).or_insert_with(|| {
            partitions.push((shape, Vec::new()));
            partitions.len() - 1
        });
        partitions[slot].1.push(event);
    }

    let mut groups = Vec::new();
    for (shape, members) in partitions {
        let mut signatures: HashMap<&str, BTreeSet<u32>> = HashMap::new();
        for event in &members {
            signatures
                .entry(event.user.as_str())
                .or_default()
                .insert(event.weekday);
        }

        let mut slots: Vec<(BTreeSet<u32>, Vec<NormalizedEvent>)> = Vec::new();
        let mut slot_index: HashMap<&BTreeSet<u32>, usize> = HashMap::new();
        for event in members {
            let signature = &signatures[event.user.as_str()];
            let slot = *slot_index.entry(signature).or_insert_with(|| {
                slots.push((signature.clone(), Vec::new()));
                slots.len() - 1
            });
            slots[slot].1.push(event.clone());
        }

        groups.extend(
            slots
                .into_iter()
                .filter_map(|(weekdays, events)| ShapeGroup::new(shape.clone(), weekdays, events)),
        );
    }

    groups.sort_by_key(|g| g.first_start);
    debug!(groups = groups.len(), "grouped events by shift shape");
    groups
}
