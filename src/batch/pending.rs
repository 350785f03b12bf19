//! Per-batch pending work set (§4.6 step 4): "Drain the pending set in
//! level order (strictly ascending `point.level`); within one level, order
//! is unspecified but must be deterministic given the same notice stream
//! (the implementation shall use stable insertion order per point)."

use std::collections::{BTreeMap, HashSet};

use crate::graph::{PointGraph, PointIndex};
use crate::temporal::Timestamp;

/// Accumulates `(PointIndex, Timestamp)` work across one or more notices,
/// grouped by level (a `BTreeMap` key, so iteration is ascending) with
/// stable insertion order preserved within each level's `Vec`. A
/// `(point, stamp)` pair already pending is not added twice (§4.6 "add
/// each (resultPoint, stamp) to the pending set" — set semantics).
#[derive(Debug, Default)]
pub struct PendingSet {
    by_level: BTreeMap<u32, Vec<(PointIndex, Timestamp)>>,
    seen: HashSet<(PointIndex, Timestamp)>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, graph: &PointGraph, point: PointIndex, stamp: Timestamp) {
        if !self.seen.insert((point, stamp)) {
            return;
        }
        let level = graph.point(point).level();
        self.by_level.entry(level).or_default().push((point, stamp));
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Drains every pending entry in ascending level order, stable within
    /// a level, leaving the set empty for the next batch.
    pub fn drain(&mut self) -> Vec<(PointIndex, Timestamp)> {
        self.seen.clear();
        std::mem::take(&mut self.by_level).into_values().flatten().collect()
    }
}
