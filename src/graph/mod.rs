//! --------------------------
//! Point Graph & Metadata (§4.3)
//! --------------------------
//! The metadata graph is populated once at load time and frozen; every
//! lookup after that point is read-only. Points and relations live in
//! flat arenas (`Vec<Point>`, `Vec<Relation>`) and are addressed by the
//! `PointIndex`/`RelationIndex` newtypes rather than shared pointers, so
//! the graph stays a single owned value with O(1) random access and no
//! interior mutability (§9 Design Notes).

pub mod metadata;
pub mod params;
pub mod point;
pub mod relation;

use std::collections::HashMap;

use uuid::Uuid;

pub use point::Point;
pub use relation::Relation;

use crate::error::{Error, Result};

/// Arena index into `PointGraph::points`. Never dereferenced across
/// graphs; stable only for the lifetime of the `PointGraph` it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointIndex(u32);

/// Arena index into `PointGraph::relations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationIndex(u32);

impl PointIndex {
    pub(crate) fn new(i: usize) -> Self {
        PointIndex(i as u32)
    }

    fn get(self) -> usize {
        self.0 as usize
    }
}

impl RelationIndex {
    pub(crate) fn new(i: usize) -> Self {
        RelationIndex(i as u32)
    }

    fn get(self) -> usize {
        self.0 as usize
    }
}

/// The immutable-once-frozen object graph (§3 Lifecycles). Built by
/// repeated `add_point`/`add_relation` calls during load, then `freeze()`
/// builds the name/UUID indices and runs `validate_points_relationships`.
#[derive(Debug, Clone, Default)]
pub struct PointGraph {
    points: Vec<Point>,
    relations: Vec<Relation>,
    by_uuid: HashMap<Uuid, PointIndex>,
    by_name: HashMap<String, PointIndex>,
    frozen: bool,
}

impl PointGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, point: Point) -> PointIndex {
        debug_assert!(!self.frozen, "cannot mutate a frozen PointGraph");
        let index = PointIndex::new(self.points.len());
        self.points.push(point);
        index
    }

    /// Adds a relation and wires it into both endpoints' input/result lists.
    pub fn add_relation(&mut self, relation: Relation) -> RelationIndex {
        debug_assert!(!self.frozen, "cannot mutate a frozen PointGraph");
        let index = RelationIndex::new(self.relations.len());
        let input = relation.input();
        let result = relation.result();
        self.relations.push(relation);
        self.points[input.get()].add_result(index);
        self.points[result.get()].add_input(index);
        index
    }

    pub fn point(&self, index: PointIndex) -> &Point {
        &self.points[index.get()]
    }

    pub fn point_mut(&mut self, index: PointIndex) -> &mut Point {
        &mut self.points[index.get()]
    }

    pub fn relation(&self, index: RelationIndex) -> &Relation {
        &self.relations[index.get()]
    }

    /// `getPointsCollection()` (§4.3).
    pub fn points(&self) -> impl Iterator<Item = (PointIndex, &Point)> {
        self.points.iter().enumerate().map(|(i, p)| (PointIndex::new(i), p))
    }

    /// `getPointByUUID(uuid)` (§4.3). Only meaningful after `freeze()`.
    pub fn get_point_by_uuid(&self, uuid: Uuid) -> Option<PointIndex> {
        self.by_uuid.get(&uuid).copied()
    }

    /// `getPointByName(name)` (§4.3); case-insensitive via an upper-cased index.
    pub fn get_point_by_name(&self, name: &str) -> Option<PointIndex> {
        self.by_name.get(&name.to_uppercase()).copied()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Builds the lookup indices and runs `validate_points_relationships`,
    /// then marks the graph immutable. Matches "fatal at startup" (§7): the
    /// only error this crate lets escape the loader boundary.
    pub fn freeze(mut self) -> Result<Self> {
        self.by_uuid.clear();
        self.by_name.clear();
        for (i, point) in self.points.iter().enumerate() {
            let index = PointIndex::new(i);
            self.by_uuid.insert(point.uuid(), index);
            self.by_name.insert(point.name().to_uppercase(), index);
        }
        self.frozen = true;
        self.validate_points_relationships()?;
        Ok(self)
    }

    /// `validatePointsRelationships()` (§4.3): the graph must be a DAG, every
    /// derived point's level must exceed every one of its inputs' levels,
    /// and every relation endpoint must resolve to a point that exists in
    /// this arena (always true here since `PointIndex` is arena-checked,
    /// but kept explicit for symmetry with a deserialized graph where a
    /// dangling index could appear before this check runs).
    fn validate_points_relationships(&self) -> Result<()> {
        let n = self.points.len();
        let mut indegree = vec![0u32; n];
        for relation in &self.relations {
            let result = relation.result().get();
            if result >= n || relation.input().get() >= n {
                return Err(Error::metadata_invalid("relation references a point outside the graph"));
            }
            indegree[result] += 1;
        }

        let mut queue: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        let mut indegree = indegree;
        while let Some(i) = queue.pop() {
            order.push(i);
            for relation in &self.relations {
                if relation.input().get() == i {
                    let result = relation.result().get();
                    indegree[result] -= 1;
                    if indegree[result] == 0 {
                        queue.push(result);
                    }
                }
            }
        }

        if order.len() != n {
            let stuck: Vec<&str> = (0..n)
                .filter(|&i| indegree[i] > 0)
                .map(|i| self.points[i].name())
                .collect();
            return Err(Error::metadata_invalid(format!(
                "point graph contains a cycle involving: {}",
                stuck.join(", ")
            )));
        }

        for relation in &self.relations {
            let input_level = self.points[relation.input().get()].level();
            let result_level = self.points[relation.result().get()].level();
            if result_level <= input_level {
                return Err(Error::metadata_invalid(format!(
                    "point {:?} (level {}) does not exceed its input {:?} (level {})",
                    self.points[relation.result().get()].name(),
                    result_level,
                    self.points[relation.input().get()].name(),
                    input_level
                )));
            }
        }

        Ok(())
    }
}
