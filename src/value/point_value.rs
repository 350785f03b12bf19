use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::temporal::Timestamp;
use crate::value::content::Content;
use crate::value::tagged::Value;

/// `(pointUUID, timestamp, state?, value?, deleted?)` (§3). Equality and
/// ordering consider only the first two fields: two values for the same
/// point at the same timestamp are the same logical update, the later
/// write replacing the earlier (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointValue {
    point: Uuid,
    stamp: Timestamp,
    state: Option<String>,
    value: Option<Value>,
    deleted: bool,
}

impl PointValue {
    pub fn new(point: Uuid, stamp: Timestamp, value: Option<Value>) -> Self {
        Self { point, stamp, state: None, value, deleted: false }
    }

    /// A delete tombstone for `(point, stamp)` (§4.4 `nullRemoves`).
    pub fn tombstone(point: Uuid, stamp: Timestamp) -> Self {
        Self { point, stamp, state: None, value: None, deleted: true }
    }

    /// The sentinel NULL used to flush a queue (§3); distinguished from a
    /// tombstone by carrying `Uuid::nil()` and `Timestamp::INVALID`.
    pub fn sentinel_null() -> Self {
        Self { point: Uuid::nil(), stamp: Timestamp::INVALID, state: None, value: None, deleted: false }
    }

    pub fn is_sentinel_null(&self) -> bool {
        self.point.is_nil() && self.stamp.is_invalid() && !self.deleted
    }

    pub fn point(&self) -> Uuid {
        self.point
    }

    pub fn stamp(&self) -> Timestamp {
        self.stamp
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Applies the point's codec `decode` (§4.4).
    pub fn decoded(&self, content: &dyn Content) -> crate::error::Result<PointValue> {
        content.decode(self)
    }

    /// Applies the point's codec `encode` (§4.4). Required to round-trip
    /// the output of `decoded()`.
    pub fn encoded(&self, content: &dyn Content) -> crate::error::Result<PointValue> {
        content.encode(self)
    }

    /// Applies the point's codec `normalize` (unit conversion to internal).
    pub fn normalized(&self, content: &dyn Content) -> crate::error::Result<PointValue> {
        content.normalize(self)
    }

    /// Applies the point's codec `denormalize`.
    pub fn denormalized(&self, content: &dyn Content) -> crate::error::Result<PointValue> {
        content.denormalize(self)
    }
}

impl PartialEq for PointValue {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point && self.stamp == other.stamp
    }
}
impl Eq for PointValue {}

impl PartialOrd for PointValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for PointValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.point, self.stamp).cmp(&(other.point, other.stamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_value_and_state() {
        let p = Uuid::new_v4();
        let t = Timestamp::from_raw(10);
        let a = PointValue::new(p, t, Some(Value::Long(1)));
        let b = PointValue::new(p, t, Some(Value::Long(2))).with_state("stale");
        assert_eq!(a, b);
    }

    #[test]
    fn different_timestamps_are_distinct() {
        let p = Uuid::new_v4();
        let a = PointValue::new(p, Timestamp::from_raw(10), None);
        let b = PointValue::new(p, Timestamp::from_raw(11), None);
        assert_ne!(a, b);
    }

    #[test]
    fn sentinel_null_is_recognizable() {
        assert!(PointValue::sentinel_null().is_sentinel_null());
        assert!(!PointValue::new(Uuid::new_v4(), Timestamp::from_raw(0), None).is_sentinel_null());
    }

    #[test]
    fn tombstone_carries_no_value() {
        let t = PointValue::tombstone(Uuid::new_v4(), Timestamp::from_raw(5));
        assert!(t.is_deleted());
        assert!(t.value().is_none());
    }
}
