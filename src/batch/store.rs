//! Value store collaborator (§1, §6): "consumes `PointValue`s, answers
//! range queries." Out of scope as an implementation — the core only
//! depends on this trait — but the `cli` feature ships an in-memory
//! reference implementation so the demo binary and integration tests can
//! drive the batch engine without a real store.

use std::fmt;

use uuid::Uuid;

use crate::error::Result;
use crate::temporal::{TimeInterval, Timestamp};
use crate::value::point_value::PointValue;

/// `store.put(values)`, `store.getRange(point, interval)`,
/// `store.getLatest(point)` (§1), plus `purge`/`commit` (§6).
pub trait Store: fmt::Debug + Send + Sync {
    /// Idempotent on `(uuid, timestamp)` (§6).
    fn put(&self, values: &[PointValue]) -> Result<()>;

    /// Ascending by timestamp (§6).
    fn get_range(&self, point: Uuid, interval: TimeInterval, limit: Option<usize>) -> Result<Vec<PointValue>>;

    /// The latest value at or before `at_or_before`, or the latest value
    /// overall when `at_or_before` is `None`.
    fn get_latest(&self, point: Uuid, at_or_before: Option<Timestamp>) -> Result<Option<PointValue>>;

    fn purge(&self, point: Uuid, interval: TimeInterval) -> Result<usize>;

    /// Flushes pending writes; blocks until durable (§6).
    fn commit(&self) -> Result<()>;
}

#[cfg(feature = "cli")]
pub mod memory {
    //! `InMemoryStore` (§10 Ambient Stack): a `dashmap`-backed reference
    //! `Store` for the demo binary and integration tests. Not part of the
    //! contract — any real deployment supplies its own `Store`.

    use dashmap::DashMap;

    use super::*;

    #[derive(Debug, Default)]
    pub struct InMemoryStore {
        values: DashMap<Uuid, Vec<PointValue>>,
    }

    impl InMemoryStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl Store for InMemoryStore {
        fn put(&self, values: &[PointValue]) -> Result<()> {
            for value in values {
                let mut series = self.values.entry(value.point()).or_default();
                match series.binary_search_by_key(&value.stamp(), |v: &PointValue| v.stamp()) {
                    Ok(i) => series[i] = value.clone(),
                    Err(i) => series.insert(i, value.clone()),
                }
            }
            Ok(())
        }

        fn get_range(&self, point: Uuid, interval: TimeInterval, limit: Option<usize>) -> Result<Vec<PointValue>> {
            let Some(series) = self.values.get(&point) else {
                return Ok(Vec::new());
            };
            let mut out: Vec<PointValue> =
                series.iter().filter(|v| interval.contains(v.stamp())).cloned().collect();
            if let Some(limit) = limit {
                out.truncate(limit);
            }
            Ok(out)
        }

        fn get_latest(&self, point: Uuid, at_or_before: Option<Timestamp>) -> Result<Option<PointValue>> {
            let Some(series) = self.values.get(&point) else {
                return Ok(None);
            };
            let found = match at_or_before {
                Some(t) => series.iter().rev().find(|v| v.stamp() <= t),
                None => series.last(),
            };
            Ok(found.cloned())
        }

        fn purge(&self, point: Uuid, interval: TimeInterval) -> Result<usize> {
            let Some(mut series) = self.values.get_mut(&point) else {
                return Ok(0);
            };
            let before = series.len();
            series.retain(|v| !interval.contains(v.stamp()));
            Ok(before - series.len())
        }

        fn commit(&self) -> Result<()> {
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::value::tagged::Value;

        #[test]
        fn put_is_idempotent_on_point_and_timestamp() {
            let store = InMemoryStore::new();
            let point = Uuid::new_v4();
            let t = Timestamp::from_raw(10);
            store.put(&[PointValue::new(point, t, Some(Value::Long(1)))]).unwrap();
            store.put(&[PointValue::new(point, t, Some(Value::Long(2)))]).unwrap();
            let latest = store.get_latest(point, None).unwrap().unwrap();
            assert_eq!(latest.value(), Some(&Value::Long(2)));
        }

        #[test]
        fn get_range_is_ascending_and_bounded() {
            let store = InMemoryStore::new();
            let point = Uuid::new_v4();
            for raw in [30, 10, 20] {
                store.put(&[PointValue::new(point, Timestamp::from_raw(raw), Some(Value::Long(raw)))]).unwrap();
            }
            let values = store
                .get_range(point, TimeInterval::new(Timestamp::from_raw(0), Timestamp::from_raw(25)), None)
                .unwrap();
            let stamps: Vec<i64> = values.iter().map(|v| v.stamp().raw()).collect();
            assert_eq!(stamps, vec![10, 20]);
        }

        #[test]
        fn purge_removes_values_in_interval() {
            let store = InMemoryStore::new();
            let point = Uuid::new_v4();
            store.put(&[PointValue::new(point, Timestamp::from_raw(10), Some(Value::Long(1)))]).unwrap();
            let removed = store
                .purge(point, TimeInterval::new(Timestamp::from_raw(0), Timestamp::from_raw(20)))
                .unwrap();
            assert_eq!(removed, 1);
            assert!(store.get_latest(point, None).unwrap().is_none());
        }
    }
}
