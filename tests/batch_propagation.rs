//! End-to-end check of the batch engine (§4.6, §8 scenario 5): a raw
//! sample on an input point propagates through a transform to its result
//! point and is visible on the downstream messaging bus after one commit.

#![cfg(feature = "cli")]

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use uuid::Uuid;

use rvpf_core::batch::messaging::channel::channel_messaging;
use rvpf_core::batch::messaging::Receiver as _;
use rvpf_core::batch::store::memory::InMemoryStore;
use rvpf_core::batch::{BatchEngine, ReceiverSource, RpnTransform};
use rvpf_core::graph::metadata;
use rvpf_core::graph::{Point, PointGraph, Relation};
use rvpf_core::temporal::{FixedClock, Timestamp};
use rvpf_core::value::point_value::PointValue;
use rvpf_core::value::tagged::Value;

#[test]
fn a_raw_sample_propagates_through_one_transform_to_its_result() {
    let input_uuid = Uuid::new_v4();
    let result_uuid = Uuid::new_v4();

    let mut graph = PointGraph::new();
    let input_idx = graph.add_point(Point::new(input_uuid, "Tank.Level", 0));
    let mut result_point = Point::new(result_uuid, "Tank.Scaled", 1);
    result_point.set_transform(Arc::new(RpnTransform::compile("$1 2 *").unwrap()));
    let result_idx = graph.add_point(result_point);
    graph.add_relation(Relation::new(input_idx, result_idx));
    let graph = Arc::new(metadata::load(graph).unwrap());

    let store = Arc::new(InMemoryStore::new());
    let (notice_tx, notice_rx) = channel_messaging(16);
    let (downstream_tx, downstream_rx) = channel_messaging(16);

    let engine = BatchEngine::new(
        graph,
        store,
        Some(Arc::new(downstream_tx)),
        Box::new(ReceiverSource::new(notice_rx)),
        FixedClock(Timestamp::from_millis(0)),
        Arc::new(AtomicBool::new(false)),
    );

    let t0 = Timestamp::from_millis(1_000);
    notice_tx.send(&[PointValue::new(input_uuid, t0, Some(Value::Long(5)))]).unwrap();
    notice_tx.send(&[PointValue::sentinel_null()]).unwrap();

    engine.run_once(100).unwrap(); // handles the raw value, enqueues the result
    engine.run_once(100).unwrap(); // drains and commits the batch

    let result = downstream_rx.receive(100).unwrap().expect("the result point should have emitted a value");
    assert_eq!(result.point(), result_uuid);
    assert_eq!(result.stamp(), t0);
    assert_eq!(result.value(), Some(&Value::Long(10)));
}
