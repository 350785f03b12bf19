//! Batch engine throughput (§4.6) over a small fan-out graph: one raw
//! input feeding several independent transforms, driven notice by
//! notice through `BatchEngine::run_once`.
//!
//! These benches don't require the `cli` feature, so the `Store`,
//! `Sender`, and `NoticeSource` collaborators below are minimal
//! in-process stand-ins rather than the `dashmap`/`crossbeam-channel`
//! reference implementations under that feature.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

use rvpf_core::batch::{BatchEngine, Notice, NoticeSource, RpnTransform};
use rvpf_core::error::Result;
use rvpf_core::graph::metadata;
use rvpf_core::graph::{Point, PointGraph, Relation};
use rvpf_core::temporal::{FixedClock, TimeInterval, Timestamp};
use rvpf_core::value::point_value::PointValue;
use rvpf_core::value::tagged::Value;

#[derive(Debug, Default)]
struct VecStore {
    values: RefCell<HashMap<Uuid, Vec<PointValue>>>,
}

impl rvpf_core::batch::store::Store for VecStore {
    fn put(&self, values: &[PointValue]) -> Result<()> {
        let mut map = self.values.borrow_mut();
        for value in values {
            map.entry(value.point()).or_default().push(value.clone());
        }
        Ok(())
    }

    fn get_range(&self, point: Uuid, interval: TimeInterval, limit: Option<usize>) -> Result<Vec<PointValue>> {
        let map = self.values.borrow();
        let mut out: Vec<PointValue> = map
            .get(&point)
            .map(|series| series.iter().filter(|v| interval.contains(v.stamp())).cloned().collect())
            .unwrap_or_default();
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    fn get_latest(&self, point: Uuid, at_or_before: Option<Timestamp>) -> Result<Option<PointValue>> {
        let map = self.values.borrow();
        let Some(series) = map.get(&point) else {
            return Ok(None);
        };
        let found = match at_or_before {
            Some(t) => series.iter().rev().find(|v| v.stamp() <= t),
            None => series.last(),
        };
        Ok(found.cloned())
    }

    fn purge(&self, _point: Uuid, _interval: TimeInterval) -> Result<usize> {
        Ok(0)
    }

    fn commit(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct VecSender {
    sent: RefCell<Vec<PointValue>>,
}

impl rvpf_core::batch::messaging::Sender for VecSender {
    fn send(&self, values: &[PointValue]) -> Result<()> {
        self.sent.borrow_mut().extend_from_slice(values);
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Yields a fixed, pre-seeded sequence of notices, one per `next_notice`
/// call, and `None` once exhausted -- no blocking, no channel.
#[derive(Debug)]
struct QueueSource {
    notices: RefCell<VecDeque<Notice>>,
}

impl QueueSource {
    fn new(notices: Vec<Notice>) -> Self {
        Self { notices: RefCell::new(notices.into()) }
    }
}

impl NoticeSource for QueueSource {
    fn next_notice(&self, _timeout_ms: u64) -> Result<Option<Notice>> {
        Ok(self.notices.borrow_mut().pop_front())
    }
}

/// A raw input point feeding `fan_out` independent `$1 * 2` transforms.
fn fan_out_graph(fan_out: usize) -> (Arc<PointGraph>, Uuid, Vec<Uuid>) {
    let input_uuid = Uuid::new_v4();
    let mut graph = PointGraph::new();
    let input_idx = graph.add_point(Point::new(input_uuid, "Input", 0));

    let mut result_uuids = Vec::with_capacity(fan_out);
    for n in 0..fan_out {
        let result_uuid = Uuid::new_v4();
        let mut result_point = Point::new(result_uuid, format!("Result.{n}"), 1);
        result_point.set_transform(Arc::new(RpnTransform::compile("$1 2 *").unwrap()));
        let result_idx = graph.add_point(result_point);
        graph.add_relation(Relation::new(input_idx, result_idx));
        result_uuids.push(result_uuid);
    }

    (Arc::new(metadata::load(graph).unwrap()), input_uuid, result_uuids)
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_fan_out");

    for fan_out in [1usize, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(fan_out), &fan_out, |b, &fan_out| {
            let (graph, input_uuid, _) = fan_out_graph(fan_out);

            b.iter(|| {
                let store = Arc::new(VecStore::default());
                let sender = Arc::new(VecSender::default());
                let notices = vec![
                    Notice::Value(PointValue::new(input_uuid, Timestamp::from_millis(1_000), Some(Value::Long(5)))),
                    Notice::Null,
                ];
                let source = Box::new(QueueSource::new(notices));

                let engine = BatchEngine::new(
                    graph.clone(),
                    store,
                    Some(sender.clone()),
                    source,
                    FixedClock(Timestamp::from_millis(0)),
                    Arc::new(AtomicBool::new(false)),
                );

                engine.run_once(0).unwrap();
                engine.run_once(0).unwrap();
                black_box(sender.sent.borrow().len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fan_out);
criterion_main!(benches);
