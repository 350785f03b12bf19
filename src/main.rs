//! Demo processor: wires an in-memory `Store` and two `crossbeam_channel`
//! message buses around a two-point pipeline (`Tank.Level` -> `Tank.Scaled`)
//! and drives one batch through `BatchEngine`, printing the propagated
//! result (§8 scenario 5 "Batch propagation").
//!
//! ```bash
//! cargo run --features cli --bin rvpf-demo -- --factor 3
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
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

#[derive(Parser, Debug)]
#[command(author, version, about = "rvpf-core demo processor")]
struct Args {
    /// Multiplier applied by `Tank.Scaled`'s transform.
    #[arg(long, default_value_t = 2)]
    factor: i64,
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let input_uuid = Uuid::new_v4();
    let result_uuid = Uuid::new_v4();

    let mut graph = PointGraph::new();
    let input_idx = graph.add_point(Point::new(input_uuid, "Tank.Level", 0));
    let mut result_point = Point::new(result_uuid, "Tank.Scaled", 1);
    result_point
        .set_transform(Arc::new(RpnTransform::compile(&format!("$1 {} *", args.factor)).expect("valid program")));
    let result_idx = graph.add_point(result_point);
    graph.add_relation(Relation::new(input_idx, result_idx));

    let graph = metadata::load(graph).expect("metadata graph should be valid");
    println!("=== rvpf-core demo processor ===");
    println!("Tank.Level (raw)   -> Tank.Scaled (= Tank.Level * {})", args.factor);
    println!();

    let store = Arc::new(InMemoryStore::new());
    let (notice_tx, notice_rx) = channel_messaging(16);
    let (downstream_tx, downstream_rx) = channel_messaging(16);

    let engine = BatchEngine::new(
        Arc::new(graph),
        store.clone(),
        Some(Arc::new(downstream_tx)),
        Box::new(ReceiverSource::new(notice_rx)),
        FixedClock(Timestamp::from_millis(0)),
        Arc::new(AtomicBool::new(false)),
    );

    let t0 = Timestamp::from_millis(1_000);
    let sample = PointValue::new(input_uuid, t0, Some(Value::Long(5)));
    println!("injecting {} = {} at {t0:?}", "Tank.Level", 5);
    notice_tx.send(&[sample]).expect("demo channel should accept the sample");
    notice_tx.send(&[PointValue::sentinel_null()]).expect("demo channel should accept the flush");

    engine.run_once(100).expect("processing the raw sample should not fail");
    engine.run_once(100).expect("draining and committing the batch should not fail");

    match downstream_rx.receive(100).expect("demo channel receive should not fail") {
        Some(result) => println!("Tank.Scaled computed: {:?} at {:?}", result.value(), result.stamp()),
        None => println!("no result was emitted (unexpected for this demo)"),
    }
}
