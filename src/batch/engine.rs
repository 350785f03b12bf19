//! The batch engine (§4.6): "the control plane... for each affected
//! result point assembles its inputs via the point graph and sync, runs
//! the transform..., and emits the computed value downstream."
//!
//! Single-threaded cooperative per instance (§5): one `BatchEngine` owns
//! its `PendingSet`, write-through buffer, and per-point `Filter` state
//! behind `RefCell`, not a lock — "only the batch engine touches them."

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::filter::{self, Filter};
use crate::graph::{Point, PointGraph, PointIndex};
use crate::sync::SyncCursor;
use crate::temporal::{Clock, Timestamp};
use crate::value::point_value::PointValue;
use crate::value::tagged::Value;
use crate::vm::{Context, Evaluator, InputSlot, Registers};

use super::messaging::Sender;
use super::notice::{Notice, NoticeSource};
use super::pending::PendingSet;
use super::store::Store;

const MAX_COMMIT_RETRIES: u32 = 3;

fn backoff(attempt: u32) -> std::time::Duration {
    std::time::Duration::from_millis(50u64.saturating_mul(1u64 << attempt.min(6)))
}

/// `point.getResults()` plus the recompute-timestamp rule of §4.6 step 3:
/// a relation's own sync takes precedence, then the result point's sync,
/// else the input's own timestamp drives the recompute directly (the
/// common, sync-less pass-through case).
fn is_due(sync: &crate::sync::Sync, t: Timestamp) -> bool {
    sync.is_in_sync(t)
}

/// Runs the batch engine's control loop against a frozen `PointGraph`.
/// `C: Clock` is injected rather than read from a global (§9 Design Notes).
pub struct BatchEngine<C: Clock> {
    graph: Arc<PointGraph>,
    store: Arc<dyn Store>,
    sender: Option<Arc<dyn Sender>>,
    source: Box<dyn NoticeSource>,
    clock: C,
    shutdown: Arc<AtomicBool>,
    evaluator: Evaluator,
    pending: RefCell<PendingSet>,
    write_through: RefCell<HashMap<(PointIndex, Timestamp), Value>>,
    filters: RefCell<HashMap<PointIndex, Filter>>,
}

impl<C: Clock> BatchEngine<C> {
    pub fn new(
        graph: Arc<PointGraph>,
        store: Arc<dyn Store>,
        sender: Option<Arc<dyn Sender>>,
        source: Box<dyn NoticeSource>,
        clock: C,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            graph,
            store,
            sender,
            source,
            clock,
            shutdown,
            evaluator: Evaluator::new(),
            pending: RefCell::new(PendingSet::new()),
            write_through: RefCell::new(HashMap::new()),
            filters: RefCell::new(HashMap::new()),
        }
    }

    pub fn graph(&self) -> &PointGraph {
        &self.graph
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Runs until the shutdown flag is set, finishing and committing the
    /// current batch before exiting (§5 Cancellation: "finish the current
    /// batch, commit, then exit. In-flight transforms are not
    /// interrupted.").
    pub fn run(&self, notice_timeout_ms: u64) -> Result<()> {
        while !self.shutdown.load(Ordering::Relaxed) {
            self.run_once(notice_timeout_ms)?;
        }
        Ok(())
    }

    /// Pulls one notice and reacts to it. A `Notice::Null` drains the
    /// pending set and commits; anything else only enlarges the pending
    /// set (§4.6 "Batch: a bounded sequence of notice processing ending
    /// at a commit").
    pub fn run_once(&self, notice_timeout_ms: u64) -> Result<()> {
        match self.source.next_notice(notice_timeout_ms)? {
            None => Ok(()),
            Some(Notice::Null) => self.drain_and_commit(),
            Some(notice) => self.classify(notice),
        }
    }

    fn classify(&self, notice: Notice) -> Result<()> {
        match notice {
            Notice::Null => self.drain_and_commit(),
            Notice::Value(pv) => self.handle_value(pv),
            Notice::Recalc { point, stamp } => {
                if let Some(idx) = self.graph.get_point_by_uuid(point) {
                    self.pending.borrow_mut().add(&self.graph, idx, stamp);
                } else {
                    warn!(point = %point, "recalc trigger for an unknown point");
                }
                Ok(())
            }
            Notice::Clock(t) => self.trigger_clock(t),
            Notice::Service(message) => {
                debug!(message = %message, "service signal acknowledged");
                Ok(())
            }
        }
    }

    /// Step 3 "New raw input value": store it, enumerate results, and add
    /// each due `(resultPoint, stamp)` to the pending set.
    fn handle_value(&self, pv: PointValue) -> Result<()> {
        let Some(idx) = self.graph.get_point_by_uuid(pv.point()) else {
            warn!(point = %pv.point(), "value for an unknown point; dropped");
            return Ok(());
        };
        let point = self.graph.point(idx);
        if point.is_dropped() {
            return Ok(());
        }

        if let Err(e) = self.store.put(std::slice::from_ref(&pv)) {
            warn!(point = %point.name(), error = %e, "store.put failed for raw input");
        }
        if let Some(value) = pv.value() {
            self.write_through.borrow_mut().insert((idx, pv.stamp()), value.clone());
        }

        self.enqueue_due_results(point, pv.stamp());
        Ok(())
    }

    /// Enumerates `point.getResults()` and adds each due `(resultPoint,
    /// stamp)` to the pending set, per §4.6 step 3's recompute-timestamp
    /// rule (a relation's own sync takes precedence, then the result
    /// point's, else the producing timestamp drives the recompute
    /// directly). Shared by `handle_value` (a raw input arriving) and
    /// `emit` (a derived point's own computed value becoming available),
    /// so a chain of more than one level propagates within the same
    /// batch instead of stopping after the first level.
    fn enqueue_due_results(&self, point: &Point, stamp: Timestamp) {
        for &rel_idx in point.results() {
            let relation = self.graph.relation(rel_idx);
            let result_idx = relation.result();
            let result = self.graph.point(result_idx);
            let due = match relation.sync() {
                Some(s) => is_due(s, stamp),
                None => match result.sync() {
                    Some(s) => is_due(s, stamp),
                    None => true,
                },
            };
            if due {
                self.pending.borrow_mut().add(&self.graph, result_idx, stamp);
            }
        }
    }

    /// Step 3 "Clock event": every point whose sync fires at `t`.
    fn trigger_clock(&self, t: Timestamp) -> Result<()> {
        for (idx, point) in self.graph.points() {
            if point.is_dropped() {
                continue;
            }
            if let Some(sync) = point.sync() {
                if is_due(sync, t) {
                    self.pending.borrow_mut().add(&self.graph, idx, t);
                }
            }
        }
        Ok(())
    }

    /// Directly enqueues a recalc, bypassing messaging (§4.6: an internal
    /// scheduler calls this rather than routing through `Receiver`).
    pub fn trigger_recalc(&self, point: Uuid, stamp: Timestamp) {
        if let Some(idx) = self.graph.get_point_by_uuid(point) {
            self.pending.borrow_mut().add(&self.graph, idx, stamp);
        }
    }

    /// Step 4-6: drains the pending set in level order, computes each
    /// `(p, t)`, then commits store and messaging in that order.
    ///
    /// A single `(p, t)` can itself enqueue further entries at a strictly
    /// higher level (its own results, §4.6 step 3) — so a single snapshot
    /// of the pending set is not enough for a chain of more than one
    /// level to fully compute in-batch. This re-polls the set until a
    /// drain comes back empty; since a result's level always exceeds its
    /// input's, each successive snapshot only ever contains higher levels
    /// than the one just processed, so overall ordering stays ascending.
    fn drain_and_commit(&self) -> Result<()> {
        'outer: loop {
            let entries = self.pending.borrow_mut().drain();
            if entries.is_empty() {
                break;
            }
            for (idx, stamp) in entries {
                if self.shutdown.load(Ordering::Relaxed) {
                    break 'outer;
                }
                self.process_one(idx, stamp);
            }
        }
        self.write_through.borrow_mut().clear();
        self.commit()
    }

    fn process_one(&self, idx: PointIndex, stamp: Timestamp) {
        let point = self.graph.point(idx);
        if point.is_dropped() {
            return;
        }
        let Some(transform) = point.transform() else {
            debug!(point = %point.name(), "no transform bound; skipping");
            return;
        };

        let context = match self.build_context(point, stamp) {
            Ok(c) => c,
            Err(e) => {
                warn!(point = %point.name(), ?stamp, error = %e, "failed to assemble inputs; dropping (p, t)");
                return;
            }
        };

        let mut registers = Registers::new();
        match transform.apply_to(&self.evaluator, &context, &mut registers) {
            Ok(outcome) => self.emit(idx, point, stamp, outcome),
            Err(e) => {
                if point.fail_returns_null() {
                    warn!(point = %point.name(), ?stamp, error = %e, "transform failed; FAIL_RETURNS_NULL converts to null");
                    self.emit(idx, point, stamp, None);
                } else {
                    warn!(point = %point.name(), ?stamp, error = %e, "transform failed; (p, t) dropped");
                }
            }
        }
    }

    /// Step 5a-b: fetch each relation's input (write-through first, then
    /// store) and normalize it, producing a VM `Context`.
    fn build_context(&self, point: &Point, stamp: Timestamp) -> Result<Context> {
        let mut context = Context::new(point.name());
        for &rel_idx in point.inputs() {
            let relation = self.graph.relation(rel_idx);
            let input_point = self.graph.point(relation.input());
            let value = self.fetch_input(relation.input(), input_point, stamp)?;
            context = context.with_input(InputSlot::new(input_point.name(), stamp, value));
        }
        for key in point.params().own_keys() {
            if let Some(v) = point.params().own_values(key).and_then(|vs| vs.first()) {
                context = context.with_param(v.clone());
            }
        }
        Ok(context)
    }

    /// Write-through values are already internal/normalized (they are
    /// this engine's own computed output); values fetched from the store
    /// still need `Content::normalize` applied (§4.6 step 5b).
    fn fetch_input(&self, idx: PointIndex, point: &Point, stamp: Timestamp) -> Result<Option<Value>> {
        if let Some(v) = self.write_through.borrow().get(&(idx, stamp)) {
            return Ok(Some(v.clone()));
        }
        let Some(stored) = self.store.get_latest(point.uuid(), Some(stamp))? else {
            return Ok(None);
        };
        if stored.stamp() != stamp {
            return Ok(None);
        }
        let normalized = match point.content() {
            Some(content) => stored.normalized(content.as_ref())?,
            None => stored,
        };
        Ok(normalized.value().cloned())
    }

    /// Step 5d-e: denormalize/encode/filter a non-null result, or emit a
    /// tombstone for a null result on a `nullRemoves` point. Per the §8
    /// Open Question on null/filter interaction, a tombstone bypasses the
    /// filter entirely — a delete is never thinned (see DESIGN.md).
    fn emit(&self, idx: PointIndex, point: &Point, stamp: Timestamp, outcome: Option<Value>) {
        let forwarded = match outcome {
            Some(value) => {
                self.write_through.borrow_mut().insert((idx, stamp), value.clone());
                // The value is now visible to later computations in this batch
                // (§4.6 ordering guarantee); enqueue this point's own results so
                // a chain of more than one level drains within the same batch.
                self.enqueue_due_results(point, stamp);
                let computed = PointValue::new(point.uuid(), stamp, Some(value));
                match self.encode(point, &computed) {
                    Ok(encoded) => {
                        let mut filters = self.filters.borrow_mut();
                        let filter = filters.entry(idx).or_insert_with(|| {
                            filter::build(point.name(), point.params()).unwrap_or(Filter::Disabled)
                        });
                        filter.apply(encoded)
                    }
                    Err(e) => {
                        warn!(point = %point.name(), ?stamp, error = %e, "encode/denormalize failed; (p, t) dropped");
                        Vec::new()
                    }
                }
            }
            None if point.null_removes() => vec![PointValue::tombstone(point.uuid(), stamp)],
            None => Vec::new(),
        };

        if forwarded.is_empty() {
            return;
        }
        if let Err(e) = self.store.put(&forwarded) {
            warn!(point = %point.name(), error = %e, "store.put failed for computed result");
        }
        if let Some(sender) = &self.sender {
            if let Err(e) = sender.send(&forwarded) {
                warn!(point = %point.name(), error = %e, "messaging send failed");
            }
        }
    }

    fn encode(&self, point: &Point, value: &PointValue) -> Result<PointValue> {
        match point.content() {
            Some(content) => {
                let denormalized = value.denormalized(content.as_ref())?;
                denormalized.encoded(content.as_ref())
            }
            None => Ok(value.clone()),
        }
    }

    /// Step 6: "commit store and messaging in that order." Store commit
    /// is retried with backoff (§7); messaging is never committed until
    /// store commit succeeds, and a messaging failure leaves store writes
    /// standing and requests a resync rather than rolling them back (§7).
    fn commit(&self) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.store.commit() {
                Ok(()) => break,
                Err(e) if attempt < MAX_COMMIT_RETRIES => {
                    attempt += 1;
                    warn!(attempt, error = %e, "store commit failed; retrying with backoff");
                    std::thread::sleep(backoff(attempt));
                }
                Err(e) => {
                    error!(error = %e, "store commit failed after retries; batch will be redriven from the store's last committed timestamp");
                    return Err(e);
                }
            }
        }

        if let Some(sender) = &self.sender {
            if let Err(e) = sender.commit() {
                error!(error = %e, "messaging commit failed; values already durable in store, requesting resync");
                return Err(Error::MessagingFailure { reason: e.to_string() });
            }
        }
        Ok(())
    }
}
