use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::batch::store::Store;
use crate::batch::transform::Transform;
use crate::graph::params::{ParamValue, Params};
use crate::graph::{PointIndex, RelationIndex};
use crate::sync::Sync;
use crate::value::content::Content;

/// Recognized §6 Config surface keys this struct reads from its own
/// `Params` via `apply_param_flags` (the remaining Point-selected keys,
/// `STEP_SIZE_PARAM` etc., configure the per-point `Filter` instead; see
/// `crate::filter`).
pub const NULL_REMOVES_PARAM: &str = "NULL_REMOVES";
pub const VOLATILE_PARAM: &str = "VOLATILE";
pub const RESPECT_VERSION_PARAM: &str = "RESPECT_VERSION";
pub const FAIL_RETURNS_NULL_PARAM: &str = "FAIL_RETURNS_NULL";

/// An entity in the dependency graph: a raw input (`level == 0`) or a
/// derived point (`level > 0`, strictly greater than every input's level).
/// Arena-owned by `PointGraph`; other points reference it by `PointIndex`
/// rather than holding an `Arc`, so the graph stays a flat, cheaply
/// cloneable structure of indices (§3, §9 Design Notes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    uuid: Uuid,
    name: String,
    level: u32,
    origin: Option<PointIndex>,
    #[serde(skip)]
    content: Option<Arc<dyn Content>>,
    #[serde(skip)]
    store: Option<Arc<dyn Store>>,
    #[serde(skip)]
    sync: Option<Arc<Sync>>,
    /// The per-point computation (§4.6 step 5c); absent on a raw input
    /// point (`level == 0`), which only ever receives externally-scanned
    /// values (§1 "process-automation device adapters").
    #[serde(skip)]
    transform: Option<Arc<dyn Transform>>,
    params: Params,
    inputs: Vec<RelationIndex>,
    results: Vec<RelationIndex>,
    replicates: Vec<PointIndex>,
    dropped: bool,
    volatile: bool,
    null_removes: bool,
    /// `FAIL_RETURNS_NULL_PARAM` (§6, §7): converts a transform failure
    /// into a null emission rather than a dropped `(p, t)`.
    fail_returns_null: bool,
    /// `RESPECT_VERSION_PARAM` (§6): consulted by the store collaborator
    /// for optimistic-concurrency writes; the core only carries the flag.
    respect_version: bool,
}

impl Point {
    pub fn new(uuid: Uuid, name: impl Into<String>, level: u32) -> Self {
        Self {
            uuid,
            name: name.into(),
            level,
            origin: None,
            content: None,
            store: None,
            sync: None,
            transform: None,
            params: Params::new(),
            inputs: Vec::new(),
            results: Vec::new(),
            replicates: Vec::new(),
            dropped: false,
            volatile: false,
            null_removes: false,
            fail_returns_null: false,
            respect_version: false,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn origin(&self) -> Option<PointIndex> {
        self.origin
    }

    pub fn set_origin(&mut self, origin: PointIndex) {
        self.origin = Some(origin);
    }

    pub fn content(&self) -> Option<&Arc<dyn Content>> {
        self.content.as_ref()
    }

    pub fn set_content(&mut self, content: Arc<dyn Content>) {
        self.content = Some(content);
    }

    pub fn store(&self) -> Option<&Arc<dyn Store>> {
        self.store.as_ref()
    }

    pub fn set_store(&mut self, store: Arc<dyn Store>) {
        self.store = Some(store);
    }

    pub fn sync(&self) -> Option<&Arc<Sync>> {
        self.sync.as_ref()
    }

    pub fn set_sync(&mut self, sync: Arc<Sync>) {
        self.sync = Some(sync);
    }

    pub fn transform(&self) -> Option<&Arc<dyn Transform>> {
        self.transform.as_ref()
    }

    pub fn set_transform(&mut self, transform: Arc<dyn Transform>) {
        self.transform = Some(transform);
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Input relations: the edges feeding this point's computation.
    pub fn inputs(&self) -> &[RelationIndex] {
        &self.inputs
    }

    pub fn add_input(&mut self, relation: RelationIndex) {
        self.inputs.push(relation);
    }

    /// Result relations: the edges this point feeds, i.e. `point.getResults()` (§4.6).
    pub fn results(&self) -> &[RelationIndex] {
        &self.results
    }

    pub fn add_result(&mut self, relation: RelationIndex) {
        self.results.push(relation);
    }

    pub fn replicates(&self) -> &[PointIndex] {
        &self.replicates
    }

    pub fn add_replicate(&mut self, replicate: PointIndex) {
        self.replicates.push(replicate);
    }

    /// A dropped point is retained for reference but produces no outputs (§4.3).
    pub fn is_dropped(&self) -> bool {
        self.dropped
    }

    pub fn set_dropped(&mut self, dropped: bool) {
        self.dropped = dropped;
    }

    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    pub fn set_volatile(&mut self, volatile: bool) {
        self.volatile = volatile;
    }

    /// When set, a null-valued write to this point is a delete tombstone
    /// rather than a no-op (§4.4).
    pub fn null_removes(&self) -> bool {
        self.null_removes
    }

    pub fn set_null_removes(&mut self, null_removes: bool) {
        self.null_removes = null_removes;
    }

    pub fn fail_returns_null(&self) -> bool {
        self.fail_returns_null
    }

    pub fn set_fail_returns_null(&mut self, fail_returns_null: bool) {
        self.fail_returns_null = fail_returns_null;
    }

    pub fn respect_version(&self) -> bool {
        self.respect_version
    }

    pub fn set_respect_version(&mut self, respect_version: bool) {
        self.respect_version = respect_version;
    }

    /// Applies the boolean §6 Config-surface keys from this point's own
    /// `Params`, overriding whatever a loader set directly through the
    /// setters above. Call once after a point's `Params` are fully
    /// populated, before `PointGraph::freeze()`.
    pub fn apply_param_flags(&mut self) {
        if let Some(v) = self.params.value(NULL_REMOVES_PARAM).and_then(ParamValue::as_bool) {
            self.null_removes = v;
        }
        if let Some(v) = self.params.value(VOLATILE_PARAM).and_then(ParamValue::as_bool) {
            self.volatile = v;
        }
        if let Some(v) = self.params.value(FAIL_RETURNS_NULL_PARAM).and_then(ParamValue::as_bool) {
            self.fail_returns_null = v;
        }
        if let Some(v) = self.params.value(RESPECT_VERSION_PARAM).and_then(ParamValue::as_bool) {
            self.respect_version = v;
        }
    }
}
