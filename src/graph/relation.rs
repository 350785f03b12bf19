use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::graph::params::Params;
use crate::graph::PointIndex;
use crate::sync::Sync;

/// A directed edge `(input -> result)` with its own parameter map and
/// optional sync, distinct from the sync on either endpoint point (§3,
/// §4.2: a result's recompute timestamps are driven by the input's sync
/// if any, then the result's sync if any, and the relation's own sync
/// takes precedence over both when present).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    input: PointIndex,
    result: PointIndex,
    params: Params,
    #[serde(skip)]
    sync: Option<Arc<Sync>>,
}

impl Relation {
    pub fn new(input: PointIndex, result: PointIndex) -> Self {
        Self { input, result, params: Params::new(), sync: None }
    }

    pub fn input(&self) -> PointIndex {
        self.input
    }

    pub fn result(&self) -> PointIndex {
        self.result
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn sync(&self) -> Option<&Arc<Sync>> {
        self.sync.as_ref()
    }

    pub fn set_sync(&mut self, sync: Arc<Sync>) {
        self.sync = Some(sync);
    }
}
