//! Minimal loader entry point (§6, §9 "XML loader... supply a frozen
//! metadata snapshot"). The real loader lives outside the core; this
//! module only owns the freeze/validate boundary a loader must call
//! through, so the core never accepts an unfrozen graph at runtime.

use tracing::{info, warn};

use crate::error::Result;
use crate::graph::PointGraph;

/// Freezes `graph` and validates it, logging the outcome. Any external
/// loader (XML, database, in-process builder) should funnel its built
/// `PointGraph` through this call before handing it to the batch engine.
pub fn load(graph: PointGraph) -> Result<PointGraph> {
    match graph.freeze() {
        Ok(frozen) => {
            info!(points = frozen.points().count(), "metadata graph loaded and frozen");
            Ok(frozen)
        }
        Err(err) => {
            warn!(error = %err, "metadata graph failed validation");
            Err(err)
        }
    }
}
