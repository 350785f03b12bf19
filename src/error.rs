//! Error taxonomy (§7).
//!
//! One variant per row of the error table in `spec.md` §7. Each variant
//! carries the structured context the layer that raises it actually has
//! on hand, so a `tracing::warn!`/`error!` call at the decision site can
//! log something a human can act on instead of a bare message.

use crate::temporal::Timestamp;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Temporal parsing (§4.1) could not recognize any of the three grammars.
    #[error("invalid time format: {input:?} ({reason})")]
    InvalidTimeFormat { input: String, reason: &'static str },

    /// Sync setup (§4.2) was given an unknown or inconsistent parameter set.
    #[error("bad sync configuration: {reason}")]
    BadSync { reason: String },

    /// Filter setup (§4.5) rejected its configuration.
    #[error("filter configuration error on point {point}: {reason}")]
    FilterConfigError { point: String, reason: String },

    /// Expression engine (§4.7) evaluation failure.
    #[error("evaluation failed at position {position}: {code}")]
    EvalFailure { code: String, position: usize },

    /// Batch engine (§4.6) transform invocation failed for one `(point, stamp)`.
    #[error("transform failed for point {point} at {stamp:?}: {source}")]
    TransformFailure {
        point: String,
        stamp: Timestamp,
        #[source]
        source: Box<Error>,
    },

    /// Store collaborator (§6) is unreachable or timed out.
    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// Messaging collaborator (§6) failed to commit.
    #[error("messaging commit failed: {reason}")]
    MessagingFailure { reason: String },

    /// Loader-time invariant violation (§4.3); fatal at startup.
    #[error("metadata invalid: {reason}")]
    MetadataInvalid { reason: String },
}

impl Error {
    pub fn bad_sync(reason: impl Into<String>) -> Self {
        Error::BadSync { reason: reason.into() }
    }

    pub fn metadata_invalid(reason: impl Into<String>) -> Self {
        Error::MetadataInvalid { reason: reason.into() }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies the `(point, stamp)` a transform was computing when it failed;
/// used to build `Error::TransformFailure` at the batch-engine call site.
#[derive(Debug, Clone, Copy)]
pub struct FailingComputation {
    pub point: Uuid,
    pub stamp: Timestamp,
}

impl FailingComputation {
    pub fn new(point: Uuid, stamp: Timestamp) -> Self {
        Self { point, stamp }
    }
}
