//! --------------------------
//! Batch Engine (§4.6)
//! --------------------------
//! "The control plane": listens for notices, assembles each affected
//! result point's inputs via the point graph and sync, runs its
//! transform, and emits the computed value downstream. This module also
//! defines the two external collaborator contracts the engine depends on
//! (`store::Store`, `messaging::Sender`/`Receiver`, §1/§6) and the
//! `Transform` trait §4.7's RPN VM and summarizer bind into.

pub mod engine;
pub mod messaging;
pub mod notice;
pub mod pending;
pub mod store;
pub mod transform;

pub use engine::BatchEngine;
pub use notice::{Notice, NoticeSource, ReceiverSource};
pub use pending::PendingSet;
pub use transform::{RpnTransform, SummarizerTransform, Transform};
