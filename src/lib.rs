//! # rvpf-core
//!
//! The core of a related-values processing framework: a distributed
//! industrial-telemetry pipeline that ingests timestamped point samples,
//! propagates them through a dependency graph of derived points,
//! evaluates per-point RPN programs to produce results, and schedules
//! periodic recomputations against a value store.
//!
//! ## Architecture
//!
//! * **Temporal** (`temporal`): the 100-nanosecond monotonic timestamp
//!   and elapsed-time types everything else is built on.
//! * **Sync** (`sync`): crontab/elapsed/explicit-stamp schedules that
//!   drive batch boundaries and periodic recomputation.
//! * **Graph** (`graph`): the immutable point/relation metadata DAG and
//!   its `Params` configuration surface.
//! * **Value** (`value`): the tagged `Value` union, `PointValue` envelope,
//!   content codec, and wire form.
//! * **Filter** (`filter`): per-point value thinning (step/deadband).
//! * **VM** (`vm`): the postfix expression engine transforms delegate to.
//! * **Batch** (`batch`): the control plane tying the above together —
//!   notices in, computed `PointValue`s out — plus the `Store`/`Sender`/
//!   `Receiver` collaborator contracts it depends on.
//!
//! External collaborators (value store, messaging, security/crypt,
//! device adapters, XML loader) are modeled as traits at their point of
//! contact with the core; this crate does not implement them beyond the
//! in-memory reference implementations gated behind the `cli` feature.

pub mod batch;
pub mod error;
pub mod filter;
pub mod graph;
pub mod sync;
pub mod temporal;
pub mod value;
pub mod vm;

pub use error::{Error, Result};
