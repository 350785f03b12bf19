//! --------------------------
//! Sync Schedules (§4.2)
//! --------------------------
//! A sync is a stateful cursor over an ordered, possibly-infinite timestamp
//! sequence, bounded by an optional `TimeInterval` and tied to a civil
//! zone. Three variants (`ElapsedSync`, `CrontabSync`, `StampsSync`) are
//! modeled as a closed sum type per `spec.md` §9 Design Notes rather than
//! a trait object, since the set of schedule kinds is fixed by spec.

mod crontab;
mod elapsed_sync;
mod stamps;

pub use crontab::CrontabSync;
pub use elapsed_sync::ElapsedSync;
pub use stamps::StampsSync;

use crate::graph::params::Params;
use crate::temporal::Timestamp;

/// Recognized configuration keys (§6 "Config surface").
pub const CRONTAB_PARAM: &str = "CRONTAB";
pub const ELAPSED_PARAM: &str = "ELAPSED";
pub const OFFSET_PARAM: &str = "OFFSET";
pub const STAMP_PARAM: &str = "STAMP";
pub const LIMITS_NOT_BEFORE_PARAM: &str = "LIMITS_NOT_BEFORE";
pub const LIMITS_NOT_AFTER_PARAM: &str = "LIMITS_NOT_AFTER";
pub const ZONE_PARAM: &str = "ZONE";

/// The cursor contract every sync variant implements, per §4.2.
pub trait SyncCursor {
    fn set_current(&mut self, t: Timestamp);
    fn current(&self) -> Timestamp;
    /// First scheduled timestamp strictly after the current cursor.
    fn next_stamp(&mut self) -> Option<Timestamp>;
    /// First scheduled timestamp strictly before the current cursor.
    fn previous_stamp(&mut self) -> Option<Timestamp>;
    fn is_in_sync(&self, t: Timestamp) -> bool;
}

/// A configured, immutable-once-built schedule with a mutable cursor.
#[derive(Debug, Clone)]
pub enum Sync {
    Elapsed(ElapsedSync),
    Crontab(CrontabSync),
    Stamps(StampsSync),
}

impl Sync {
    /// Parses the recognized keys of §6 into one of the three variants.
    /// Unknown/contradictory parameter sets fail with `BadSync`.
    pub fn from_params(params: &Params) -> crate::error::Result<Self> {
        crate::sync::config::build(params)
    }
}

impl SyncCursor for Sync {
    fn set_current(&mut self, t: Timestamp) {
        match self {
            Sync::Elapsed(s) => s.set_current(t),
            Sync::Crontab(s) => s.set_current(t),
            Sync::Stamps(s) => s.set_current(t),
        }
    }

    fn current(&self) -> Timestamp {
        match self {
            Sync::Elapsed(s) => s.current(),
            Sync::Crontab(s) => s.current(),
            Sync::Stamps(s) => s.current(),
        }
    }

    fn next_stamp(&mut self) -> Option<Timestamp> {
        match self {
            Sync::Elapsed(s) => s.next_stamp(),
            Sync::Crontab(s) => s.next_stamp(),
            Sync::Stamps(s) => s.next_stamp(),
        }
    }

    fn previous_stamp(&mut self) -> Option<Timestamp> {
        match self {
            Sync::Elapsed(s) => s.previous_stamp(),
            Sync::Crontab(s) => s.previous_stamp(),
            Sync::Stamps(s) => s.previous_stamp(),
        }
    }

    fn is_in_sync(&self, t: Timestamp) -> bool {
        match self {
            Sync::Elapsed(s) => s.is_in_sync(t),
            Sync::Crontab(s) => s.is_in_sync(t),
            Sync::Stamps(s) => s.is_in_sync(t),
        }
    }
}

mod config;
