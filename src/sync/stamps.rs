use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::sync::SyncCursor;
use crate::temporal::{TimeInterval, Timestamp};

/// Explicit, sorted timestamp sequence. `next`/`previous` are binary
/// search; `isInSync` is exact membership (§4.2).
///
/// §8/§9 flags an open question: when the cursor sits strictly between two
/// entries, does `next` snap forward before searching? Resolved here (see
/// DESIGN.md) as: the search is always for the first entry strictly
/// greater than the current cursor, regardless of whether the cursor
/// itself is on the schedule — there is no separate "snap" step, and the
/// caller never needs one.
#[derive(Debug, Clone)]
pub struct StampsSync {
    stamps: Vec<Timestamp>,
    #[allow(dead_code)]
    zone: Tz,
    limits: TimeInterval,
    current: Timestamp,
}

impl StampsSync {
    pub fn new(mut stamps: Vec<Timestamp>, zone: Tz) -> Result<Self> {
        Self::with_limits(std::mem::take(&mut stamps), zone, TimeInterval::UNBOUNDED)
    }

    pub fn with_limits(mut stamps: Vec<Timestamp>, zone: Tz, limits: TimeInterval) -> Result<Self> {
        stamps.sort();
        if stamps.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::bad_sync("StampsSync entries must be strictly increasing"));
        }
        Ok(Self { stamps, zone, limits, current: Timestamp::BEGINNING_OF_TIME })
    }
}

impl SyncCursor for StampsSync {
    fn set_current(&mut self, t: Timestamp) {
        self.current = t;
    }

    fn current(&self) -> Timestamp {
        self.current
    }

    fn next_stamp(&mut self) -> Option<Timestamp> {
        let idx = self.stamps.partition_point(|&s| s <= self.current);
        let candidate = *self.stamps.get(idx)?;
        if self.limits.contains(candidate) {
            self.current = candidate;
            Some(candidate)
        } else {
            None
        }
    }

    fn previous_stamp(&mut self) -> Option<Timestamp> {
        let idx = self.stamps.partition_point(|&s| s < self.current);
        if idx == 0 {
            return None;
        }
        let candidate = self.stamps[idx - 1];
        if self.limits.contains(candidate) {
            self.current = candidate;
            Some(candidate)
        } else {
            None
        }
    }

    fn is_in_sync(&self, t: Timestamp) -> bool {
        self.limits.contains(t) && self.stamps.binary_search(&t).is_ok()
    }
}
