use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::sync::SyncCursor;
use crate::temporal::{ElapsedTime, TimeInterval, Timestamp};

const MILLISECOND_UNITS: i64 = 10_000;

/// `{k*period + offset : k in Z} ∩ limits` (§4.2).
#[derive(Debug, Clone)]
pub struct ElapsedSync {
    period: ElapsedTime,
    offset: ElapsedTime,
    limits: TimeInterval,
    #[allow(dead_code)] // kept for API symmetry with the other sync variants and future zone-aware alignment
    zone: Tz,
    current: Timestamp,
}

impl ElapsedSync {
    pub fn new(period: ElapsedTime, offset: ElapsedTime, limits: TimeInterval, zone: Tz) -> Result<Self> {
        if period.raw() < MILLISECOND_UNITS {
            return Err(Error::bad_sync("period must be at least 1ms"));
        }
        if offset.raw() < 0 || offset.raw() >= period.raw() {
            return Err(Error::bad_sync("offset must satisfy 0 <= offset < period"));
        }
        Ok(Self { period, offset, limits, zone, current: Timestamp::BEGINNING_OF_TIME })
    }

    /// A timestamp guaranteed to sit exactly on the schedule grid, used as
    /// the modular-arithmetic reference point. Anchoring depends on which
    /// limit endpoints are open, per §4.2's `floor(current)` rule:
    /// open both -> epoch-aligned; closed end -> aligned to the end;
    /// closed beginning -> aligned to the beginning.
    fn reference(&self) -> Timestamp {
        if self.limits.is_open_start() && self.limits.is_open_end() {
            Timestamp::from_raw(0).after(self.offset)
        } else if !self.limits.is_open_end() {
            self.limits.not_after
        } else {
            self.limits.not_before
        }
    }

    fn period_raw(&self) -> i64 {
        self.period.raw()
    }
}

impl SyncCursor for ElapsedSync {
    fn set_current(&mut self, t: Timestamp) {
        self.current = t;
    }

    fn current(&self) -> Timestamp {
        self.current
    }

    fn next_stamp(&mut self) -> Option<Timestamp> {
        let r = self.reference().raw();
        let period = self.period_raw();
        let diff = self.current.raw() - r;
        let k = diff.div_euclid(period);
        let candidate = Timestamp::from_raw(r + (k + 1) * period);
        if self.limits.contains(candidate) {
            self.current = candidate;
            Some(candidate)
        } else {
            None
        }
    }

    fn previous_stamp(&mut self) -> Option<Timestamp> {
        let r = self.reference().raw();
        let period = self.period_raw();
        let diff = self.current.raw() - r;
        let mut k = diff.div_euclid(period);
        if diff.rem_euclid(period) == 0 {
            k -= 1;
        }
        let candidate = Timestamp::from_raw(r + k * period);
        if self.limits.contains(candidate) {
            self.current = candidate;
            Some(candidate)
        } else {
            None
        }
    }

    fn is_in_sync(&self, t: Timestamp) -> bool {
        if !self.limits.contains(t) {
            return false;
        }
        let r = self.reference().raw();
        (t.raw() - r).rem_euclid(self.period_raw()) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc_ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn scenario_elapsed_sync_alignment() {
        let mut sync = ElapsedSync::new(
            ElapsedTime::from_millis(3_600_000),
            ElapsedTime::from_millis(900_000),
            TimeInterval::UNBOUNDED,
            chrono_tz::UTC,
        )
        .unwrap();
        sync.set_current(utc_ts("2024-01-01T00:00:00Z"));

        let first = sync.next_stamp().unwrap();
        let second = sync.next_stamp().unwrap();
        let third = sync.next_stamp().unwrap();

        assert_eq!(first, utc_ts("2024-01-01T00:15:00Z"));
        assert_eq!(second, utc_ts("2024-01-01T01:15:00Z"));
        assert_eq!(third, utc_ts("2024-01-01T02:15:00Z"));
    }

    #[test]
    fn is_in_sync_true_only_on_grid() {
        let mut sync = ElapsedSync::new(
            ElapsedTime::from_millis(3_600_000),
            ElapsedTime::EMPTY,
            TimeInterval::UNBOUNDED,
            chrono_tz::UTC,
        )
        .unwrap();
        sync.set_current(Timestamp::from_raw(0));
        let next = sync.next_stamp().unwrap();
        assert!(sync.is_in_sync(next));
        assert!(!sync.is_in_sync(next.after(ElapsedTime::from_millis(1))));
    }

    #[test]
    fn rejects_sub_millisecond_period_and_offset() {
        assert!(ElapsedSync::new(
            ElapsedTime::from_raw(1),
            ElapsedTime::EMPTY,
            TimeInterval::UNBOUNDED,
            chrono_tz::UTC,
        )
        .is_err());
        assert!(ElapsedSync::new(
            ElapsedTime::from_millis(1_000),
            ElapsedTime::from_millis(1_000),
            TimeInterval::UNBOUNDED,
            chrono_tz::UTC,
        )
        .is_err());
    }

    #[test]
    fn next_then_previous_returns_to_start() {
        let mut sync = ElapsedSync::new(
            ElapsedTime::from_millis(60_000),
            ElapsedTime::EMPTY,
            TimeInterval::UNBOUNDED,
            chrono_tz::UTC,
        )
        .unwrap();
        sync.set_current(Timestamp::from_raw(0));
        let n = sync.next_stamp().unwrap();
        let p = sync.previous_stamp().unwrap();
        assert_eq!(p, Timestamp::from_raw(0));
        assert!(n > p);
    }
}
