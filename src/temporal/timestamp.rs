use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::temporal::elapsed::ElapsedTime;
use crate::temporal::parse;

/// 100-nanosecond units per second; the unit the whole temporal model counts in.
pub const UNITS_PER_SECOND: i64 = 10_000_000;
const UNITS_PER_MILLISECOND: i64 = UNITS_PER_SECOND / 1_000;
const UNITS_PER_DAY: i64 = UNITS_PER_SECOND * 86_400;

/// A non-negative count of 100ns units since the Unix epoch, or one of the
/// three sentinels (`BEGINNING_OF_TIME`, `END_OF_TIME`, `INVALID`).
///
/// Totally ordered, `Copy`, immutable. See `spec.md` §3 and §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Sentinel denoting "no lower bound" / the smallest representable instant.
    pub const BEGINNING_OF_TIME: Timestamp = Timestamp(i64::MIN + 2);
    /// Sentinel denoting "no upper bound" / the largest representable instant.
    pub const END_OF_TIME: Timestamp = Timestamp(i64::MAX);
    /// Distinguished invalid value; never appears on the wire (§3 invariants).
    pub const INVALID: Timestamp = Timestamp(i64::MIN);

    /// Constructs from a raw 100ns count. No validation beyond storing the bits.
    pub const fn from_raw(raw: i64) -> Self {
        Timestamp(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub const fn is_invalid(self) -> bool {
        self.0 == Self::INVALID.0
    }

    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis.saturating_mul(UNITS_PER_MILLISECOND))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Timestamp(nanos / 100)
    }

    pub fn from_seconds_f64(seconds: f64) -> Self {
        Timestamp((seconds * UNITS_PER_SECOND as f64).round() as i64)
    }

    pub fn from_chrono(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp() * UNITS_PER_SECOND + dt.timestamp_subsec_nanos() as i64 / 100)
    }

    pub fn to_chrono(self) -> DateTime<Utc> {
        let secs = self.0.div_euclid(UNITS_PER_SECOND);
        let rem_units = self.0.rem_euclid(UNITS_PER_SECOND);
        DateTime::<Utc>::from_timestamp(secs, (rem_units * 100) as u32)
            .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap())
    }

    /// Parses any of the three recognized temporal grammars (§4.1), trying
    /// them in order: elapsed, seconds, duration — then interprets the
    /// result as an absolute instant (ISO-8601) when the string looks like
    /// a date rather than a bare duration.
    pub fn parse(input: &str) -> Result<Self> {
        parse::parse_timestamp(input)
    }

    /// Saturating add of an elapsed time; `INFINITY` propagates.
    pub fn after(self, elapsed: ElapsedTime) -> Self {
        if elapsed.is_infinity() {
            return Timestamp::END_OF_TIME;
        }
        Timestamp(self.0.saturating_add(elapsed.raw()))
    }

    /// Saturating subtract of an elapsed time.
    pub fn before(self, elapsed: ElapsedTime) -> Self {
        if elapsed.is_infinity() {
            return Timestamp::BEGINNING_OF_TIME;
        }
        Timestamp(self.0.saturating_sub(elapsed.raw()))
    }

    /// `|self - other|`, per the elapsed-time subtraction rule (§3).
    pub fn sub(self, other: Timestamp) -> ElapsedTime {
        ElapsedTime::from_raw(self.0.abs_diff(other.0).min(i64::MAX as u64) as i64)
    }

    /// Last midnight at or before `self`, in `zone`.
    pub fn midnight(self, zone: Tz) -> Self {
        let local = zone.from_utc_datetime(&self.to_chrono().naive_utc());
        let day_start = local.date_naive().and_hms_opt(0, 0, 0).unwrap();
        let at_midnight = zone
            .from_local_datetime(&day_start)
            .earliest()
            .unwrap_or_else(|| zone.from_local_datetime(&day_start).latest().unwrap());
        Timestamp::from_chrono(at_midnight.with_timezone(&Utc))
    }

    /// Adds one civil day in `zone` (DST-aware; 23h/25h on transition days).
    pub fn next_day(self, zone: Tz) -> Self {
        let local = zone.from_utc_datetime(&self.to_chrono().naive_utc());
        let next_date = local.date_naive().succ_opt().unwrap_or(local.date_naive());
        let same_wall_time = NaiveDate::and_time(&next_date, local.time());
        let next_local = zone
            .from_local_datetime(&same_wall_time)
            .earliest()
            .unwrap_or_else(|| zone.from_local_datetime(&same_wall_time).latest().unwrap());
        Timestamp::from_chrono(next_local.with_timezone(&Utc))
    }

    /// Truncates toward the epoch in multiples of `unit` (plain integer floor,
    /// zone-independent — used for filter timestamp trimming, §4.5).
    pub fn floored(self, unit: ElapsedTime) -> Self {
        if unit.raw() <= 0 {
            return self;
        }
        Timestamp(self.0.div_euclid(unit.raw()) * unit.raw())
    }

    pub fn format(self, zone: Tz) -> String {
        format::format_timestamp(self, zone)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(chrono_tz::UTC))
    }
}

impl TryFrom<&str> for Timestamp {
    type Error = Error;
    fn try_from(value: &str) -> Result<Self> {
        Timestamp::parse(value)
    }
}

pub const fn units_per_day() -> i64 {
    UNITS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::elapsed::ElapsedTime;

    #[test]
    fn after_then_sub_recovers_elapsed() {
        let t = Timestamp::from_chrono(chrono::Utc::now());
        let e = ElapsedTime::from_millis(1_500);
        assert_eq!(t.after(e).sub(t), e);
    }

    #[test]
    fn before_then_after_recovers_timestamp() {
        let t = Timestamp::from_raw(10_000_000_000);
        let e = ElapsedTime::from_millis(2_500);
        assert_eq!(t.before(e).after(e), t);
    }

    #[test]
    fn ordering_is_total() {
        let a = Timestamp::from_raw(1);
        let b = Timestamp::from_raw(2);
        assert!(a < b);
        assert!(Timestamp::BEGINNING_OF_TIME < a);
        assert!(b < Timestamp::END_OF_TIME);
    }

    #[test]
    fn invalid_is_distinguished() {
        assert!(Timestamp::INVALID.is_invalid());
        assert!(!Timestamp::from_raw(0).is_invalid());
    }

    #[test]
    fn midnight_is_idempotent_and_at_or_before() {
        let zone = chrono_tz::UTC;
        let t = Timestamp::from_chrono(
            chrono::Utc::now().date_naive().and_hms_opt(13, 5, 0).unwrap().and_utc(),
        );
        let m = t.midnight(zone);
        assert!(m <= t);
        assert_eq!(m.midnight(zone), m);
    }
}
