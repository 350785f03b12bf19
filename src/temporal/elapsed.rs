use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::temporal::parse;
use crate::temporal::timestamp::UNITS_PER_SECOND;

/// A non-negative count of 100ns units, with sentinels `EMPTY` (zero),
/// `INFINITY` (saturating maximum), and `INVALID` (distinguished,
/// outside the non-negative domain by construction). Arithmetic saturates
/// at `INFINITY`. See `spec.md` §3, §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElapsedTime(i64);

impl ElapsedTime {
    pub const EMPTY: ElapsedTime = ElapsedTime(0);
    pub const INFINITY: ElapsedTime = ElapsedTime(i64::MAX);
    pub const INVALID: ElapsedTime = ElapsedTime(i64::MIN);

    pub const fn from_raw(raw: i64) -> Self {
        ElapsedTime(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub const fn is_infinity(self) -> bool {
        self.0 == Self::INFINITY.0
    }

    pub const fn is_invalid(self) -> bool {
        self.0 == Self::INVALID.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == Self::EMPTY.0
    }

    pub fn from_millis(millis: i64) -> Self {
        ElapsedTime(millis.saturating_mul(UNITS_PER_SECOND / 1_000))
    }

    pub fn from_seconds_f64(seconds: f64) -> Self {
        if !seconds.is_finite() || seconds >= (i64::MAX / UNITS_PER_SECOND) as f64 {
            return ElapsedTime::INFINITY;
        }
        ElapsedTime((seconds * UNITS_PER_SECOND as f64).round() as i64)
    }

    pub fn as_seconds_f64(self) -> f64 {
        self.0 as f64 / UNITS_PER_SECOND as f64
    }

    pub fn parse(input: &str) -> Result<Self> {
        parse::parse_elapsed(input)
    }

    /// `e1.add(e2) == e2.add(e1)`, saturating at `INFINITY`.
    pub fn add(self, other: ElapsedTime) -> Self {
        if self.is_infinity() || other.is_infinity() {
            return ElapsedTime::INFINITY;
        }
        ElapsedTime(self.0.saturating_add(other.0))
    }

    /// `|a - b|`. `INFINITY - finite = INFINITY`; `finite - INFINITY = EMPTY`.
    pub fn sub(self, other: ElapsedTime) -> Self {
        match (self.is_infinity(), other.is_infinity()) {
            (true, true) => ElapsedTime::EMPTY,
            (true, false) => ElapsedTime::INFINITY,
            (false, true) => ElapsedTime::EMPTY,
            (false, false) => ElapsedTime(self.0.abs_diff(other.0).min(i64::MAX as u64) as i64),
        }
    }

    /// `ratio(a, INFINITY)` is the smallest positive double; `ratio(INFINITY, INFINITY)` is NaN.
    pub fn ratio(self, denom: ElapsedTime) -> f64 {
        if self.is_infinity() && denom.is_infinity() {
            return f64::NAN;
        }
        if denom.is_infinity() {
            return f64::MIN_POSITIVE;
        }
        if denom.0 == 0 {
            return f64::INFINITY;
        }
        self.0 as f64 / denom.0 as f64
    }

    /// Truncates toward zero in multiples of `self`.
    pub fn floored(self, unit: ElapsedTime) -> Self {
        if unit.0 <= 0 || self.is_infinity() {
            return self;
        }
        ElapsedTime((self.0 / unit.0) * unit.0)
    }

    pub fn format(self) -> String {
        super::format::format_elapsed(self)
    }
}

impl TryFrom<&str> for ElapsedTime {
    type Error = Error;
    fn try_from(value: &str) -> Result<Self> {
        ElapsedTime::parse(value)
    }
}

impl std::fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_commutative() {
        let a = ElapsedTime::from_millis(300);
        let b = ElapsedTime::from_millis(700);
        assert_eq!(a.add(b), b.add(a));
    }

    #[test]
    fn sub_is_absolute_difference() {
        let a = ElapsedTime::from_millis(300);
        let b = ElapsedTime::from_millis(700);
        assert_eq!(a.sub(b), b.sub(a));
        assert_eq!(a.sub(b), ElapsedTime::from_millis(400));
    }

    #[test]
    fn add_saturates_at_infinity() {
        let a = ElapsedTime::INFINITY;
        let b = ElapsedTime::from_millis(1);
        assert_eq!(a.add(b), ElapsedTime::INFINITY);
    }

    #[test]
    fn infinity_minus_finite_is_infinity_finite_minus_infinity_is_empty() {
        let inf = ElapsedTime::INFINITY;
        let finite = ElapsedTime::from_millis(5);
        assert_eq!(inf.sub(finite), ElapsedTime::INFINITY);
        assert_eq!(finite.sub(inf), ElapsedTime::EMPTY);
    }

    #[test]
    fn ratio_against_infinity_is_smallest_positive() {
        let a = ElapsedTime::from_millis(10);
        assert_eq!(a.ratio(ElapsedTime::INFINITY), f64::MIN_POSITIVE);
    }

    #[test]
    fn ratio_infinity_over_infinity_is_nan() {
        assert!(ElapsedTime::INFINITY.ratio(ElapsedTime::INFINITY).is_nan());
    }
}
