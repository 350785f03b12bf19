use serde::{Deserialize, Serialize};

use crate::temporal::timestamp::Timestamp;

/// `[notBefore, notAfter]` by default; `contains`/`contains_half_open` let a
/// caller pick closed or half-open semantics per `spec.md` §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub not_before: Timestamp,
    pub not_after: Timestamp,
}

impl TimeInterval {
    pub const UNBOUNDED: TimeInterval = TimeInterval {
        not_before: Timestamp::BEGINNING_OF_TIME,
        not_after: Timestamp::END_OF_TIME,
    };

    pub fn new(not_before: Timestamp, not_after: Timestamp) -> Self {
        Self { not_before, not_after }
    }

    pub fn is_open_start(&self) -> bool {
        self.not_before == Timestamp::BEGINNING_OF_TIME
    }

    pub fn is_open_end(&self) -> bool {
        self.not_after == Timestamp::END_OF_TIME
    }

    /// Closed-interval membership: `notBefore <= t <= notAfter`.
    pub fn contains(&self, t: Timestamp) -> bool {
        self.not_before <= t && t <= self.not_after
    }

    /// Half-open `[notBefore, notAfter)` membership.
    pub fn contains_half_open(&self, t: Timestamp) -> bool {
        self.not_before <= t && t < self.not_after
    }

    pub fn intersect(&self, other: &TimeInterval) -> TimeInterval {
        TimeInterval {
            not_before: self.not_before.max(other.not_before),
            not_after: self.not_after.min(other.not_after),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.not_before > self.not_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_contains_everything() {
        let t = Timestamp::from_raw(123);
        assert!(TimeInterval::UNBOUNDED.contains(t));
    }

    #[test]
    fn intersect_narrows() {
        let a = TimeInterval::new(Timestamp::from_raw(0), Timestamp::from_raw(100));
        let b = TimeInterval::new(Timestamp::from_raw(50), Timestamp::from_raw(150));
        let c = a.intersect(&b);
        assert_eq!(c.not_before, Timestamp::from_raw(50));
        assert_eq!(c.not_after, Timestamp::from_raw(100));
    }

    #[test]
    fn half_open_excludes_end() {
        let iv = TimeInterval::new(Timestamp::from_raw(0), Timestamp::from_raw(10));
        assert!(iv.contains(Timestamp::from_raw(10)));
        assert!(!iv.contains_half_open(Timestamp::from_raw(10)));
    }
}
