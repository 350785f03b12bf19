//! The step filter (§4.5): composes deadband, floor/ceiling, timestamp
//! trim, and a time limit. This is "the most common" filter per spec and
//! the only concrete strategy named besides `Disabled`.

use crate::temporal::{ElapsedTime, Timestamp};
use crate::value::point_value::PointValue;
use crate::value::tagged::Value;

/// Numeric magnitude of a value for deadband comparisons, or `None` for
/// non-numeric values (which always pass the filter unfiltered — the
/// deadband/floor/ceiling machinery is only meaningful for scalars).
fn numeric(value: &PointValue) -> Option<f64> {
    match value.value() {
        Some(Value::Long(l)) => Some(*l as f64),
        Some(Value::Double(d)) => Some(*d),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct StepFilterConfig {
    pub deadband_gap: f64,
    pub deadband_ratio: f64,
    pub floor_gap: Option<f64>,
    pub floor_ratio: Option<f64>,
    pub ceiling_gap: Option<f64>,
    pub ceiling_ratio: Option<f64>,
    pub trim_unit: Option<ElapsedTime>,
    pub time_limit: Option<ElapsedTime>,
}

/// Stateful step filter: remembers the last value it forwarded and (for
/// the time limit) the timestamp it last forwarded at.
#[derive(Debug, Clone, Default)]
pub struct StepFilter {
    config: StepFilterConfig,
    previous: Option<PointValue>,
    last_emitted_at: Option<Timestamp>,
}

impl StepFilter {
    pub fn new(config: StepFilterConfig) -> Self {
        Self { config, previous: None, last_emitted_at: None }
    }

    /// Seeds the remembered previous value without counting as a forward,
    /// used in tests that start a stream from a known baseline (§8
    /// scenario 3).
    pub fn seeded(config: StepFilterConfig, previous: PointValue) -> Self {
        let last_emitted_at = Some(previous.stamp());
        Self { config, previous: Some(previous), last_emitted_at }
    }

    fn trim(&self, value: PointValue) -> PointValue {
        match self.config.trim_unit {
            Some(unit) => {
                let trimmed = value.stamp().floored(unit);
                let mut out = if value.is_deleted() {
                    PointValue::tombstone(value.point(), trimmed)
                } else {
                    PointValue::new(value.point(), trimmed, value.value().cloned())
                };
                if let Some(state) = value.state() {
                    out = out.with_state(state);
                }
                out
            }
            None => value,
        }
    }

    /// Deadband/floor/ceiling threshold for moving from `previous` to
    /// `incoming`. Floor applies when the signal steps down, ceiling when
    /// it steps up; either falls back to the plain deadband gap/ratio when
    /// not configured (§4.5).
    fn threshold(&self, previous: f64, incoming: f64) -> f64 {
        let (gap, ratio) = if incoming < previous {
            (self.config.floor_gap.unwrap_or(self.config.deadband_gap), self.config.floor_ratio.unwrap_or(self.config.deadband_ratio))
        } else if incoming > previous {
            (self.config.ceiling_gap.unwrap_or(self.config.deadband_gap), self.config.ceiling_ratio.unwrap_or(self.config.deadband_ratio))
        } else {
            (self.config.deadband_gap, self.config.deadband_ratio)
        };
        gap + ratio * previous.abs()
    }

    fn time_limit_exceeded(&self, stamp: Timestamp) -> bool {
        match (self.config.time_limit, self.last_emitted_at) {
            (Some(limit), Some(last)) if !limit.is_infinity() => stamp.sub(last) >= limit,
            _ => false,
        }
    }

    /// Applies the filter, returning the values to forward (0 or 1 for the
    /// step filter: it never splits one incoming value into several).
    pub fn apply(&mut self, incoming: PointValue) -> Vec<PointValue> {
        let incoming = self.trim(incoming);

        let forward = match &self.previous {
            None => true,
            Some(previous) => match (numeric(previous), numeric(&incoming)) {
                (Some(p), Some(i)) => {
                    let diff = (i - p).abs();
                    diff > self.threshold(p, i) || self.time_limit_exceeded(incoming.stamp())
                }
                _ => true,
            },
        };

        if forward {
            self.previous = Some(incoming.clone());
            self.last_emitted_at = Some(incoming.stamp());
            vec![incoming]
        } else {
            Vec::new()
        }
    }
}
