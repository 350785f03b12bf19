//! --------------------------
//! Value Filters (§4.5)
//! --------------------------
//! A filter is a stateful, single-point function: given a new
//! `PointValue`, it returns the subset (0 or more values) that should be
//! forwarded. The set of strategies is fixed by spec (step, composing
//! deadband/floor/ceiling/trim/time-limit, or disabled) so this is a
//! closed enum rather than a trait object (§9 Design Notes), matching the
//! `Sync` treatment in `crate::sync`.

mod config;
mod step;

pub use config::build;
pub use step::StepFilter;

use crate::value::point_value::PointValue;

/// Recognized configuration keys (§6 "Config surface", Point section).
pub const STEP_SIZE_PARAM: &str = "STEP_SIZE";
pub const DEADBAND_GAP_PARAM: &str = "DEADBAND_GAP";
pub const DEADBAND_RATIO_PARAM: &str = "DEADBAND_RATIO";
pub const FLOOR_GAP_PARAM: &str = "FLOOR_GAP";
pub const FLOOR_RATIO_PARAM: &str = "FLOOR_RATIO";
pub const CEILING_GAP_PARAM: &str = "CEILING_GAP";
pub const CEILING_RATIO_PARAM: &str = "CEILING_RATIO";
pub const FILTER_STAMP_TRIM_UNIT_PARAM: &str = "FILTER_STAMP_TRIM_UNIT";
pub const FILTER_TIME_LIMIT_PARAM: &str = "FILTER_TIME_LIMIT";

/// A per-point value filter. `Disabled` forwards every value unconditionally
/// (§4.5 "Disabled filters forward unconditionally").
#[derive(Debug, Clone)]
pub enum Filter {
    Step(StepFilter),
    Disabled,
}

impl Filter {
    /// Applies the filter to `incoming`, given the filter's own memory of
    /// the previously forwarded value. Returns the values to forward, in
    /// order; `previous` is only consulted, never mutated here — the
    /// caller (batch engine) updates the filter's remembered state once a
    /// value is actually forwarded, since a filter is only ever advanced
    /// by values that survive it.
    pub fn apply(&mut self, incoming: PointValue) -> Vec<PointValue> {
        match self {
            Filter::Disabled => vec![incoming],
            Filter::Step(step) => step.apply(incoming),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::temporal::Timestamp;
    use crate::value::tagged::Value;

    #[test]
    fn disabled_filter_forwards_unconditionally() {
        let mut filter = Filter::Disabled;
        let point = Uuid::new_v4();
        let pv = PointValue::new(point, Timestamp::from_raw(0), Some(Value::Double(1.0)));
        assert_eq!(filter.apply(pv.clone()), vec![pv]);
    }
}
