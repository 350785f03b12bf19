use crate::error::{Error, Result};
use crate::filter::step::{StepFilter, StepFilterConfig};
use crate::filter::{
    Filter, CEILING_GAP_PARAM, CEILING_RATIO_PARAM, DEADBAND_GAP_PARAM, DEADBAND_RATIO_PARAM,
    FILTER_STAMP_TRIM_UNIT_PARAM, FILTER_TIME_LIMIT_PARAM, FLOOR_GAP_PARAM, FLOOR_RATIO_PARAM, STEP_SIZE_PARAM,
};
use crate::graph::params::Params;
use crate::temporal::ElapsedTime;

fn number(params: &Params, key: &str) -> Result<Option<f64>> {
    match params.value(key) {
        Some(v) => v
            .as_f64()
            .ok_or_else(|| Error::FilterConfigError { point: String::new(), reason: format!("{key} must be numeric") })
            .map(Some),
        None => Ok(None),
    }
}

fn elapsed(params: &Params, key: &str) -> Result<Option<ElapsedTime>> {
    match params.value(key) {
        Some(v) => v
            .as_elapsed()
            .ok_or_else(|| Error::FilterConfigError { point: String::new(), reason: format!("{key} must be an elapsed time") })
            .map(Some),
        None => Ok(None),
    }
}

/// Builds a `Filter` for one point from its `Params` (§6 Config surface).
/// A point with none of the step-filter keys present gets `Filter::Disabled`
/// — the step filter only activates when at least `STEP_SIZE` or one of the
/// deadband/floor/ceiling/trim/time-limit keys is configured.
pub fn build(point_name: &str, params: &Params) -> Result<Filter> {
    let with_point = |e: Error| match e {
        Error::FilterConfigError { reason, .. } => Error::FilterConfigError { point: point_name.to_string(), reason },
        other => other,
    };

    let has_any = [
        STEP_SIZE_PARAM,
        DEADBAND_GAP_PARAM,
        DEADBAND_RATIO_PARAM,
        FLOOR_GAP_PARAM,
        FLOOR_RATIO_PARAM,
        CEILING_GAP_PARAM,
        CEILING_RATIO_PARAM,
        FILTER_STAMP_TRIM_UNIT_PARAM,
        FILTER_TIME_LIMIT_PARAM,
    ]
    .iter()
    .any(|key| params.contains(key));

    if !has_any {
        return Ok(Filter::Disabled);
    }

    let deadband_gap = number(params, DEADBAND_GAP_PARAM)
        .map_err(with_point)?
        .or(number(params, STEP_SIZE_PARAM).map_err(with_point)?)
        .unwrap_or(0.0);
    let deadband_ratio = number(params, DEADBAND_RATIO_PARAM).map_err(with_point)?.unwrap_or(0.0);
    let floor_gap = number(params, FLOOR_GAP_PARAM).map_err(with_point)?;
    let floor_ratio = number(params, FLOOR_RATIO_PARAM).map_err(with_point)?;
    let ceiling_gap = number(params, CEILING_GAP_PARAM).map_err(with_point)?;
    let ceiling_ratio = number(params, CEILING_RATIO_PARAM).map_err(with_point)?;
    let trim_unit = elapsed(params, FILTER_STAMP_TRIM_UNIT_PARAM).map_err(with_point)?;
    let time_limit = elapsed(params, FILTER_TIME_LIMIT_PARAM).map_err(with_point)?;

    if deadband_gap < 0.0 || deadband_ratio < 0.0 {
        return Err(Error::FilterConfigError {
            point: point_name.to_string(),
            reason: "deadband gap/ratio must be non-negative".to_string(),
        });
    }

    Ok(Filter::Step(StepFilter::new(StepFilterConfig {
        deadband_gap,
        deadband_ratio,
        floor_gap,
        floor_ratio,
        ceiling_gap,
        ceiling_ratio,
        trim_unit,
        time_limit,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::params::ParamValue;

    #[test]
    fn no_keys_gives_disabled_filter() {
        let params = Params::new();
        assert!(matches!(build("P", &params).unwrap(), Filter::Disabled));
    }

    #[test]
    fn deadband_gap_activates_step_filter() {
        let mut params = Params::new();
        params.add(DEADBAND_GAP_PARAM, ParamValue::from(1.0)).unwrap();
        assert!(matches!(build("P", &params).unwrap(), Filter::Step(_)));
    }

    #[test]
    fn negative_deadband_is_rejected() {
        let mut params = Params::new();
        params.add(DEADBAND_GAP_PARAM, ParamValue::from(-1.0)).unwrap();
        let err = build("P", &params).unwrap_err();
        assert!(matches!(err, Error::FilterConfigError { .. }));
    }
}
