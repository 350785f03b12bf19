use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::graph::params::Params;
use crate::sync::{
    CrontabSync, ElapsedSync, StampsSync, Sync, CRONTAB_PARAM, ELAPSED_PARAM, LIMITS_NOT_AFTER_PARAM,
    LIMITS_NOT_BEFORE_PARAM, OFFSET_PARAM, STAMP_PARAM, ZONE_PARAM,
};
use crate::temporal::{ElapsedTime, TimeInterval, Timestamp};

fn zone_of(params: &Params) -> Result<Tz> {
    match params.value(ZONE_PARAM).and_then(|v| v.as_str()) {
        Some(name) => name.parse::<Tz>().map_err(|_| Error::bad_sync(format!("unknown zone {name:?}"))),
        None => Ok(chrono_tz::UTC),
    }
}

fn limits_of(params: &Params) -> Result<TimeInterval> {
    let not_before = match params.value(LIMITS_NOT_BEFORE_PARAM).and_then(|v| v.as_str()) {
        Some(s) => Timestamp::parse(s)?,
        None => Timestamp::BEGINNING_OF_TIME,
    };
    let not_after = match params.value(LIMITS_NOT_AFTER_PARAM).and_then(|v| v.as_str()) {
        Some(s) => Timestamp::parse(s)?,
        None => Timestamp::END_OF_TIME,
    };
    Ok(TimeInterval::new(not_before, not_after))
}

/// Builds a `Sync` from a keyed-group `Params` (§6 Config surface).
/// Exactly one of `CRONTAB_PARAM`, `ELAPSED_PARAM`, `STAMP_PARAM` must be
/// present; any other combination (none, or more than one) is `BadSync`.
pub(crate) fn build(params: &Params) -> Result<Sync> {
    let has_crontab = params.contains(CRONTAB_PARAM);
    let has_elapsed = params.contains(ELAPSED_PARAM);
    let has_stamps = params.contains(STAMP_PARAM);

    match (has_crontab, has_elapsed, has_stamps) {
        (true, false, false) => {
            let entry = params.value(CRONTAB_PARAM).and_then(|v| v.as_str()).ok_or_else(|| {
                Error::bad_sync(format!("{CRONTAB_PARAM} must be a string"))
            })?;
            let zone = zone_of(params)?;
            let limits = limits_of(params)?;
            Ok(Sync::Crontab(CrontabSync::with_limits(entry, zone, limits)?))
        }
        (false, true, false) => {
            let period = params
                .value(ELAPSED_PARAM)
                .and_then(|v| v.as_elapsed())
                .ok_or_else(|| Error::bad_sync(format!("{ELAPSED_PARAM} must be an elapsed time")))?;
            let offset = params
                .value(OFFSET_PARAM)
                .and_then(|v| v.as_elapsed())
                .unwrap_or(ElapsedTime::EMPTY);
            let zone = zone_of(params)?;
            let limits = limits_of(params)?;
            Ok(Sync::Elapsed(ElapsedSync::new(period, offset, limits, zone)?))
        }
        (false, false, true) => {
            let zone = zone_of(params)?;
            let limits = limits_of(params)?;
            let mut stamps = Vec::new();
            for v in params.values(STAMP_PARAM).unwrap_or(&[]) {
                let s = v.as_str().ok_or_else(|| Error::bad_sync(format!("{STAMP_PARAM} must be a string")))?;
                stamps.push(Timestamp::parse(s)?);
            }
            Ok(Sync::Stamps(StampsSync::with_limits(stamps, zone, limits)?))
        }
        (false, false, false) => {
            Err(Error::bad_sync("no sync schedule keys present (expected one of CRONTAB/ELAPSED/STAMP)"))
        }
        _ => Err(Error::bad_sync("more than one sync schedule kind configured")),
    }
}
