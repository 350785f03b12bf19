use chrono_tz::Tz;

use crate::temporal::elapsed::ElapsedTime;
use crate::temporal::timestamp::{Timestamp, UNITS_PER_SECOND};

const UNITS_PER_DAY: i64 = UNITS_PER_SECOND * 86_400;
const UNITS_PER_HOUR: i64 = UNITS_PER_SECOND * 3_600;
const UNITS_PER_MINUTE: i64 = UNITS_PER_SECOND * 60;

/// Canonical `PnDTHH:MM:SS.fffffff` rendering (§4.1).
pub(crate) fn format_elapsed(e: ElapsedTime) -> String {
    if e.is_infinity() {
        return "INFINITY".to_string();
    }
    if e.is_invalid() {
        return "INVALID".to_string();
    }
    if e.is_empty() {
        return "PT00:00:00".to_string();
    }
    let raw = e.raw();
    let days = raw / UNITS_PER_DAY;
    let rem = raw % UNITS_PER_DAY;
    let hh = rem / UNITS_PER_HOUR;
    let mm = (rem % UNITS_PER_HOUR) / UNITS_PER_MINUTE;
    let ss = (rem % UNITS_PER_MINUTE) / UNITS_PER_SECOND;
    let frac = rem % UNITS_PER_SECOND;

    let mut out = String::new();
    if days != 0 {
        out.push_str(&format!("P{}D", days));
    } else {
        out.push('P');
    }
    out.push('T');
    out.push_str(&format!("{:02}:{:02}:{:02}", hh, mm, ss));
    if frac != 0 {
        out.push_str(&format!(".{:07}", frac));
    }
    out
}

/// ISO-8601 rendering in `zone`.
pub(crate) fn format_timestamp(t: Timestamp, zone: Tz) -> String {
    use chrono::TimeZone;
    let local = zone.from_utc_datetime(&t.to_chrono().naive_utc());
    local.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_formats_canonically() {
        assert_eq!(format_elapsed(ElapsedTime::EMPTY), "PT00:00:00");
        assert_eq!(
            format_elapsed(ElapsedTime::from_raw(UNITS_PER_DAY + UNITS_PER_HOUR)),
            "P1DT01:00:00"
        );
    }

    #[test]
    fn elapsed_formats_sentinels() {
        assert_eq!(format_elapsed(ElapsedTime::INFINITY), "INFINITY");
        assert_eq!(format_elapsed(ElapsedTime::INVALID), "INVALID");
    }
}
