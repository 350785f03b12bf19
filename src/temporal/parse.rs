//! Parsing for the three grammars of §4.1, tried in order:
//!   1. Elapsed  `P?(d(T|_|-|space))?(HH:MM(:SS(.fff)?)?)?`
//!   2. Seconds  `d+.d+`
//!   3. Duration `PnDTnHnMnS.f`
//!
//! A lone integer with no separator is milliseconds; the same integer
//! behind a leading `P` is days. `spec.md` §9 flags this as an asymmetry
//! to confirm rather than silently "fix"; DESIGN.md records the decision
//! to keep it exactly as specified.

use crate::error::{Error, Result};
use crate::temporal::elapsed::ElapsedTime;
use crate::temporal::timestamp::{Timestamp, UNITS_PER_SECOND};

const UNITS_PER_DAY: i64 = UNITS_PER_SECOND * 86_400;
const UNITS_PER_HOUR: i64 = UNITS_PER_SECOND * 3_600;
const UNITS_PER_MINUTE: i64 = UNITS_PER_SECOND * 60;

fn invalid(input: &str, reason: &'static str) -> Error {
    Error::InvalidTimeFormat { input: input.to_string(), reason }
}

/// Parses a fractional-seconds suffix (e.g. the `.fff` in `12.500`) into
/// 100ns units, independent of how many digits follow the dot.
fn frac_to_units(frac_digits: &str) -> Option<i64> {
    let mut digits: String = frac_digits.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() > 7 {
        digits.truncate(7);
    }
    while digits.len() < 7 {
        digits.push('0');
    }
    digits.parse().ok()
}

fn parse_hms(rest: &str) -> Option<i64> {
    let parts: Vec<&str> = rest.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    let hh: i64 = parts[0].parse().ok()?;
    let mm: i64 = parts[1].parse().ok()?;
    let mut sec_units = 0i64;
    if parts.len() == 3 {
        let sec_part = parts[2];
        if let Some(dot) = sec_part.find('.') {
            let ss: i64 = sec_part[..dot].parse().ok()?;
            sec_units = ss * UNITS_PER_SECOND + frac_to_units(&sec_part[dot + 1..])?;
        } else {
            let ss: i64 = sec_part.parse().ok()?;
            sec_units = ss * UNITS_PER_SECOND;
        }
    }
    Some(hh * UNITS_PER_HOUR + mm * UNITS_PER_MINUTE + sec_units)
}

/// Grammar 1: elapsed. Returns `None` if the string does not match.
fn try_grammar_elapsed(s: &str) -> Option<i64> {
    let had_p = s.starts_with('P') || s.starts_with('p');
    let rest0 = if had_p { &s[1..] } else { s };

    if !had_p && !rest0.is_empty() && rest0.chars().all(|c| c.is_ascii_digit()) {
        // Lone integer, no separator, no `P`: milliseconds (§9 asymmetry).
        let ms: i64 = rest0.parse().ok()?;
        return Some(ms * (UNITS_PER_SECOND / 1_000));
    }

    let mut days = 0i64;
    let mut rest = rest0;
    if let Some(idx) = rest.find(|c: char| matches!(c, 'T' | 't' | '_' | '-' | ' ')) {
        let (day_part, remainder) = rest.split_at(idx);
        if !day_part.is_empty() {
            if !day_part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            days = day_part.parse().ok()?;
        }
        rest = &remainder[1..];
    } else if had_p {
        if rest.is_empty() {
            return None;
        }
        if !rest.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        // `P` followed by a bare integer with no time part: days (§9 asymmetry).
        days = rest.parse().ok()?;
        rest = "";
    } else if rest.is_empty() {
        return None;
    }

    let time_units = if rest.is_empty() { 0 } else { parse_hms(rest)? };
    Some(days * UNITS_PER_DAY + time_units)
}

/// Grammar 2: plain fractional seconds, e.g. `12.5`.
fn try_grammar_seconds(s: &str) -> Option<i64> {
    if s.is_empty() || !s.contains('.') {
        return None;
    }
    if !s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value: f64 = s.parse().ok()?;
    Some((value * UNITS_PER_SECOND as f64).round() as i64)
}

/// Grammar 3: ISO-8601-like duration, e.g. `P3DT4H5M6.5S`.
fn try_grammar_duration(s: &str) -> Option<i64> {
    let rest = s.strip_prefix(['P', 'p'])?;
    let (date_part, time_part) = match rest.find(['T', 't']) {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };

    let mut days = 0i64;
    if !date_part.is_empty() {
        let digits = date_part.strip_suffix(['D', 'd'])?;
        days = digits.parse().ok()?;
    }

    let mut units = 0i64;
    if let Some(mut tp) = time_part {
        if let Some(idx) = tp.find(['H', 'h']) {
            units += tp[..idx].parse::<i64>().ok()? * UNITS_PER_HOUR;
            tp = &tp[idx + 1..];
        }
        if let Some(idx) = tp.find(['M', 'm']) {
            units += tp[..idx].parse::<i64>().ok()? * UNITS_PER_MINUTE;
            tp = &tp[idx + 1..];
        }
        if let Some(idx) = tp.find(['S', 's']) {
            let sec_part = &tp[..idx];
            if let Some(dot) = sec_part.find('.') {
                let ss: i64 = sec_part[..dot].parse().ok()?;
                units += ss * UNITS_PER_SECOND + frac_to_units(&sec_part[dot + 1..])?;
            } else if !sec_part.is_empty() {
                units += sec_part.parse::<i64>().ok()? * UNITS_PER_SECOND;
            }
        }
    }

    Some(days * UNITS_PER_DAY + units)
}

pub(crate) fn parse_elapsed(input: &str) -> Result<ElapsedTime> {
    let s = input.trim();
    if let Some(raw) = try_grammar_elapsed(s) {
        return Ok(ElapsedTime::from_raw(raw));
    }
    if let Some(raw) = try_grammar_seconds(s) {
        return Ok(ElapsedTime::from_raw(raw));
    }
    if let Some(raw) = try_grammar_duration(s) {
        return Ok(ElapsedTime::from_raw(raw));
    }
    Err(invalid(input, "matched none of the elapsed/seconds/duration grammars"))
}

pub(crate) fn parse_timestamp(input: &str) -> Result<Timestamp> {
    let s = input.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(Timestamp::from_chrono(dt.with_timezone(&chrono::Utc)));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Timestamp::from_chrono(naive.and_utc()));
    }
    if let Ok(naive) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Timestamp::from_chrono(naive.and_hms_opt(0, 0, 0).unwrap().and_utc()));
    }
    // Not a calendar string: fall back to the elapsed grammars, treating the
    // parsed value as a raw 100ns count since the epoch.
    let elapsed = parse_elapsed(s)?;
    Ok(Timestamp::from_raw(elapsed.raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_integer_is_milliseconds() {
        let e = parse_elapsed("1500").unwrap();
        assert_eq!(e, ElapsedTime::from_millis(1500));
    }

    #[test]
    fn p_prefixed_integer_is_days() {
        let e = parse_elapsed("P3").unwrap();
        assert_eq!(e.raw(), 3 * UNITS_PER_DAY);
    }

    #[test]
    fn hh_mm_ss_fff() {
        let e = parse_elapsed("01:02:03.500").unwrap();
        let expected = UNITS_PER_SECOND * 3600 + UNITS_PER_SECOND * 2 * 60 + UNITS_PER_SECOND * 3
            + UNITS_PER_SECOND / 2;
        assert_eq!(e.raw(), expected);
    }

    #[test]
    fn days_with_separator_and_time() {
        let a = parse_elapsed("P2T01:00:00").unwrap();
        let b = parse_elapsed("2_01:00:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn seconds_grammar() {
        let e = parse_elapsed("2.5").unwrap();
        assert_eq!(e.raw(), (2.5 * UNITS_PER_SECOND as f64) as i64);
    }

    #[test]
    fn duration_grammar() {
        let e = parse_elapsed("P1DT2H3M4.5S").unwrap();
        let expected =
            UNITS_PER_DAY + 2 * UNITS_PER_HOUR + 3 * UNITS_PER_MINUTE + 4 * UNITS_PER_SECOND + UNITS_PER_SECOND / 2;
        assert_eq!(e.raw(), expected);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_elapsed("not-a-duration").is_err());
    }

    #[test]
    fn iso8601_timestamp_roundtrips_through_rfc3339() {
        let t = Timestamp::parse("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(t.to_chrono().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
