use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::sync::SyncCursor;
use crate::temporal::{TimeInterval, Timestamp};

/// One parsed 5-field cron entry: minute, hour, day-of-month, month,
/// day-of-week. `*` is tracked explicitly because dom/dow combine with
/// OR semantics only when both are restricted (§4.2).
#[derive(Debug, Clone)]
struct Field {
    values: Vec<u32>,
    wildcard: bool,
}

impl Field {
    fn matches(&self, v: u32) -> bool {
        self.wildcard || self.values.contains(&v)
    }
}

fn parse_field(spec: &str, min: u32, max: u32) -> Result<Field> {
    if spec == "*" {
        return Ok(Field { values: (min..=max).collect(), wildcard: true });
    }
    let mut values = Vec::new();
    for part in spec.split(',') {
        let (range_part, step) = match part.split_once('/') {
            Some((r, s)) => (r, Some(s.parse::<u32>().map_err(|_| bad(spec))?)),
            None => (part, None),
        };
        let (lo, hi) = if range_part == "*" {
            (min, max)
        } else if let Some((a, b)) = range_part.split_once('-') {
            (a.parse::<u32>().map_err(|_| bad(spec))?, b.parse::<u32>().map_err(|_| bad(spec))?)
        } else {
            let v = range_part.parse::<u32>().map_err(|_| bad(spec))?;
            (v, v)
        };
        if lo < min || hi > max || lo > hi {
            return Err(bad(spec));
        }
        let step = step.unwrap_or(1).max(1);
        let mut v = lo;
        while v <= hi {
            values.push(v);
            v += step;
        }
    }
    values.sort_unstable();
    values.dedup();
    Ok(Field { values, wildcard: false })
}

fn bad(spec: &str) -> Error {
    Error::bad_sync(format!("malformed crontab field {spec:?}"))
}

/// Standard 5-field cron entry; `change` rolls the zoned calendar forward
/// or back to the next/previous matching instant, DST-aware (§4.2).
#[derive(Debug, Clone)]
pub struct CrontabSync {
    minute: Field,
    hour: Field,
    dom: Field,
    month: Field,
    dow: Field,
    zone: Tz,
    limits: TimeInterval,
    current: Timestamp,
}

impl CrontabSync {
    pub fn new(entry: &str, zone: Tz) -> Result<Self> {
        Self::with_limits(entry, zone, TimeInterval::UNBOUNDED)
    }

    pub fn with_limits(entry: &str, zone: Tz, limits: TimeInterval) -> Result<Self> {
        let fields: Vec<&str> = entry.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(Error::bad_sync(format!("crontab entry must have 5 fields: {entry:?}")));
        }
        Ok(Self {
            minute: parse_field(fields[0], 0, 59)?,
            hour: parse_field(fields[1], 0, 23)?,
            dom: parse_field(fields[2], 1, 31)?,
            month: parse_field(fields[3], 1, 12)?,
            dow: parse_field(fields[4], 0, 6)?,
            zone,
            limits,
            current: Timestamp::BEGINNING_OF_TIME,
        })
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom_ok = self.dom.matches(date.day());
        let dow_ok = self.dow.matches(date.weekday().num_days_from_sunday());
        match (self.dom.wildcard, self.dow.wildcard) {
            (true, true) => true,
            (true, false) => dow_ok,
            (false, true) => dom_ok,
            (false, false) => dom_ok || dow_ok,
        }
    }

    fn naive_matches(&self, naive: NaiveDateTime) -> bool {
        self.minute.matches(naive.minute())
            && self.hour.matches(naive.hour())
            && self.month.matches(naive.month())
            && self.day_matches(naive.date())
    }

    /// Scans naive calendar minutes (no zone-validity check) for the next
    /// match strictly after `from`, bounded to avoid runaway loops on an
    /// unsatisfiable field combination (e.g. Feb 30).
    fn next_naive_match(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut candidate = from + chrono::Duration::minutes(1);
        for _ in 0..(366 * 24 * 60 * 5) {
            if self.naive_matches(candidate) {
                return Some(candidate);
            }
            candidate += chrono::Duration::minutes(1);
        }
        None
    }

    fn previous_naive_match(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut candidate = from - chrono::Duration::minutes(1);
        for _ in 0..(366 * 24 * 60 * 5) {
            if self.naive_matches(candidate) {
                return Some(candidate);
            }
            candidate -= chrono::Duration::minutes(1);
        }
        None
    }

    /// Resolves a naive local datetime to a concrete instant in `self.zone`,
    /// skipping forward through spring-forward gaps one minute at a time
    /// and taking the earliest leg of a fall-back ambiguity.
    fn resolve_forward(&self, naive: NaiveDateTime) -> Timestamp {
        let mut candidate = naive;
        loop {
            match self.zone.from_local_datetime(&candidate).earliest() {
                Some(dt) => return Timestamp::from_chrono(dt.with_timezone(&chrono::Utc)),
                None => candidate += chrono::Duration::minutes(1),
            }
        }
    }

    fn resolve_backward(&self, naive: NaiveDateTime) -> Timestamp {
        let mut candidate = naive;
        loop {
            match self.zone.from_local_datetime(&candidate).latest() {
                Some(dt) => return Timestamp::from_chrono(dt.with_timezone(&chrono::Utc)),
                None => candidate -= chrono::Duration::minutes(1),
            }
        }
    }

    fn current_naive(&self) -> NaiveDateTime {
        self.zone.from_utc_datetime(&self.current.to_chrono().naive_utc()).naive_local()
    }
}

impl SyncCursor for CrontabSync {
    fn set_current(&mut self, t: Timestamp) {
        self.current = t;
    }

    fn current(&self) -> Timestamp {
        self.current
    }

    fn next_stamp(&mut self) -> Option<Timestamp> {
        let naive = self.next_naive_match(self.current_naive())?;
        let candidate = self.resolve_forward(naive);
        if self.limits.contains(candidate) {
            self.current = candidate;
            Some(candidate)
        } else {
            None
        }
    }

    fn previous_stamp(&mut self) -> Option<Timestamp> {
        let naive = self.previous_naive_match(self.current_naive())?;
        let candidate = self.resolve_backward(naive);
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
        let naive = self.zone.from_utc_datetime(&t.to_chrono().naive_utc()).naive_local();
        naive.time() == NaiveTime::from_hms_opt(naive.hour(), naive.minute(), 0).unwrap()
            && self.naive_matches(naive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_crontab_rolls_forward_over_dst_gap() {
        let mut sync = CrontabSync::new("0 2 * * *", chrono_tz::America::New_York).unwrap();
        let start = Timestamp::parse("2024-03-10T00:00:00-05:00").unwrap();
        sync.set_current(start);

        let next = sync.next_stamp().unwrap();
        let expected = Timestamp::parse("2024-03-10T03:00:00-04:00").unwrap();
        assert_eq!(next, expected);
    }

    #[test]
    fn every_minute_entry_advances_by_one_minute() {
        let mut sync = CrontabSync::new("* * * * *", chrono_tz::UTC).unwrap();
        let start = Timestamp::parse("2024-06-01T00:00:00Z").unwrap();
        sync.set_current(start);
        let next = sync.next_stamp().unwrap();
        assert_eq!(next, start.after(crate::temporal::ElapsedTime::from_millis(60_000)));
    }

    #[test]
    fn is_in_sync_matches_configured_fields() {
        let sync = CrontabSync::new("30 9 * * 1-5", chrono_tz::UTC).unwrap();
        let weekday_930 = Timestamp::parse("2024-06-03T09:30:00Z").unwrap(); // Monday
        let weekend_930 = Timestamp::parse("2024-06-01T09:30:00Z").unwrap(); // Saturday
        assert!(sync.is_in_sync(weekday_930));
        assert!(!sync.is_in_sync(weekend_930));
    }

    #[test]
    fn dom_and_dow_combine_with_or_when_both_restricted() {
        let sync = CrontabSync::new("0 0 1 * 1", chrono_tz::UTC).unwrap();
        // 2024-07-01 is a Monday *and* the 1st -- matches either way.
        assert!(sync.is_in_sync(Timestamp::parse("2024-07-01T00:00:00Z").unwrap()));
        // 2024-07-08 is a Monday but not the 1st -- OR semantics still match.
        assert!(sync.is_in_sync(Timestamp::parse("2024-07-08T00:00:00Z").unwrap()));
        // 2024-07-02 is neither the 1st nor a Monday.
        assert!(!sync.is_in_sync(Timestamp::parse("2024-07-02T00:00:00Z").unwrap()));
    }

    #[test]
    fn rejects_entries_without_five_fields() {
        assert!(CrontabSync::new("0 2 * *", chrono_tz::UTC).is_err());
    }
}
