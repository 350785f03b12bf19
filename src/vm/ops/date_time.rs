//! Date/time construction and arithmetic (§4.1, §4.7). `now`-style
//! wall-clock reads are not exposed here: the registry's operations are
//! plain functions over the stack with no access to the `Evaluator`'s
//! injected `Clock`, so "current time" is pushed onto the stack by the
//! engine itself before a program runs, not fetched by an operation.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::temporal::{ElapsedTime, Timestamp};
use crate::value::tagged::Value;
use crate::vm::ops::{pop, pop_string};
use crate::vm::registry::Registry;

/// 100ns units per calendar day; mirrors `Timestamp`'s own internal unit
/// (private to `temporal::timestamp`), used here only for `mjd`.
const UNITS_PER_DAY_F64: f64 = 10_000_000.0 * 86_400.0;
/// Modified Julian Date of the Unix epoch (1970-01-01T00:00:00Z).
const MJD_UNIX_EPOCH: f64 = 40_587.0;

fn pop_timestamp(stack: &mut Vec<Value>) -> Result<Timestamp, String> {
    match pop(stack)? {
        Value::DateTime(t) => Ok(t),
        other => Err(format!("expected a datetime, found {}", other.type_name())),
    }
}

fn pop_elapsed(stack: &mut Vec<Value>) -> Result<ElapsedTime, String> {
    match pop(stack)? {
        Value::ElapsedTime(e) => Ok(e),
        Value::Long(l) => Ok(ElapsedTime::from_seconds_f64(l as f64)),
        other => Err(format!("expected an elapsed time, found {}", other.type_name())),
    }
}

fn pop_zone(stack: &mut Vec<Value>) -> Result<Tz, String> {
    let name = pop_string(stack)?;
    if name.is_empty() {
        return Ok(chrono_tz::UTC);
    }
    Tz::from_str(&name).map_err(|e| e.to_string())
}

/// `timestamp` rendered as local wall-clock fields in `zone` (§4.7
/// `year`/`month`/`day`/`hour`/`minute`/`second`/`dow`/`dim`/`split`).
fn local_datetime(t: Timestamp, zone: Tz) -> chrono::DateTime<Tz> {
    zone.from_utc_datetime(&t.to_chrono().naive_utc())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("valid calendar month");
    let first_of_this = NaiveDate::from_ymd_opt(year, month, 1).expect("valid calendar month");
    (first_of_next - first_of_this).num_days() as u32
}

pub fn register(registry: &mut Registry) {
    registry.add("datetime", |s| {
        let v = pop(s)?;
        let t = match v {
            Value::Long(millis) => Timestamp::from_millis(millis),
            Value::DateTime(t) => t,
            Value::String(text) => Timestamp::parse(&text).map_err(|e| e.to_string())?,
            other => return Err(format!("cannot convert {} to datetime", other.type_name())),
        };
        s.push(Value::DateTime(t));
        Ok(())
    });
    registry.add("datetime?", |s| {
        let is_dt = matches!(s.last(), Some(Value::DateTime(_)));
        s.push(Value::Boolean(is_dt));
        Ok(())
    });
    registry.add("datetime.parse", |s| {
        let text = pop_string(s)?;
        let t = Timestamp::parse(&text).map_err(|e| e.to_string())?;
        s.push(Value::DateTime(t));
        Ok(())
    });
    registry.add("datetime.format", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::String(t.format(zone)));
        Ok(())
    });

    registry.add("elapsed", |s| {
        let v = pop(s)?;
        let e = match v {
            Value::Long(seconds) => ElapsedTime::from_seconds_f64(seconds as f64),
            Value::Double(seconds) => ElapsedTime::from_seconds_f64(seconds),
            Value::ElapsedTime(e) => e,
            Value::String(text) => ElapsedTime::parse(&text).map_err(|e| e.to_string())?,
            other => return Err(format!("cannot convert {} to elapsed", other.type_name())),
        };
        s.push(Value::ElapsedTime(e));
        Ok(())
    });
    registry.add("elapsed?", |s| {
        let is_elapsed = matches!(s.last(), Some(Value::ElapsedTime(_)));
        s.push(Value::Boolean(is_elapsed));
        Ok(())
    });
    registry.add("elapsed.parse", |s| {
        let text = pop_string(s)?;
        let e = ElapsedTime::parse(&text).map_err(|e| e.to_string())?;
        s.push(Value::ElapsedTime(e));
        Ok(())
    });
    registry.add("elapsed.format", |s| {
        let e = pop_elapsed(s)?;
        s.push(Value::String(e.format()));
        Ok(())
    });
    registry.add("elapsed.seconds", |s| {
        let e = pop_elapsed(s)?;
        s.push(Value::Double(e.as_seconds_f64()));
        Ok(())
    });

    registry.add("dt+", |s| {
        let e = pop_elapsed(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::DateTime(t.after(e)));
        Ok(())
    });
    registry.add("dt-", |s| {
        let b = pop(s)?;
        let t = pop_timestamp(s)?;
        match b {
            Value::DateTime(other) => s.push(Value::ElapsedTime(t.sub(other))),
            Value::ElapsedTime(e) => s.push(Value::DateTime(t.before(e))),
            Value::Long(seconds) => s.push(Value::DateTime(t.before(ElapsedTime::from_seconds_f64(seconds as f64)))),
            other => return Err(format!("expected a datetime or elapsed, found {}", other.type_name())),
        }
        Ok(())
    });
    registry.add("midnight", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::DateTime(t.midnight(zone)));
        Ok(())
    });
    registry.add("next_day", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::DateTime(t.next_day(zone)));
        Ok(())
    });

    registry.add("year", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::Long(local_datetime(t, zone).year() as i64));
        Ok(())
    });
    registry.add("month", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::Long(local_datetime(t, zone).month() as i64));
        Ok(())
    });
    registry.add("day", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::Long(local_datetime(t, zone).day() as i64));
        Ok(())
    });
    registry.add("hour", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::Long(local_datetime(t, zone).hour() as i64));
        Ok(())
    });
    registry.add("minute", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::Long(local_datetime(t, zone).minute() as i64));
        Ok(())
    });
    registry.add("second", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::Long(local_datetime(t, zone).second() as i64));
        Ok(())
    });
    // Monday = 1 .. Sunday = 7.
    registry.add("dow", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::Long(local_datetime(t, zone).weekday().number_from_monday() as i64));
        Ok(())
    });
    registry.add("dim", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        let local = local_datetime(t, zone);
        s.push(Value::Long(days_in_month(local.year(), local.month()) as i64));
        Ok(())
    });
    registry.add("raw", |s| {
        let t = pop_timestamp(s)?;
        s.push(Value::Long(t.raw()));
        Ok(())
    });
    // Modified Julian Date; zone-independent, matching `raw`.
    registry.add("mjd", |s| {
        let t = pop_timestamp(s)?;
        s.push(Value::Double(MJD_UNIX_EPOCH + t.raw() as f64 / UNITS_PER_DAY_F64));
        Ok(())
    });
    registry.add("str", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        s.push(Value::String(t.format(zone)));
        Ok(())
    });
    // The zone's UTC offset, in seconds, at that instant (DST-aware).
    registry.add("tz", |s| {
        let zone = pop_zone(s)?;
        let t = pop_timestamp(s)?;
        let offset = zone.offset_from_utc_datetime(&t.to_chrono().naive_utc()).fix().local_minus_utc();
        s.push(Value::Long(offset as i64));
        Ok(())
    });
    // Shared with `string::split` (same operation name dispatched by the
    // runtime type one level below the top of the stack): `timestamp zone
    // split` decomposes into calendar fields, `text sep split` tokenizes.
    registry.add("split", |s| {
        let is_datetime = s.len() >= 2 && matches!(s[s.len() - 2], Value::DateTime(_));
        if is_datetime {
            split_datetime(s)
        } else {
            super::string::split_on_separator(s)
        }
    });
    // Inverse of the datetime `split`: a 6-field `Tuple` (year, month, day,
    // hour, minute, second) plus a zone name, folded back to a `DateTime`.
    registry.add("join", |s| {
        let zone = pop_zone(s)?;
        let parts = match pop(s)? {
            Value::Tuple(parts) => parts,
            other => return Err(format!("expected a tuple of calendar fields, found {}", other.type_name())),
        };
        if parts.len() != 6 {
            return Err(format!(
                "expected 6 calendar fields (year, month, day, hour, minute, second), found {}",
                parts.len()
            ));
        }
        let mut fields = [0i64; 6];
        for (i, part) in parts.iter().enumerate() {
            fields[i] = match part {
                Value::Long(l) => *l,
                other => return Err(format!("expected a long calendar field, found {}", other.type_name())),
            };
        }
        let [year, month, day, hour, minute, second] = fields;
        let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
            .ok_or_else(|| "invalid calendar date".to_string())?;
        let time = NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32)
            .ok_or_else(|| "invalid time of day".to_string())?;
        let naive = NaiveDateTime::new(date, time);
        let local = zone
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| zone.from_local_datetime(&naive).latest())
            .ok_or_else(|| "local time does not exist in this zone".to_string())?;
        s.push(Value::DateTime(Timestamp::from_chrono(local.with_timezone(&chrono::Utc))));
        Ok(())
    });
}

/// `timestamp zone split` -> `Tuple([year, month, day, hour, minute, second])`.
fn split_datetime(s: &mut Vec<Value>) -> Result<(), String> {
    let zone = pop_zone(s)?;
    let t = pop_timestamp(s)?;
    let local = local_datetime(t, zone);
    s.push(Value::Tuple(vec![
        Value::Long(local.year() as i64),
        Value::Long(local.month() as i64),
        Value::Long(local.day() as i64),
        Value::Long(local.hour() as i64),
        Value::Long(local.minute() as i64),
        Value::Long(local.second() as i64),
    ]));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_plus_elapsed_then_dt_minus_recovers_elapsed() {
        let registry = Registry::new();
        let t = Timestamp::from_raw(10_000_000_000);
        let e = ElapsedTime::from_millis(2_500);
        let mut stack = vec![Value::DateTime(t), Value::ElapsedTime(e)];
        (registry.get("dt+").unwrap())(&mut stack).unwrap();
        let advanced = match stack.pop().unwrap() {
            Value::DateTime(t) => t,
            other => panic!("expected datetime, got {other:?}"),
        };
        let mut stack = vec![Value::DateTime(advanced), Value::DateTime(t)];
        (registry.get("dt-").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::ElapsedTime(e)]);
    }

    #[test]
    fn empty_zone_name_defaults_to_utc() {
        let registry = Registry::new();
        let t = Timestamp::from_raw(10_000_000_000);
        let mut stack = vec![Value::DateTime(t), Value::String(String::new())];
        (registry.get("midnight").unwrap())(&mut stack).unwrap();
        assert!(matches!(stack[0], Value::DateTime(_)));
    }

    #[test]
    fn calendar_accessors_read_utc_fields() {
        let registry = Registry::new();
        let t = Timestamp::from_chrono(
            chrono::Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 15).unwrap(),
        );
        let accessor = |name: &str| {
            let mut stack = vec![Value::DateTime(t), Value::String(String::new())];
            (registry.get(name).unwrap())(&mut stack).unwrap();
            stack.pop().unwrap()
        };
        assert_eq!(accessor("year"), Value::Long(2024));
        assert_eq!(accessor("month"), Value::Long(3));
        assert_eq!(accessor("day"), Value::Long(10));
        assert_eq!(accessor("hour"), Value::Long(7));
        assert_eq!(accessor("minute"), Value::Long(30));
        assert_eq!(accessor("second"), Value::Long(15));
        assert_eq!(accessor("dow"), Value::Long(7)); // 2024-03-10 is a Sunday.
        assert_eq!(accessor("dim"), Value::Long(31));
        assert_eq!(accessor("raw"), Value::Long(t.raw()));
    }

    #[test]
    fn split_then_join_round_trips_to_the_second() {
        let registry = Registry::new();
        let t = Timestamp::from_chrono(
            chrono::Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 15).unwrap(),
        );
        let mut stack = vec![Value::DateTime(t), Value::String(String::new())];
        (registry.get("split").unwrap())(&mut stack).unwrap();
        assert!(matches!(stack.last(), Some(Value::Tuple(_))));
        stack.push(Value::String(String::new()));
        (registry.get("join").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::DateTime(t)]);
    }

    #[test]
    fn split_dispatches_to_string_split_for_strings() {
        let registry = Registry::new();
        let mut stack = vec![Value::String("a,b".to_string()), Value::String(",".to_string())];
        (registry.get("split").unwrap())(&mut stack).unwrap();
        assert_eq!(
            stack,
            vec![Value::Tuple(vec![Value::String("a".to_string()), Value::String("b".to_string())])]
        );
    }

    #[test]
    fn mjd_of_unix_epoch_is_40587() {
        let registry = Registry::new();
        let mut stack = vec![Value::DateTime(Timestamp::from_raw(0))];
        (registry.get("mjd").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::Double(40_587.0)]);
    }
}
