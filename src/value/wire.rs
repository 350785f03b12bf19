//! `PointValue` wire form (§6): `uuid(16) | rawTimestamp(8) | stateLen(4) |
//! stateUtf8 | tagByte | value`. Tag byte selects the value variant;
//! `Tuple`/`Dict` are length-prefixed and recursive.
//!
//! The distilled wire form has no separate slot for "value absent" or
//! "deleted tombstone" — both are folded into the tag byte as two extra
//! pseudo-variants (`ABSENT`, `DELETED`) alongside the fourteen real
//! `Value` variants, so the literal four-field layout is preserved rather
//! than growing a fifth field (see DESIGN.md).

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_rational::{BigRational, Ratio};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::temporal::{ElapsedTime, Timestamp};
use crate::value::point_value::PointValue;
use crate::value::tagged::{Complex, Value};

const TAG_NULL: u8 = 0;
const TAG_BOOLEAN: u8 = 1;
const TAG_LONG: u8 = 2;
const TAG_DOUBLE: u8 = 3;
const TAG_BIGINTEGER: u8 = 4;
const TAG_BIGDECIMAL: u8 = 5;
const TAG_RATIONAL: u8 = 6;
const TAG_BIGRATIONAL: u8 = 7;
const TAG_COMPLEX: u8 = 8;
const TAG_DATETIME: u8 = 9;
const TAG_ELAPSED: u8 = 10;
const TAG_STRING: u8 = 11;
const TAG_BYTES: u8 = 12;
const TAG_TUPLE: u8 = 13;
const TAG_DICT: u8 = 14;
const TAG_ABSENT: u8 = 15;
const TAG_DELETED: u8 = 16;

const COMPLEX_CARTESIAN: u8 = 0;
const COMPLEX_POLAR: u8 = 1;

fn bad(reason: impl Into<String>) -> Error {
    Error::MetadataInvalid { reason: reason.into() }
}

/// Encodes `value` to its wire form (§6).
pub fn encode_point_value(pv: &PointValue) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(pv.point().as_bytes());
    out.extend_from_slice(&pv.stamp().raw().to_be_bytes());
    let state = pv.state().unwrap_or("");
    out.extend_from_slice(&(state.len() as u32).to_be_bytes());
    out.extend_from_slice(state.as_bytes());
    if pv.is_deleted() {
        out.push(TAG_DELETED);
    } else {
        match pv.value() {
            None => out.push(TAG_ABSENT),
            Some(value) => encode_value(value, &mut out),
        }
    }
    out
}

/// Decodes a wire-form `PointValue` starting at `cursor`, advancing it.
pub fn decode_point_value(bytes: &[u8], cursor: &mut usize) -> Result<PointValue> {
    let uuid = take(bytes, cursor, 16)?;
    let point = Uuid::from_slice(uuid).map_err(|e| bad(format!("malformed uuid: {e}")))?;
    let raw = i64::from_be_bytes(take(bytes, cursor, 8)?.try_into().unwrap());
    let stamp = Timestamp::from_raw(raw);
    let state_len = u32::from_be_bytes(take(bytes, cursor, 4)?.try_into().unwrap()) as usize;
    let state_bytes = take(bytes, cursor, state_len)?.to_vec();
    let state = if state_bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8(state_bytes).map_err(|e| bad(format!("malformed state: {e}")))?)
    };

    let tag = take(bytes, cursor, 1)?[0];
    let (value, deleted) = match tag {
        TAG_ABSENT => (None, false),
        TAG_DELETED => (None, true),
        _ => (Some(decode_tagged_value(tag, bytes, cursor)?), false),
    };

    let mut pv = if deleted { PointValue::tombstone(point, stamp) } else { PointValue::new(point, stamp, value) };
    if let Some(state) = state {
        pv = pv.with_state(state);
    }
    Ok(pv)
}

fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Boolean(b) => {
            out.push(TAG_BOOLEAN);
            out.push(*b as u8);
        }
        Value::Long(l) => {
            out.push(TAG_LONG);
            out.extend_from_slice(&l.to_be_bytes());
        }
        Value::Double(d) => {
            out.push(TAG_DOUBLE);
            out.extend_from_slice(&d.to_be_bytes());
        }
        Value::BigInteger(b) => {
            out.push(TAG_BIGINTEGER);
            write_bytes(out, &b.to_signed_bytes_be());
        }
        Value::BigDecimal(b) => {
            out.push(TAG_BIGDECIMAL);
            write_bytes(out, b.to_string().as_bytes());
        }
        Value::Rational(r) => {
            out.push(TAG_RATIONAL);
            out.extend_from_slice(&r.numer().to_be_bytes());
            out.extend_from_slice(&r.denom().to_be_bytes());
        }
        Value::BigRational(r) => {
            out.push(TAG_BIGRATIONAL);
            write_bytes(out, &r.numer().to_signed_bytes_be());
            write_bytes(out, &r.denom().to_signed_bytes_be());
        }
        Value::Complex(c) => {
            out.push(TAG_COMPLEX);
            match c {
                Complex::Cartesian { re, im } => {
                    out.push(COMPLEX_CARTESIAN);
                    out.extend_from_slice(&re.to_be_bytes());
                    out.extend_from_slice(&im.to_be_bytes());
                }
                Complex::Polar { r, theta } => {
                    out.push(COMPLEX_POLAR);
                    out.extend_from_slice(&r.to_be_bytes());
                    out.extend_from_slice(&theta.to_be_bytes());
                }
            }
        }
        Value::DateTime(t) => {
            out.push(TAG_DATETIME);
            out.extend_from_slice(&t.raw().to_be_bytes());
        }
        Value::ElapsedTime(e) => {
            out.push(TAG_ELAPSED);
            out.extend_from_slice(&e.raw().to_be_bytes());
        }
        Value::String(s) => {
            out.push(TAG_STRING);
            write_bytes(out, s.as_bytes());
        }
        Value::Bytes(b) => {
            out.push(TAG_BYTES);
            write_bytes(out, b);
        }
        Value::Tuple(items) => {
            out.push(TAG_TUPLE);
            out.extend_from_slice(&(items.len() as u32).to_be_bytes());
            for item in items {
                encode_value(item, out);
            }
        }
        Value::Dict(entries) => {
            out.push(TAG_DICT);
            out.extend_from_slice(&(entries.len() as u32).to_be_bytes());
            for (key, value) in entries {
                write_bytes(out, key.as_bytes());
                encode_value(value, out);
            }
        }
    }
}

fn decode_tagged_value(tag: u8, bytes: &[u8], cursor: &mut usize) -> Result<Value> {
    Ok(match tag {
        TAG_NULL => Value::Null,
        TAG_BOOLEAN => Value::Boolean(take(bytes, cursor, 1)?[0] != 0),
        TAG_LONG => Value::Long(i64::from_be_bytes(take(bytes, cursor, 8)?.try_into().unwrap())),
        TAG_DOUBLE => Value::Double(f64::from_be_bytes(take(bytes, cursor, 8)?.try_into().unwrap())),
        TAG_BIGINTEGER => Value::BigInteger(BigInt::from_signed_bytes_be(read_bytes(bytes, cursor)?)),
        TAG_BIGDECIMAL => {
            let raw = read_bytes(bytes, cursor)?;
            let text = std::str::from_utf8(raw).map_err(|e| bad(format!("malformed bigdecimal: {e}")))?;
            Value::BigDecimal(BigDecimal::from_str(text).map_err(|e| bad(format!("malformed bigdecimal: {e}")))?)
        }
        TAG_RATIONAL => {
            let numer = i64::from_be_bytes(take(bytes, cursor, 8)?.try_into().unwrap());
            let denom = i64::from_be_bytes(take(bytes, cursor, 8)?.try_into().unwrap());
            Value::Rational(Ratio::new(numer, denom))
        }
        TAG_BIGRATIONAL => {
            let numer = BigInt::from_signed_bytes_be(read_bytes(bytes, cursor)?);
            let denom = BigInt::from_signed_bytes_be(read_bytes(bytes, cursor)?);
            Value::BigRational(BigRational::new(numer, denom))
        }
        TAG_COMPLEX => {
            let kind = take(bytes, cursor, 1)?[0];
            let a = f64::from_be_bytes(take(bytes, cursor, 8)?.try_into().unwrap());
            let b = f64::from_be_bytes(take(bytes, cursor, 8)?.try_into().unwrap());
            Value::Complex(if kind == COMPLEX_POLAR { Complex::polar(a, b) } else { Complex::cartesian(a, b) })
        }
        TAG_DATETIME => Value::DateTime(Timestamp::from_raw(i64::from_be_bytes(take(bytes, cursor, 8)?.try_into().unwrap()))),
        TAG_ELAPSED => Value::ElapsedTime(ElapsedTime::from_raw(i64::from_be_bytes(take(bytes, cursor, 8)?.try_into().unwrap()))),
        TAG_STRING => {
            let raw = read_bytes(bytes, cursor)?.to_vec();
            Value::String(String::from_utf8(raw).map_err(|e| bad(format!("malformed string: {e}")))?)
        }
        TAG_BYTES => Value::Bytes(read_bytes(bytes, cursor)?.to_vec()),
        TAG_TUPLE => {
            let count = u32::from_be_bytes(take(bytes, cursor, 4)?.try_into().unwrap());
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let tag = take(bytes, cursor, 1)?[0];
                items.push(decode_tagged_value(tag, bytes, cursor)?);
            }
            Value::Tuple(items)
        }
        TAG_DICT => {
            let count = u32::from_be_bytes(take(bytes, cursor, 4)?.try_into().unwrap());
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let key_bytes = read_bytes(bytes, cursor)?.to_vec();
                let key = String::from_utf8(key_bytes).map_err(|e| bad(format!("malformed dict key: {e}")))?;
                let tag = take(bytes, cursor, 1)?[0];
                entries.push((key, decode_tagged_value(tag, bytes, cursor)?));
            }
            Value::Dict(entries)
        }
        other => return Err(bad(format!("unknown wire tag byte {other}"))),
    })
}

fn write_bytes(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(data);
}

fn read_bytes<'a>(bytes: &'a [u8], cursor: &mut usize) -> Result<&'a [u8]> {
    let len = u32::from_be_bytes(take(bytes, cursor, 4)?.try_into().unwrap()) as usize;
    take(bytes, cursor, len)
}

fn take<'a>(bytes: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = *cursor + len;
    if end > bytes.len() {
        return Err(bad("wire buffer truncated"));
    }
    let slice = &bytes[*cursor..end];
    *cursor = end;
    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::tagged::Value;

    fn roundtrip(pv: PointValue) -> PointValue {
        let bytes = encode_point_value(&pv);
        let mut cursor = 0;
        decode_point_value(&bytes, &mut cursor).unwrap()
    }

    #[test]
    fn scalar_values_round_trip() {
        let pv = PointValue::new(Uuid::new_v4(), Timestamp::from_raw(12345), Some(Value::Long(42)));
        let back = roundtrip(pv.clone());
        assert_eq!(back.value(), Some(&Value::Long(42)));
        assert_eq!(back.stamp(), pv.stamp());
        assert_eq!(back.point(), pv.point());
    }

    #[test]
    fn tuple_and_dict_round_trip_recursively() {
        let tuple = Value::Tuple(vec![Value::Long(1), Value::String("a".into())]);
        let pv = PointValue::new(Uuid::new_v4(), Timestamp::from_raw(1), Some(tuple.clone()));
        assert_eq!(roundtrip(pv).value(), Some(&tuple));

        let dict = Value::Dict(vec![("x".into(), Value::Boolean(true))]);
        let pv = PointValue::new(Uuid::new_v4(), Timestamp::from_raw(1), Some(dict.clone()));
        assert_eq!(roundtrip(pv).value(), Some(&dict));
    }

    #[test]
    fn absent_value_round_trips_as_none() {
        let pv = PointValue::new(Uuid::new_v4(), Timestamp::from_raw(1), None);
        assert!(roundtrip(pv).value().is_none());
    }

    #[test]
    fn tombstone_round_trips_as_deleted() {
        let pv = PointValue::tombstone(Uuid::new_v4(), Timestamp::from_raw(1));
        assert!(roundtrip(pv).is_deleted());
    }

    #[test]
    fn state_round_trips() {
        let pv = PointValue::new(Uuid::new_v4(), Timestamp::from_raw(1), Some(Value::Null))
            .with_state("stale");
        assert_eq!(roundtrip(pv).state(), Some("stale"));
    }
}
