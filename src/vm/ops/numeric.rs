//! Generic numeric dispatch (§4.7 Numeric Semantics): `+ - * / % mod div`
//! work across `Long`/`BigInteger`/`Double`/`BigDecimal` by promoting the
//! pair to their common representation (`Long < BigInteger < Double <
//! BigDecimal`), matching e.g. `$1 $2 +` staying a `Long` and
//! `bigdec / bigdec` staying a `BigDecimal` (§8 scenario 4). Rational,
//! BigRational, and Complex arithmetic have their own typed operations in
//! their own modules (§9 DESIGN.md records this as a scope decision) —
//! only conversions/comparisons/unary ops here treat them generically.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::value::tagged::{Complex, Value};
use crate::vm::ops::pop;
use crate::vm::registry::Registry;

const DEFAULT_EPSILON: f64 = 1e-9;

fn rank(v: &Value) -> Option<u8> {
    match v {
        Value::Long(_) => Some(0),
        Value::BigInteger(_) => Some(1),
        Value::Double(_) => Some(2),
        Value::BigDecimal(_) => Some(3),
        _ => None,
    }
}

fn to_long(v: &Value) -> Option<i64> {
    match v {
        Value::Long(l) => Some(*l),
        _ => None,
    }
}

fn to_bigint(v: &Value) -> Option<BigInt> {
    match v {
        Value::Long(l) => Some(BigInt::from(*l)),
        Value::BigInteger(b) => Some(b.clone()),
        _ => None,
    }
}

fn to_bigdec(v: &Value) -> Option<BigDecimal> {
    match v {
        Value::Long(l) => Some(BigDecimal::from(*l)),
        Value::BigInteger(b) => BigDecimal::from_str(&b.to_string()).ok(),
        Value::Double(d) => BigDecimal::from_str(&d.to_string()).ok(),
        Value::BigDecimal(b) => Some(b.clone()),
        _ => None,
    }
}

/// Any value's magnitude as an `f64`, for ordering/tolerance comparisons
/// that do not need to preserve representation (§4.7 "Double comparisons
/// `eq~`, `0~?`").
pub(crate) fn to_double(v: &Value) -> Option<f64> {
    match v {
        Value::Long(l) => Some(*l as f64),
        Value::Double(d) => Some(*d),
        Value::BigInteger(b) => b.to_string().parse().ok(),
        Value::BigDecimal(b) => b.to_string().parse().ok(),
        Value::Rational(r) => Some(*r.numer() as f64 / *r.denom() as f64),
        Value::BigRational(r) => r.to_string().parse().ok().or_else(|| {
            let n: f64 = r.numer().to_string().parse().ok()?;
            let d: f64 = r.denom().to_string().parse().ok()?;
            Some(n / d)
        }),
        Value::Complex(c) => Some(c.r()),
        Value::ElapsedTime(e) => Some(e.as_seconds_f64()),
        _ => None,
    }
}

enum Promoted {
    I(i64, i64),
    B(BigInt, BigInt),
    D(f64, f64),
    C(BigDecimal, BigDecimal),
}

fn promote(a: &Value, b: &Value) -> Result<Promoted, String> {
    let ra = rank(a).ok_or_else(|| format!("expected a number, found {}", a.type_name()))?;
    let rb = rank(b).ok_or_else(|| format!("expected a number, found {}", b.type_name()))?;
    match ra.max(rb) {
        0 => Ok(Promoted::I(to_long(a).unwrap(), to_long(b).unwrap())),
        1 => Ok(Promoted::B(to_bigint(a).unwrap(), to_bigint(b).unwrap())),
        2 => Ok(Promoted::D(to_double(a).unwrap(), to_double(b).unwrap())),
        3 => Ok(Promoted::C(to_bigdec(a).unwrap(), to_bigdec(b).unwrap())),
        _ => unreachable!(),
    }
}

fn arith(
    stack: &mut Vec<Value>,
    i_op: fn(i64, i64) -> Result<Value, String>,
    b_op: fn(BigInt, BigInt) -> Result<Value, String>,
    d_op: fn(f64, f64) -> Value,
    c_op: fn(BigDecimal, BigDecimal) -> Result<Value, String>,
) -> Result<(), String> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    let result = match promote(&a, &b)? {
        Promoted::I(x, y) => i_op(x, y)?,
        Promoted::B(x, y) => b_op(x, y)?,
        Promoted::D(x, y) => d_op(x, y),
        Promoted::C(x, y) => c_op(x, y)?,
    };
    stack.push(result);
    Ok(())
}

fn bigint_rem_euclid(a: &BigInt, b: &BigInt) -> BigInt {
    let r = a % b;
    if r.is_negative() {
        r + b.abs()
    } else {
        r
    }
}

fn bigdec_rem_euclid(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    let r = a % b;
    if r < BigDecimal::from(0) {
        r + b.abs()
    } else {
        r
    }
}

pub fn register(registry: &mut Registry) {
    registry.add("+", |s| {
        arith(
            s,
            |a, b| a.checked_add(b).map(Value::Long).ok_or(()).or_else(|_| Ok(Value::BigInteger(BigInt::from(a) + BigInt::from(b)))),
            |a, b| Ok(Value::BigInteger(a + b)),
            |a, b| Value::Double(a + b),
            |a, b| Ok(Value::BigDecimal(a + b)),
        )
    });
    registry.add("-", |s| {
        arith(
            s,
            |a, b| a.checked_sub(b).map(Value::Long).ok_or(()).or_else(|_| Ok(Value::BigInteger(BigInt::from(a) - BigInt::from(b)))),
            |a, b| Ok(Value::BigInteger(a - b)),
            |a, b| Value::Double(a - b),
            |a, b| Ok(Value::BigDecimal(a - b)),
        )
    });
    registry.add("*", |s| {
        arith(
            s,
            |a, b| a.checked_mul(b).map(Value::Long).ok_or(()).or_else(|_| Ok(Value::BigInteger(BigInt::from(a) * BigInt::from(b)))),
            |a, b| Ok(Value::BigInteger(a * b)),
            |a, b| Value::Double(a * b),
            |a, b| Ok(Value::BigDecimal(a * b)),
        )
    });
    registry.add("/", |s| {
        arith(
            s,
            |a, b| if b == 0 { Err("divide by zero".to_string()) } else { Ok(Value::Long(a / b)) },
            |a, b| if b.is_zero() { Err("divide by zero".to_string()) } else { Ok(Value::BigInteger(a / b)) },
            |a, b| Value::Double(a / b),
            |a, b| if b.is_zero() { Err("divide by zero".to_string()) } else { Ok(Value::BigDecimal(a / b)) },
        )
    });
    registry.add("%", |s| {
        arith(
            s,
            |a, b| if b == 0 { Err("divide by zero".to_string()) } else { Ok(Value::Long(a % b)) },
            |a, b| if b.is_zero() { Err("divide by zero".to_string()) } else { Ok(Value::BigInteger(a % b)) },
            |a, b| Value::Double(a % b),
            |a, b| if b.is_zero() { Err("divide by zero".to_string()) } else { Ok(Value::BigDecimal(a % b)) },
        )
    });
    registry.add("mod", |s| {
        arith(
            s,
            |a, b| if b == 0 { Err("divide by zero".to_string()) } else { Ok(Value::Long(a.rem_euclid(b))) },
            |a, b| if b.is_zero() { Err("divide by zero".to_string()) } else { Ok(Value::BigInteger(bigint_rem_euclid(&a, &b))) },
            |a, b| Value::Double(a.rem_euclid(b)),
            |a, b| if b.is_zero() { Err("divide by zero".to_string()) } else { Ok(Value::BigDecimal(bigdec_rem_euclid(&a, &b))) },
        )
    });
    registry.add("div", |s| {
        arith(
            s,
            |a, b| if b == 0 { Err("divide by zero".to_string()) } else { Ok(Value::Long(a.div_euclid(b))) },
            |a, b| {
                if b.is_zero() {
                    Err("divide by zero".to_string())
                } else {
                    Ok(Value::BigInteger((&a - bigint_rem_euclid(&a, &b)) / &b))
                }
            },
            |a, b| Value::Double(a.div_euclid(b)),
            |a, b| {
                if b.is_zero() {
                    Err("divide by zero".to_string())
                } else {
                    Ok(Value::BigDecimal((a.clone() - bigdec_rem_euclid(&a, &b)) / b))
                }
            },
        )
    });

    registry.add("neg", |s| {
        let v = pop(s)?;
        s.push(match v {
            Value::Long(l) => l.checked_neg().map(Value::Long).unwrap_or_else(|| Value::BigInteger(-BigInt::from(l))),
            Value::Double(d) => Value::Double(-d),
            Value::BigInteger(b) => Value::BigInteger(-b),
            Value::BigDecimal(b) => Value::BigDecimal(-b),
            Value::Rational(r) => Value::Rational(-r),
            Value::BigRational(r) => Value::BigRational(-r),
            Value::Complex(c) => Value::Complex(Complex::cartesian(-c.re(), -c.im())),
            other => return Err(format!("expected a number, found {}", other.type_name())),
        });
        Ok(())
    });
    registry.add("abs", |s| {
        let v = pop(s)?;
        s.push(match v {
            Value::Long(l) => Value::Long(l.abs()),
            Value::Double(d) => Value::Double(d.abs()),
            Value::BigInteger(b) => Value::BigInteger(b.abs()),
            Value::BigDecimal(b) => Value::BigDecimal(b.abs()),
            Value::Rational(r) => Value::Rational(r.abs()),
            Value::BigRational(r) => Value::BigRational(r.abs()),
            Value::Complex(c) => Value::Double(c.r()),
            other => return Err(format!("expected a number, found {}", other.type_name())),
        });
        Ok(())
    });
    registry.add("sqrt", |s| {
        let v = pop(s)?;
        let d = to_double(&v).ok_or_else(|| format!("expected a number, found {}", v.type_name()))?;
        s.push(Value::Double(d.sqrt()));
        Ok(())
    });
    registry.add("pow", |s| {
        let exp = pop(s)?;
        let base = pop(s)?;
        if let (Value::Long(b), Value::Long(e)) = (&base, &exp) {
            if *e >= 0 {
                if let Some(v) = b.checked_pow(*e as u32) {
                    s.push(Value::Long(v));
                    return Ok(());
                }
            }
        }
        let b = to_double(&base).ok_or_else(|| format!("expected a number, found {}", base.type_name()))?;
        let e = to_double(&exp).ok_or_else(|| format!("expected a number, found {}", exp.type_name()))?;
        s.push(Value::Double(b.powf(e)));
        Ok(())
    });

    registry.add("min", |s| {
        let b = pop(s)?;
        let a = pop(s)?;
        let da = to_double(&a).ok_or_else(|| format!("expected a number, found {}", a.type_name()))?;
        let db = to_double(&b).ok_or_else(|| format!("expected a number, found {}", b.type_name()))?;
        s.push(if da <= db { a } else { b });
        Ok(())
    });
    registry.add("max", |s| {
        let b = pop(s)?;
        let a = pop(s)?;
        let da = to_double(&a).ok_or_else(|| format!("expected a number, found {}", a.type_name()))?;
        let db = to_double(&b).ok_or_else(|| format!("expected a number, found {}", b.type_name()))?;
        s.push(if da >= db { a } else { b });
        Ok(())
    });

    registry.add("<", |s| numeric_cmp(s, |a, b| a < b));
    registry.add(">", |s| numeric_cmp(s, |a, b| a > b));
    registry.add("<=", |s| numeric_cmp(s, |a, b| a <= b));
    registry.add(">=", |s| numeric_cmp(s, |a, b| a >= b));

    registry.add("==", |s| {
        let b = pop(s)?;
        let a = pop(s)?;
        s.push(Value::Boolean(a == b));
        Ok(())
    });
    registry.add("!=", |s| {
        let b = pop(s)?;
        let a = pop(s)?;
        s.push(Value::Boolean(a != b));
        Ok(())
    });

    registry.add("eq~", |s| {
        let b = pop(s)?;
        let a = pop(s)?;
        let da = to_double(&a).ok_or("expected a number")?;
        let db = to_double(&b).ok_or("expected a number")?;
        s.push(Value::Boolean((da - db).abs() <= DEFAULT_EPSILON));
        Ok(())
    });
    registry.add("eq~e", |s| {
        let eps = pop(s)?;
        let b = pop(s)?;
        let a = pop(s)?;
        let eps = to_double(&eps).ok_or("expected a number")?;
        let da = to_double(&a).ok_or("expected a number")?;
        let db = to_double(&b).ok_or("expected a number")?;
        s.push(Value::Boolean((da - db).abs() <= eps));
        Ok(())
    });
    registry.add("0~?", |s| {
        let v = pop(s)?;
        let d = to_double(&v).ok_or("expected a number")?;
        s.push(Value::Boolean(d.abs() <= DEFAULT_EPSILON));
        Ok(())
    });
}

fn numeric_cmp(stack: &mut Vec<Value>, cmp: fn(f64, f64) -> bool) -> Result<(), String> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    let da = to_double(&a).ok_or_else(|| format!("expected a number, found {}", a.type_name()))?;
    let db = to_double(&b).ok_or_else(|| format!("expected a number, found {}", b.type_name()))?;
    stack.push(Value::Boolean(cmp(da, db)));
    Ok(())
}
