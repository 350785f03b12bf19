//! The tagged dynamic value union (§4.4, §9 Design Notes): one `Value`
//! enum shared by `PointValue` and the RPN VM's operand stack, rather than
//! two parallel dynamic-union types joined by a conversion layer that
//! would only ever be the identity function.

use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_rational::{BigRational, Ratio};
use serde::{Deserialize, Serialize};

use crate::temporal::{ElapsedTime, Timestamp};

/// A complex value, kept in whichever representation it was constructed
/// in (cartesian or polar) until an operation forces a conversion (§4.7
/// Numeric Semantics) — converting eagerly on construction would lose the
/// distinction a polar-literal author intended to preserve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Complex {
    Cartesian { re: f64, im: f64 },
    Polar { r: f64, theta: f64 },
}

impl Complex {
    pub fn cartesian(re: f64, im: f64) -> Self {
        Complex::Cartesian { re, im }
    }

    pub fn polar(r: f64, theta: f64) -> Self {
        Complex::Polar { r, theta }
    }

    pub fn re(&self) -> f64 {
        match *self {
            Complex::Cartesian { re, .. } => re,
            Complex::Polar { r, theta } => r * theta.cos(),
        }
    }

    pub fn im(&self) -> f64 {
        match *self {
            Complex::Cartesian { im, .. } => im,
            Complex::Polar { r, theta } => r * theta.sin(),
        }
    }

    pub fn r(&self) -> f64 {
        match *self {
            Complex::Polar { r, .. } => r,
            Complex::Cartesian { re, im } => re.hypot(im),
        }
    }

    pub fn theta(&self) -> f64 {
        match *self {
            Complex::Polar { theta, .. } => theta,
            Complex::Cartesian { re, im } => im.atan2(re),
        }
    }

    pub fn to_cartesian(&self) -> Complex {
        Complex::Cartesian { re: self.re(), im: self.im() }
    }

    pub fn to_polar(&self) -> Complex {
        Complex::Polar { r: self.r(), theta: self.theta() }
    }

    pub fn to_num_complex(&self) -> num_complex::Complex64 {
        num_complex::Complex64::new(self.re(), self.im())
    }

    pub fn from_num_complex(c: num_complex::Complex64) -> Self {
        Complex::Cartesian { re: c.re, im: c.im }
    }
}

/// The value every `PointValue` and VM stack cell carries (§4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    BigInteger(BigInt),
    BigDecimal(BigDecimal),
    /// Auto-reduces on construction (`Ratio::new` divides by the gcd).
    Rational(Ratio<i64>),
    BigRational(BigRational),
    Complex(Complex),
    DateTime(Timestamp),
    ElapsedTime(ElapsedTime),
    String(String),
    Bytes(Vec<u8>),
    Tuple(Vec<Value>),
    /// Ordered map; insertion order is significant and preserved (§4.4).
    Dict(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::BigInteger(_) => "biginteger",
            Value::BigDecimal(_) => "bigdecimal",
            Value::Rational(_) => "rational",
            Value::BigRational(_) => "bigrational",
            Value::Complex(_) => "complex",
            Value::DateTime(_) => "datetime",
            Value::ElapsedTime(_) => "elapsed",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
        }
    }

    /// Numeric literal auto-tagging (§4.7 Tokens): integral values that fit
    /// in an `i64` tag as `Long`; everything else that parses as a number
    /// tags as `Double`.
    pub fn parse_numeric_literal(text: &str) -> Option<Value> {
        if let Ok(l) = text.parse::<i64>() {
            return Some(Value::Long(l));
        }
        text.parse::<f64>().ok().map(Value::Double)
    }

    pub fn dict_get<'a>(entries: &'a [(String, Value)], key: &str) -> Option<&'a Value> {
        entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Long(l) => write!(f, "{l}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::BigInteger(b) => write!(f, "{b}"),
            Value::BigDecimal(b) => write!(f, "{b}"),
            Value::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Value::BigRational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Value::Complex(c) => write!(f, "{}{:+}i", c.re(), c.im()),
            Value::DateTime(t) => write!(f, "{t}"),
            Value::ElapsedTime(e) => write!(f, "{}", e.format()),
            Value::String(s) => write!(f, "{s}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Value::Long(l)
    }
}
impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
impl From<ElapsedTime> for Value {
    fn from(e: ElapsedTime) -> Self {
        Value::ElapsedTime(e)
    }
}
impl From<Timestamp> for Value {
    fn from(t: Timestamp) -> Self {
        Value::DateTime(t)
    }
}
