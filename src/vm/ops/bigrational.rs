//! `BigRational` construction and arithmetic (§4.7), the arbitrary
//! precision counterpart to [`super::rational`].

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::value::tagged::Value;
use crate::vm::ops::pop;
use crate::vm::registry::Registry;

fn to_bigint(v: Value) -> Result<BigInt, String> {
    match v {
        Value::Long(l) => Ok(BigInt::from(l)),
        Value::BigInteger(b) => Ok(b),
        other => Err(format!("expected an integer, found {}", other.type_name())),
    }
}

fn pop_bigrational(stack: &mut Vec<Value>) -> Result<BigRational, String> {
    match pop(stack)? {
        Value::BigRational(r) => Ok(r),
        Value::Rational(r) => Ok(BigRational::new(BigInt::from(*r.numer()), BigInt::from(*r.denom()))),
        Value::Long(l) => Ok(BigRational::from_integer(BigInt::from(l))),
        Value::BigInteger(b) => Ok(BigRational::from_integer(b)),
        other => Err(format!("expected a bigrational, found {}", other.type_name())),
    }
}

pub fn register(registry: &mut Registry) {
    registry.add("bigrational", |s| {
        let denom = to_bigint(pop(s)?)?;
        let numer = to_bigint(pop(s)?)?;
        if denom == BigInt::from(0) {
            return Err("bigrational denominator cannot be zero".to_string());
        }
        s.push(Value::BigRational(BigRational::new(numer, denom)));
        Ok(())
    });
    registry.add("bigrational?", |s| {
        let is_bigrational = matches!(s.last(), Some(Value::BigRational(_)));
        s.push(Value::Boolean(is_bigrational));
        Ok(())
    });
    registry.add("bignumer", |s| {
        let r = pop_bigrational(s)?;
        s.push(Value::BigInteger(r.numer().clone()));
        Ok(())
    });
    registry.add("bigdenom", |s| {
        let r = pop_bigrational(s)?;
        s.push(Value::BigInteger(r.denom().clone()));
        Ok(())
    });
    registry.add("br+", |s| {
        let b = pop_bigrational(s)?;
        let a = pop_bigrational(s)?;
        s.push(Value::BigRational(a + b));
        Ok(())
    });
    registry.add("br-", |s| {
        let b = pop_bigrational(s)?;
        let a = pop_bigrational(s)?;
        s.push(Value::BigRational(a - b));
        Ok(())
    });
    registry.add("br*", |s| {
        let b = pop_bigrational(s)?;
        let a = pop_bigrational(s)?;
        s.push(Value::BigRational(a * b));
        Ok(())
    });
    registry.add("br/", |s| {
        let b = pop_bigrational(s)?;
        let a = pop_bigrational(s)?;
        if b.numer() == &BigInt::from(0) {
            return Err("divide by zero".to_string());
        }
        s.push(Value::BigRational(a / b));
        Ok(())
    });
}
