//! `BigInteger` construction/conversion words (§4.7). Arithmetic shared
//! with `Long` and the other integral/decimal types lives in
//! [`super::numeric`].

use std::str::FromStr;

use num_bigint::BigInt;

use crate::value::tagged::Value;
use crate::vm::ops::{pop, pop_string};
use crate::vm::registry::Registry;

pub fn register(registry: &mut Registry) {
    registry.add("bigint", |s| {
        let v = pop(s)?;
        let b = match v {
            Value::Long(l) => BigInt::from(l),
            Value::BigInteger(b) => b,
            Value::String(text) => BigInt::from_str(text.trim()).map_err(|e| e.to_string())?,
            other => return Err(format!("cannot convert {} to biginteger", other.type_name())),
        };
        s.push(Value::BigInteger(b));
        Ok(())
    });
    registry.add("bigint?", |s| {
        let is_bigint = matches!(s.last(), Some(Value::BigInteger(_)));
        s.push(Value::Boolean(is_bigint));
        Ok(())
    });
    registry.add("bigint.parse", |s| {
        let text = pop_string(s)?;
        let b = BigInt::from_str(text.trim()).map_err(|e| e.to_string())?;
        s.push(Value::BigInteger(b));
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_string() {
        let registry = Registry::new();
        let mut stack = vec![Value::String("123456789012345678901234567890".to_string())];
        (registry.get("bigint").unwrap())(&mut stack).unwrap();
        assert!(matches!(stack[0], Value::BigInteger(_)));
    }
}
