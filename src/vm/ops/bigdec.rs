//! `BigDecimal` construction/conversion/scale words (§4.7). Arithmetic
//! promoted with `Long`/`Double`/`BigInteger` lives in [`super::numeric`].

use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::value::tagged::Value;
use crate::vm::ops::{pop, pop_i64, pop_string};
use crate::vm::registry::Registry;

pub fn register(registry: &mut Registry) {
    registry.add("bigdec", |s| {
        let v = pop(s)?;
        let b = match v {
            Value::Long(l) => BigDecimal::from(l),
            Value::Double(d) => BigDecimal::from_str(&d.to_string()).map_err(|e| e.to_string())?,
            Value::BigDecimal(b) => b,
            Value::String(text) => BigDecimal::from_str(text.trim()).map_err(|e| e.to_string())?,
            other => return Err(format!("cannot convert {} to bigdecimal", other.type_name())),
        };
        s.push(Value::BigDecimal(b));
        Ok(())
    });
    registry.add("bigdec?", |s| {
        let is_bigdec = matches!(s.last(), Some(Value::BigDecimal(_)));
        s.push(Value::Boolean(is_bigdec));
        Ok(())
    });
    registry.add("bigdec.parse", |s| {
        let text = pop_string(s)?;
        let b = BigDecimal::from_str(text.trim()).map_err(|e| e.to_string())?;
        s.push(Value::BigDecimal(b));
        Ok(())
    });
    registry.add("scale", |s| {
        let scale = pop_i64(s)?;
        let value = pop(s)?;
        let b = match value {
            Value::BigDecimal(b) => b,
            other => return Err(format!("expected a bigdecimal, found {}", other.type_name())),
        };
        s.push(Value::BigDecimal(b.with_scale(scale)));
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_rounds_to_requested_precision() {
        let registry = Registry::new();
        let mut stack = vec![Value::BigDecimal(BigDecimal::from_str("1.23456").unwrap()), Value::Long(2)];
        (registry.get("scale").unwrap())(&mut stack).unwrap();
        match &stack[0] {
            Value::BigDecimal(b) => assert_eq!(b.to_string(), "1.23"),
            other => panic!("expected bigdecimal, got {other:?}"),
        }
    }
}
