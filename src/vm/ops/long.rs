//! `Long` construction/conversion words (§4.7). Generic arithmetic on
//! `Long` values lives in [`super::numeric`]; this module only covers
//! operations that are specific to the integral representation.

use crate::value::tagged::Value;
use crate::vm::ops::{pop, pop_f64, pop_string};
use crate::vm::registry::Registry;

pub fn register(registry: &mut Registry) {
    registry.add("long", |s| {
        let v = pop(s)?;
        let l = match v {
            Value::Long(l) => l,
            Value::Double(d) => d as i64,
            Value::String(text) => text.trim().parse::<i64>().map_err(|e| e.to_string())?,
            Value::Boolean(b) => i64::from(b),
            other => return Err(format!("cannot convert {} to long", other.type_name())),
        };
        s.push(Value::Long(l));
        Ok(())
    });
    registry.add("long?", |s| {
        let is_long = matches!(s.last(), Some(Value::Long(_)));
        s.push(Value::Boolean(is_long));
        Ok(())
    });
    registry.add("long.parse", |s| {
        let text = pop_string(s)?;
        let l: i64 = text.trim().parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
        s.push(Value::Long(l));
        Ok(())
    });
    registry.add("long.to_double", |s| {
        let d = pop_f64(s)?;
        s.push(Value::Double(d));
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_to_long() {
        let registry = Registry::new();
        let mut stack = vec![Value::String("42".to_string())];
        (registry.get("long").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::Long(42)]);
    }

    #[test]
    fn truncates_double_to_long() {
        let registry = Registry::new();
        let mut stack = vec![Value::Double(4.9)];
        (registry.get("long").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::Long(4)]);
    }
}
