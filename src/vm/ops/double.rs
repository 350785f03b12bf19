//! `Double` construction/conversion words and the transcendental functions
//! that only make sense in floating point (§4.7).

use crate::value::tagged::Value;
use crate::vm::ops::{pop, pop_f64, pop_string};
use crate::vm::registry::Registry;

pub fn register(registry: &mut Registry) {
    registry.add("double", |s| {
        let v = pop(s)?;
        let d = match v {
            Value::Long(l) => l as f64,
            Value::Double(d) => d,
            Value::String(text) => text.trim().parse::<f64>().map_err(|e| e.to_string())?,
            other => return Err(format!("cannot convert {} to double", other.type_name())),
        };
        s.push(Value::Double(d));
        Ok(())
    });
    registry.add("double?", |s| {
        let is_double = matches!(s.last(), Some(Value::Double(_)));
        s.push(Value::Boolean(is_double));
        Ok(())
    });
    registry.add("floor", |s| {
        let d = pop_f64(s)?;
        s.push(Value::Double(d.floor()));
        Ok(())
    });
    registry.add("ceil", |s| {
        let d = pop_f64(s)?;
        s.push(Value::Double(d.ceil()));
        Ok(())
    });
    registry.add("round", |s| {
        let d = pop_f64(s)?;
        s.push(Value::Double(d.round()));
        Ok(())
    });
    registry.add("ln", |s| {
        let d = pop_f64(s)?;
        s.push(Value::Double(d.ln()));
        Ok(())
    });
    registry.add("log10", |s| {
        let d = pop_f64(s)?;
        s.push(Value::Double(d.log10()));
        Ok(())
    });
    registry.add("exp", |s| {
        let d = pop_f64(s)?;
        s.push(Value::Double(d.exp()));
        Ok(())
    });
    registry.add("sin", |s| {
        let d = pop_f64(s)?;
        s.push(Value::Double(d.sin()));
        Ok(())
    });
    registry.add("cos", |s| {
        let d = pop_f64(s)?;
        s.push(Value::Double(d.cos()));
        Ok(())
    });
    registry.add("tan", |s| {
        let d = pop_f64(s)?;
        s.push(Value::Double(d.tan()));
        Ok(())
    });
    registry.add("nan?", |s| {
        let is_nan = matches!(s.last(), Some(Value::Double(d)) if d.is_nan());
        s.push(Value::Boolean(is_nan));
        Ok(())
    });
    registry.add("double.parse", |s| {
        let text = pop_string(s)?;
        let d: f64 = text.trim().parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
        s.push(Value::Double(d));
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_rounds_toward_negative_infinity() {
        let registry = Registry::new();
        let mut stack = vec![Value::Double(-1.2)];
        (registry.get("floor").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::Double(-2.0)]);
    }

    #[test]
    fn nan_predicate_detects_nan() {
        let registry = Registry::new();
        let mut stack = vec![Value::Double(f64::NAN)];
        (registry.get("nan?").unwrap())(&mut stack).unwrap();
        assert_eq!(stack.last(), Some(&Value::Boolean(true)));
    }
}
