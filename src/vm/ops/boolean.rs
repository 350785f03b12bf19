//! Boolean module (§4.7).

use crate::vm::ops::pop_bool;
use crate::vm::registry::Registry;
use crate::value::tagged::Value;

pub fn register(registry: &mut Registry) {
    registry.add("and", |s| {
        let b = pop_bool(s)?;
        let a = pop_bool(s)?;
        s.push(Value::Boolean(a && b));
        Ok(())
    });
    registry.add("or", |s| {
        let b = pop_bool(s)?;
        let a = pop_bool(s)?;
        s.push(Value::Boolean(a || b));
        Ok(())
    });
    registry.add("xor", |s| {
        let b = pop_bool(s)?;
        let a = pop_bool(s)?;
        s.push(Value::Boolean(a ^ b));
        Ok(())
    });
    registry.add("not", |s| {
        let a = pop_bool(s)?;
        s.push(Value::Boolean(!a));
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_is_truth_functional() {
        let registry = Registry::new();
        let mut stack = vec![Value::Boolean(true), Value::Boolean(false)];
        (registry.get("and").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::Boolean(false)]);
    }

    #[test]
    fn not_negates() {
        let registry = Registry::new();
        let mut stack = vec![Value::Boolean(true)];
        (registry.get("not").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::Boolean(false)]);
    }
}
