//! `Rational` (`i64`-backed) construction and arithmetic (§4.7). Kept
//! separate from the generic `+ - * /` tower in [`super::numeric`]: mixing
//! a fixed-width rational into that promotion ladder would either collapse
//! exactness into `Double` or force every `BigDecimal` vs. `BigInteger`
//! comparison to reason about reducing fractions, so rational arithmetic
//! gets its own `r+ r- r* r/` words instead (recorded in DESIGN.md).

use num_rational::Ratio;

use crate::value::tagged::Value;
use crate::vm::ops::{pop, pop_i64};
use crate::vm::registry::Registry;

fn pop_rational(stack: &mut Vec<Value>) -> Result<Ratio<i64>, String> {
    match pop(stack)? {
        Value::Rational(r) => Ok(r),
        Value::Long(l) => Ok(Ratio::from_integer(l)),
        other => Err(format!("expected a rational, found {}", other.type_name())),
    }
}

pub fn register(registry: &mut Registry) {
    registry.add("rational", |s| {
        let denom = pop_i64(s)?;
        let numer = pop_i64(s)?;
        if denom == 0 {
            return Err("rational denominator cannot be zero".to_string());
        }
        s.push(Value::Rational(Ratio::new(numer, denom)));
        Ok(())
    });
    registry.add("rational?", |s| {
        let is_rational = matches!(s.last(), Some(Value::Rational(_)));
        s.push(Value::Boolean(is_rational));
        Ok(())
    });
    registry.add("numer", |s| {
        let r = pop_rational(s)?;
        s.push(Value::Long(*r.numer()));
        Ok(())
    });
    registry.add("denom", |s| {
        let r = pop_rational(s)?;
        s.push(Value::Long(*r.denom()));
        Ok(())
    });
    registry.add("r+", |s| {
        let b = pop_rational(s)?;
        let a = pop_rational(s)?;
        s.push(Value::Rational(a + b));
        Ok(())
    });
    registry.add("r-", |s| {
        let b = pop_rational(s)?;
        let a = pop_rational(s)?;
        s.push(Value::Rational(a - b));
        Ok(())
    });
    registry.add("r*", |s| {
        let b = pop_rational(s)?;
        let a = pop_rational(s)?;
        s.push(Value::Rational(a * b));
        Ok(())
    });
    registry.add("r/", |s| {
        let b = pop_rational(s)?;
        let a = pop_rational(s)?;
        if *b.numer() == 0 {
            return Err("divide by zero".to_string());
        }
        s.push(Value::Rational(a / b));
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_auto_reduces() {
        let registry = Registry::new();
        let mut stack = vec![Value::Long(4), Value::Long(8)];
        (registry.get("rational").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::Rational(Ratio::new(1, 2))]);
    }

    #[test]
    fn addition_reduces_result() {
        let registry = Registry::new();
        let mut stack = vec![Value::Rational(Ratio::new(1, 2)), Value::Rational(Ratio::new(1, 2))];
        (registry.get("r+").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::Rational(Ratio::from_integer(1))]);
    }
}
