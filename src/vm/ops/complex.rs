//! `Complex` construction and arithmetic (§4.7). Multiplication/division
//! delegate to `num_complex::Complex64` so the (re, im) vs. (r, theta)
//! representation-preservation rule in `Value::Complex` only has to be
//! handled at the construction/destructuring boundary, not re-derived
//! here.

use crate::value::tagged::{Complex, Value};
use crate::vm::ops::{pop, pop_f64};
use crate::vm::registry::Registry;

fn pop_complex(stack: &mut Vec<Value>) -> Result<Complex, String> {
    match pop(stack)? {
        Value::Complex(c) => Ok(c),
        Value::Long(l) => Ok(Complex::cartesian(l as f64, 0.0)),
        Value::Double(d) => Ok(Complex::cartesian(d, 0.0)),
        other => Err(format!("expected a complex, found {}", other.type_name())),
    }
}

pub fn register(registry: &mut Registry) {
    registry.add("cplx", |s| {
        let im = pop_f64(s)?;
        let re = pop_f64(s)?;
        s.push(Value::Complex(Complex::cartesian(re, im)));
        Ok(())
    });
    registry.add("polar", |s| {
        let theta = pop_f64(s)?;
        let r = pop_f64(s)?;
        s.push(Value::Complex(Complex::polar(r, theta)));
        Ok(())
    });
    registry.add("complex?", |s| {
        let is_complex = matches!(s.last(), Some(Value::Complex(_)));
        s.push(Value::Boolean(is_complex));
        Ok(())
    });
    registry.add("re", |s| {
        let c = pop_complex(s)?;
        s.push(Value::Double(c.re()));
        Ok(())
    });
    registry.add("im", |s| {
        let c = pop_complex(s)?;
        s.push(Value::Double(c.im()));
        Ok(())
    });
    registry.add("modulus", |s| {
        let c = pop_complex(s)?;
        s.push(Value::Double(c.r()));
        Ok(())
    });
    registry.add("theta", |s| {
        let c = pop_complex(s)?;
        s.push(Value::Double(c.theta()));
        Ok(())
    });
    registry.add("c+", |s| {
        let b = pop_complex(s)?;
        let a = pop_complex(s)?;
        s.push(Value::Complex(Complex::from_num_complex(a.to_num_complex() + b.to_num_complex())));
        Ok(())
    });
    registry.add("c-", |s| {
        let b = pop_complex(s)?;
        let a = pop_complex(s)?;
        s.push(Value::Complex(Complex::from_num_complex(a.to_num_complex() - b.to_num_complex())));
        Ok(())
    });
    registry.add("c*", |s| {
        let b = pop_complex(s)?;
        let a = pop_complex(s)?;
        s.push(Value::Complex(Complex::from_num_complex(a.to_num_complex() * b.to_num_complex())));
        Ok(())
    });
    registry.add("c/", |s| {
        let b = pop_complex(s)?;
        let a = pop_complex(s)?;
        if b.re() == 0.0 && b.im() == 0.0 {
            return Err("divide by zero".to_string());
        }
        s.push(Value::Complex(Complex::from_num_complex(a.to_num_complex() / b.to_num_complex())));
        Ok(())
    });
    registry.add("conj", |s| {
        let c = pop_complex(s)?;
        s.push(Value::Complex(Complex::cartesian(c.re(), -c.im())));
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polar_round_trips_through_modulus_and_theta() {
        let registry = Registry::new();
        let mut stack = vec![Value::Double(2.0), Value::Double(std::f64::consts::FRAC_PI_2)];
        (registry.get("polar").unwrap())(&mut stack).unwrap();
        let mut re_stack = stack.clone();
        (registry.get("re").unwrap())(&mut re_stack).unwrap();
        match re_stack[0] {
            Value::Double(re) => assert!(re.abs() < 1e-9),
            _ => panic!("expected double"),
        }
    }

    #[test]
    fn addition_is_componentwise() {
        let registry = Registry::new();
        let mut stack = vec![Value::Complex(Complex::cartesian(1.0, 2.0)), Value::Complex(Complex::cartesian(3.0, 4.0))];
        (registry.get("c+").unwrap())(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::Complex(Complex::cartesian(4.0, 6.0))]);
    }
}
