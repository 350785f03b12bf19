//! Property tests for the RPN VM (§8): the try/catch stack-restoration
//! invariant and numeric promotion across the VM's arithmetic operators.

use proptest::prelude::*;

use rvpf_core::value::tagged::Value;
use rvpf_core::vm::{compile_program, Context, Evaluator, Registers};

fn eval(source: &str) -> Value {
    let program = compile_program(source).unwrap();
    let evaluator = Evaluator::new();
    let context = Context::new("result");
    let mut registers = Registers::new();
    evaluator.eval(&program, &context, &mut registers).unwrap()
}

proptest! {
    #[test]
    fn try_catch_restores_the_stack_to_its_pre_try_depth(padding in 0i64..20i64, divisor in -5i64..5i64) {
        // push `padding` junk values, then try a division that may fail;
        // on failure the catch body must see exactly the pre-try depth.
        let source = format!("{padding} try {{ 1 {divisor} / drop }} {{ drop 99 }} depth");
        let result = eval(&format!("[ {source} ]"));
        // whether the body succeeds or the catch fires on divide-by-zero,
        // exactly one value is left under the mark afterward.
        prop_assert_eq!(result, Value::Long(1));
    }

    #[test]
    fn long_plus_long_stays_long_within_i64_range(a in any::<i32>(), b in any::<i32>()) {
        let source = format!("{a} {b} +");
        let result = eval(&source);
        prop_assert_eq!(result, Value::Long(a as i64 + b as i64));
    }

    #[test]
    fn long_plus_double_promotes_to_double(a in any::<i32>(), b in -1.0e6f64..1.0e6f64) {
        let source = format!("{a} {b:?} +");
        let result = eval(&source);
        match result {
            Value::Double(d) => prop_assert!((d - (a as f64 + b)).abs() < 1e-6),
            other => prop_assert!(false, "expected a double, got {other:?}"),
        }
    }

    #[test]
    fn addition_is_commutative_for_longs(a in any::<i32>(), b in any::<i32>()) {
        let forward = eval(&format!("{a} {b} +"));
        let backward = eval(&format!("{b} {a} +"));
        prop_assert_eq!(forward, backward);
    }
}
