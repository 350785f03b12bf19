//! Per-invocation computation context (§4.7 Variables): the inputs,
//! point name, and positional params a running program can read through
//! `$n`/`$n.`/`$n@`/`$n!`, `$0`, and `@n`. Built fresh by the batch engine
//! for each `(point, stamp)` it evaluates; never mutated by the VM.

use crate::graph::params::ParamValue;
use crate::temporal::Timestamp;
use crate::value::tagged::Value;

/// One input slot: the value a relation supplied, the timestamp it was
/// sampled at, and the name of the point it came from.
#[derive(Debug, Clone)]
pub struct InputSlot {
    pub point_name: String,
    pub stamp: Timestamp,
    pub value: Option<Value>,
}

impl InputSlot {
    pub fn new(point_name: impl Into<String>, stamp: Timestamp, value: Option<Value>) -> Self {
        Self { point_name: point_name.into(), stamp, value }
    }
}

/// Everything a program needs beyond its own stack/registers: the result
/// point's name (`$0`), its ordered inputs (`$1..$n`), and its positional
/// `Params` values (`@1..@n`).
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub result_point_name: String,
    pub inputs: Vec<InputSlot>,
    pub params: Vec<ParamValue>,
}

impl Context {
    pub fn new(result_point_name: impl Into<String>) -> Self {
        Self { result_point_name: result_point_name.into(), inputs: Vec::new(), params: Vec::new() }
    }

    pub fn with_input(mut self, slot: InputSlot) -> Self {
        self.inputs.push(slot);
        self
    }

    pub fn with_param(mut self, value: ParamValue) -> Self {
        self.params.push(value);
        self
    }

    /// 1-based; `$0` is handled by the caller, not through this accessor.
    pub fn input(&self, n: usize) -> Option<&InputSlot> {
        if n == 0 {
            return None;
        }
        self.inputs.get(n - 1)
    }

    /// 1-based positional `@n` lookup.
    pub fn param(&self, n: usize) -> Option<&ParamValue> {
        if n == 0 {
            return None;
        }
        self.params.get(n - 1)
    }
}

pub fn param_value_to_value(p: &ParamValue) -> Value {
    match p {
        ParamValue::String(s) => Value::String(s.clone()),
        ParamValue::Number(n) => Value::Double(*n),
        ParamValue::Boolean(b) => Value::Boolean(*b),
        ParamValue::Elapsed(e) => Value::ElapsedTime(*e),
        ParamValue::Reference(u) => Value::String(u.to_string()),
    }
}
