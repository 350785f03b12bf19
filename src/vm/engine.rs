//! The flat instruction walk (§4.7): no recursion, no re-tokenizing — a
//! program pointer over `Instr`, an operand stack, a mark stack for
//! `[ ]`/`depth`/`reduce`/`clear`, and a try/catch stack that restores the
//! operand stack, mark stack, and compound (block) scope stack to their
//! pre-`try` lengths on failure (§4.7 "try/catch: a failure inside the
//! body restores the stack to its state at `try` and jumps to `catch`") —
//! a block that opened inside a failed try body doesn't leak its scope
//! (or an open mark) past the catch.

use std::collections::HashMap;

use tracing::trace;

use crate::error::{Error, Result};
use crate::value::tagged::Value;
use crate::vm::context::{param_value_to_value, Context};
use crate::vm::instr::Instr;
use crate::vm::registry::Registry;

/// Registers that outlive a single `eval` call: the program-wide `$name`
/// map. A summarizer transform's initial/step/final programs (§4.6) share
/// one `Registers` across all three so a running total can survive from
/// one point update to the next.
#[derive(Debug, Clone, Default)]
pub struct Registers {
    program: HashMap<String, Value>,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.program.get(name)
    }
}

struct TryFrame {
    catch_ip: usize,
    stack_len: usize,
    marks_len: usize,
    compound_len: usize,
}

/// Walks a compiled program against a `Registry` of named operations.
/// Stateless itself — all mutable state (operand stack, registers, block
/// scopes) lives on the stack of `eval`, so one `Evaluator` is reused for
/// every point in a batch (§4.6) rather than rebuilt per evaluation.
pub struct Evaluator {
    registry: Registry,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self { registry: Registry::new() }
    }

    /// Runs `program` to completion, returning the value left on top of
    /// the operand stack. `registers` carries `$name` program registers
    /// across calls for callers that need that (the summarizer transform);
    /// callers that don't can pass a fresh `Registers::new()` each time.
    pub fn eval(&self, program: &[Instr], context: &Context, registers: &mut Registers) -> Result<Value> {
        let mut stack: Vec<Value> = Vec::new();
        let mut marks: Vec<usize> = Vec::new();
        let mut compound: Vec<HashMap<String, Value>> = Vec::new();
        let mut try_stack: Vec<TryFrame> = Vec::new();
        let mut pc = 0usize;

        while pc < program.len() {
            let outcome = self.step(&program[pc], pc, context, registers, &mut stack, &mut marks, &mut compound, &mut try_stack);
            match outcome {
                Ok(Some(next_pc)) => pc = next_pc,
                Ok(None) => pc += 1,
                Err(reason) => match try_stack.pop() {
                    Some(frame) => {
                        trace!(position = pc, reason, "evaluation failure caught by try/catch");
                        stack.truncate(frame.stack_len);
                        marks.truncate(frame.marks_len);
                        compound.truncate(frame.compound_len);
                        pc = frame.catch_ip;
                    }
                    None => return Err(Error::EvalFailure { code: reason, position: pc }),
                },
            }
        }

        stack.pop().ok_or_else(|| Error::EvalFailure { code: "program left no result value on the stack".to_string(), position: program.len() })
    }

    #[allow(clippy::too_many_arguments)]
    fn step(
        &self,
        instr: &Instr,
        pc: usize,
        context: &Context,
        registers: &mut Registers,
        stack: &mut Vec<Value>,
        marks: &mut Vec<usize>,
        compound: &mut Vec<HashMap<String, Value>>,
        try_stack: &mut Vec<TryFrame>,
    ) -> std::result::Result<Option<usize>, String> {
        match instr {
            Instr::PushConst(v) => stack.push(v.clone()),
            Instr::PushInput(n) => stack.push(context.input(*n).and_then(|s| s.value.clone()).unwrap_or(Value::Null)),
            Instr::PushInputRequired(n) => {
                let value = context
                    .input(*n)
                    .and_then(|s| s.value.clone())
                    .ok_or_else(|| format!("required input ${n} is absent"))?;
                stack.push(value);
            }
            Instr::PushInputName(n) => stack.push(Value::String(context.input(*n).map(|s| s.point_name.clone()).unwrap_or_default())),
            Instr::PushInputStamp(n) => stack.push(context.input(*n).map(|s| Value::DateTime(s.stamp)).unwrap_or(Value::Null)),
            Instr::PushSelfName => stack.push(Value::String(context.result_point_name.clone())),
            Instr::PushParam(n) => stack.push(context.param(*n).map(param_value_to_value).unwrap_or(Value::Null)),
            Instr::LoadProgramRegister(name) => stack.push(registers.program.get(name).cloned().unwrap_or(Value::Null)),
            Instr::StoreProgramRegister(name) => {
                let value = stack.pop().ok_or("stack underflow")?;
                registers.program.insert(name.clone(), value);
            }
            Instr::LoadCompoundRegister(name) => {
                let value = compound.iter().rev().find_map(|scope| scope.get(name)).cloned().unwrap_or(Value::Null);
                stack.push(value);
            }
            Instr::StoreCompoundRegister(name) => {
                let value = stack.pop().ok_or("stack underflow")?;
                let scope = compound.last_mut().ok_or("compound register used outside a block")?;
                scope.insert(name.clone(), value);
            }
            Instr::EnterScope => compound.push(HashMap::new()),
            Instr::ExitScope => {
                compound.pop().ok_or("unbalanced block scope")?;
            }
            Instr::Call(name) => {
                let op = self.registry.get(name).ok_or_else(|| format!("unknown operation {name:?}"))?;
                op(stack)?;
            }
            Instr::Jump(target) => return Ok(Some(*target)),
            Instr::JumpIfFalse(target) => {
                let b = pop_bool(stack)?;
                if !b {
                    return Ok(Some(*target));
                }
            }
            Instr::JumpIfTrue(target) => {
                let b = pop_bool(stack)?;
                if b {
                    return Ok(Some(*target));
                }
            }
            Instr::MarkPush => marks.push(stack.len()),
            Instr::MarkPop => {
                marks.pop().ok_or("']' without a matching '['")?;
            }
            Instr::Depth => {
                let mark = *marks.last().ok_or("'depth' outside a marked sub-evaluation")?;
                stack.push(Value::Long((stack.len() - mark) as i64));
            }
            Instr::Reduce(op_name) => {
                let mark = *marks.last().ok_or("'reduce' outside a marked sub-evaluation")?;
                let op = self.registry.get(op_name).ok_or_else(|| format!("unknown operation {op_name:?}"))?;
                let values = stack.split_off(mark);
                let mut values = values.into_iter();
                let first = values.next().ok_or("'reduce' on an empty marked sub-evaluation")?;
                let mut acc = vec![first];
                for v in values {
                    acc.push(v);
                    op(&mut acc)?;
                }
                stack.append(&mut acc);
            }
            Instr::Clear => {
                let mark = *marks.last().ok_or("'clear' outside a marked sub-evaluation")?;
                stack.truncate(mark);
            }
            Instr::TryEnter(catch_ip) => try_stack.push(TryFrame {
                catch_ip: *catch_ip,
                stack_len: stack.len(),
                marks_len: marks.len(),
                compound_len: compound.len(),
            }),
            Instr::TryExit => {
                try_stack.pop().ok_or("'try' exit without a matching entry")?;
            }
            Instr::Assert => {
                let b = pop_bool(stack)?;
                if !b {
                    return Err("assertion failed".to_string());
                }
            }
            Instr::Fail => return Err("'fail'".to_string()),
        }
        let _ = pc;
        Ok(None)
    }
}

fn pop_bool(stack: &mut Vec<Value>) -> std::result::Result<bool, String> {
    match stack.pop().ok_or("stack underflow")? {
        Value::Boolean(b) => Ok(b),
        other => Err(format!("expected boolean, found {}", other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{compile_program, InputSlot};

    fn run(source: &str, context: &Context) -> Value {
        let program = compile_program(source).unwrap();
        let evaluator = Evaluator::new();
        let mut registers = Registers::new();
        evaluator.eval(&program, context, &mut registers).unwrap()
    }

    #[test]
    fn scenario_rpn_addition() {
        let context = Context::new("result")
            .with_input(InputSlot::new("a", crate::temporal::Timestamp::from_raw(0), Some(Value::Long(3))))
            .with_input(InputSlot::new("b", crate::temporal::Timestamp::from_raw(0), Some(Value::Long(4))));
        assert_eq!(run("$1 $2 +", &context), Value::Long(7));
    }

    #[test]
    fn if_else_takes_the_true_branch() {
        let context = Context::new("result");
        assert_eq!(run("true if { 1 } else { 2 }", &context), Value::Long(1));
        assert_eq!(run("false if { 1 } else { 2 }", &context), Value::Long(2));
    }

    #[test]
    fn while_loop_accumulates_into_a_program_register() {
        let context = Context::new("result");
        let source = "0 :acc= 0 :i= { $i 5 < } while { $acc $i + :acc= $i 1 + :i= } $acc";
        assert_eq!(run(source, &context), Value::Long(10));
    }

    #[test]
    fn try_catch_restores_stack_on_failure() {
        let context = Context::new("result");
        assert_eq!(run("1 2 try { 1 0 / drop } { drop drop 99 }", &context), Value::Long(99));
    }

    #[test]
    fn try_catch_unwinds_a_block_scope_opened_inside_the_failed_body() {
        let context = Context::new("result");
        // `#x=` stores into the try body's own block scope; once `fail`
        // aborts it, a later unrelated block must not still see `#x`.
        let source = "try { 5 #x= fail } { } { #x } :acc= $acc";
        assert_eq!(run(source, &context), Value::Null);
    }

    #[test]
    fn marked_sub_evaluation_reduces_with_an_operation() {
        let context = Context::new("result");
        assert_eq!(run("[ 1 2 3 4 reduce + ]", &context), Value::Long(10));
    }

    #[test]
    fn depth_counts_values_pushed_since_the_mark() {
        let context = Context::new("result");
        assert_eq!(run("[ 1 2 3 depth ]", &context), Value::Long(3));
    }

    #[test]
    fn compound_register_is_scoped_to_its_block() {
        let context = Context::new("result");
        // a second, unrelated block cannot see the first block's #x.
        let source = "{ 5 #x= } { #x }";
        assert_eq!(run(source, &context), Value::Null);
    }

    #[test]
    fn unknown_operation_is_an_eval_failure() {
        let context = Context::new("result");
        let program = compile_program("nonexistent-op").unwrap();
        let evaluator = Evaluator::new();
        let mut registers = Registers::new();
        assert!(evaluator.eval(&program, &context, &mut registers).is_err());
    }
}
