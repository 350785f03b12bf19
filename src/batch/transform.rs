//! Transform (§1 Glossary, §4.6 step 5c): "the per-point computation that
//! maps inputs to a result." Typically delegates to the RPN VM (§4.7), but
//! kept as a trait object rather than baking the VM into `Point` directly
//! — a loader may bind a summarizer (§4.7 "Summarizer mode") or a future
//! built-in to the same per-point slot (§9 Design Notes "Deep class
//! hierarchies": plug-in behavior behind an opaque handle).

use std::fmt;

use crate::error::Result;
use crate::vm::{compile_program, Context, Evaluator, Instr, Registers};
use crate::value::tagged::Value;

pub trait Transform: fmt::Debug + Send + Sync {
    /// Computes this point's value for one `(point, stamp)`. `registers`
    /// carries `$name` program-register state across calls that share one
    /// `Transform` instance within a single evaluation (ordinary RPN
    /// transforms get a fresh `Registers` per call from the batch engine;
    /// `SummarizerTransform::summarize` below threads its own across its
    /// initial/step/final sequence).
    fn apply_to(&self, evaluator: &Evaluator, context: &Context, registers: &mut Registers) -> Result<Option<Value>>;
}

/// The common case: one compiled RPN program run once per `(point, stamp)`
/// (§8 scenario 4, scenario 5).
#[derive(Debug, Clone)]
pub struct RpnTransform {
    program: Vec<Instr>,
}

impl RpnTransform {
    pub fn compile(source: &str) -> Result<Self> {
        Ok(Self { program: compile_program(source)? })
    }
}

impl Transform for RpnTransform {
    fn apply_to(&self, evaluator: &Evaluator, context: &Context, registers: &mut Registers) -> Result<Option<Value>> {
        let value = evaluator.eval(&self.program, context, registers)?;
        Ok(if value.is_null() { None } else { Some(value) })
    }
}

/// Summarizer mode (§4.7 "Summarizer mode", §11 Supplemented Features):
/// three named programs — `initial` once at batch start, `step` once per
/// input sample in the window, `final` once to produce the emitted value
/// — with state threaded through shared `Registers` (§8 scenario 6, the
/// RSD summarizer).
///
/// The distilled spec's worked `step` program references the current
/// window sample with a bare `$` (no index); this tokenizer only defines
/// indexed `$n`/`$0` input variables (§4.7 Variables), so `summarize`
/// realizes each sample as the sole `$1` input of its own one-input
/// `Context` (see DESIGN.md for this resolution).
#[derive(Debug, Clone)]
pub struct SummarizerTransform {
    initial: Vec<Instr>,
    step: Vec<Instr>,
    finalize: Vec<Instr>,
}

impl SummarizerTransform {
    pub fn compile(initial: &str, step: &str, finalize: &str) -> Result<Self> {
        Ok(Self {
            initial: compile_program(initial)?,
            step: compile_program(step)?,
            finalize: compile_program(finalize)?,
        })
    }

    /// Runs `initial` against `final_context` (the window's result-point
    /// identity and params, with no inputs), then `step` once per entry of
    /// `window` (each entry supplies `$1` of its own `Context`), then
    /// `final` against `final_context` again, returning its result.
    pub fn summarize(
        &self,
        evaluator: &Evaluator,
        window: &[Context],
        final_context: &Context,
        registers: &mut Registers,
    ) -> Result<Option<Value>> {
        evaluator.eval(&self.initial, final_context, registers)?;
        for step_context in window {
            evaluator.eval(&self.step, step_context, registers)?;
        }
        let value = evaluator.eval(&self.finalize, final_context, registers)?;
        Ok(if value.is_null() { None } else { Some(value) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::InputSlot;
    use crate::temporal::Timestamp;

    #[test]
    fn rpn_transform_multiplies_its_input() {
        let transform = RpnTransform::compile("$1 2 *").unwrap();
        let context = Context::new("B").with_input(InputSlot::new("A", Timestamp::from_raw(0), Some(Value::Long(5))));
        let evaluator = Evaluator::new();
        let mut registers = Registers::new();
        let result = transform.apply_to(&evaluator, &context, &mut registers).unwrap();
        assert_eq!(result, Some(Value::Long(10)));
    }

    #[test]
    fn rpn_transform_returning_null_yields_none() {
        let transform = RpnTransform::compile("null").unwrap();
        let context = Context::new("B");
        let evaluator = Evaluator::new();
        let mut registers = Registers::new();
        assert_eq!(transform.apply_to(&evaluator, &context, &mut registers).unwrap(), None);
    }

    #[test]
    fn summarizer_averages_a_window() {
        // initial: running sum 0, count 0. step: add $1 to #sum, bump #count.
        // final: #sum / #count.
        let transform = SummarizerTransform::compile(
            "0.0 :sum= 0 :count=",
            "$sum $1 + :sum= $count 1 + :count=",
            "$sum $count /",
        )
        .unwrap();
        let evaluator = Evaluator::new();
        let mut registers = Registers::new();
        let window: Vec<Context> = [1.0, 2.0, 3.0]
            .iter()
            .map(|v| Context::new("W").with_input(InputSlot::new("in", Timestamp::from_raw(0), Some(Value::Double(*v)))))
            .collect();
        let final_context = Context::new("W");
        let result = transform.summarize(&evaluator, &window, &final_context, &mut registers).unwrap();
        assert_eq!(result, Some(Value::Double(2.0)));
    }
}
