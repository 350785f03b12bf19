//! The RPN expression engine (§4.7): tokenize → expand macros/words →
//! compile to a flat bytecode → walk it against a registered set of named
//! operations. Each stage is its own module so the pipeline can be tested
//! (and reasoned about) independently.

pub mod compiler;
pub mod context;
pub mod engine;
pub mod instr;
pub mod macros;
pub mod ops;
pub mod registry;
pub mod token;

pub use context::{Context, InputSlot};
pub use engine::{Evaluator, Registers};
pub use instr::Instr;
pub use registry::Registry;

use crate::error::Result;

/// Runs the full front end — tokenize, expand, compile — on program
/// source text, producing a flat instruction sequence an `Evaluator` can
/// walk. Split out of `Evaluator` itself because a batch engine compiles
/// a point's program once and evaluates it many times (§4.6).
pub fn compile_program(source: &str) -> Result<Vec<Instr>> {
    let raw = token::tokenize_raw(source)?;
    let expanded = macros::expand(raw)?;
    compiler::compile(&expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_and_runs_a_macro_expanded_program() {
        let program = compile_program("double(x) { x x + } double(21)").unwrap();
        let evaluator = Evaluator::new();
        let context = Context::new("result");
        let mut registers = Registers::new();
        assert_eq!(evaluator.eval(&program, &context, &mut registers).unwrap(), crate::value::tagged::Value::Long(42));
    }
}
