//! End-to-end check of the summarizer transform (§4.7 "Summarizer mode",
//! §8 scenario 6): a relative-standard-deviation computation over a
//! hundred-sample window, run twice against the same stream.

use rvpf_core::batch::transform::SummarizerTransform;
use rvpf_core::temporal::Timestamp;
use rvpf_core::value::tagged::Value;
use rvpf_core::vm::{Context, Evaluator, InputSlot, Registers};

/// A small xorshift generator so the fixture is reproducible without an
/// external randomness crate: deterministic seed in, same samples out.
fn uniform_samples(seed: u64, n: usize, lo: f64, hi: f64) -> Vec<f64> {
    let mut state = seed | 1;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
        out.push(lo + unit * (hi - lo));
    }
    out
}

fn rsd_transform() -> SummarizerTransform {
    SummarizerTransform::compile(
        "0.0 :sum= 0.0 :sumsq= 0 :n=",
        "$sum $1 + :sum= $sumsq $1 $1 * + :sumsq= $n 1 + :n=",
        "$sum $n / :mean= $sumsq $n / $mean $mean * - :var= $var sqrt $mean abs /",
    )
    .unwrap()
}

fn run_rsd(samples: &[f64]) -> f64 {
    let transform = rsd_transform();
    let evaluator = Evaluator::new();
    let mut registers = Registers::new();
    let window: Vec<Context> = samples
        .iter()
        .map(|v| Context::new("window").with_input(InputSlot::new("sample", Timestamp::from_raw(0), Some(Value::Double(*v)))))
        .collect();
    let final_context = Context::new("window");
    match transform.summarize(&evaluator, &window, &final_context, &mut registers).unwrap() {
        Some(Value::Double(d)) => d,
        other => panic!("expected a double rsd, got {other:?}"),
    }
}

#[test]
fn rsd_over_a_hundred_uniform_samples_is_finite_and_positive() {
    let samples = uniform_samples(0xC0FFEE, 100, -0.5, 0.5);
    let rsd = run_rsd(&samples);
    assert!(rsd.is_finite());
    assert!(rsd > 0.0);
}

#[test]
fn rsd_is_reproducible_to_float32_precision_over_the_same_stream() {
    let samples = uniform_samples(0xC0FFEE, 100, -0.5, 0.5);
    let first = run_rsd(&samples);
    let second = run_rsd(&samples);
    assert_eq!(first as f32, second as f32);
}
