use super::Engine;
use crate::data::TensorView;
use crate::error::{Result, RuntimeError};
use serde::Serialize;
use std::time::Instant;

/// Checks that a loaded engine exposes exactly the expected tensor names, in order.
pub fn validate_model_names(
    engine: &dyn Engine,
    expected_inputs: &[&str],
    expected_outputs: &[&str],
) -> Result<()> {
    check_names("input", &engine.input_names(), expected_inputs)?;
    check_names("output", &engine.output_names(), expected_outputs)
}

fn check_names(kind: &str, actual: &[String], expected: &[&str]) -> Result<()> {
    if actual.len() != expected.len() || actual.iter().zip(expected).any(|(a, e)| a != e) {
        return Err(RuntimeError::failed_precondition(format!(
            "Engine {kind} names {actual:?} do not match expected {expected:?}"
        )));
    }
    Ok(())
}

fn run_once(engine: &mut dyn Engine, inputs: &[TensorView<'_>]) -> Result<()> {
    engine
        .infer(inputs)
        .map(drop)
        .map_err(|e| RuntimeError::internal(format!("Engine inference failed: {e}")))
}

/// Latency statistics over repeated `infer` calls.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub mean_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub std_dev_ms: f64,
    pub iterations: usize,
    pub throughput_fps: f64,
}

/// Runs `warmup` untimed calls, then `iterations` timed ones.
pub fn benchmark(
    engine: &mut dyn Engine,
    inputs: &[TensorView<'_>],
    iterations: usize,
    warmup: usize,
) -> Result<BenchmarkResult> {
    if iterations == 0 {
        return Err(RuntimeError::invalid_argument(
            "benchmark needs at least one iteration",
        ));
    }
    for _ in 0..warmup {
        run_once(engine, inputs)?;
    }

    let mut samples = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let start = Instant::now();
        run_once(engine, inputs)?;
        samples.push(start.elapsed().as_secs_f64() * 1000.0);
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    let result = BenchmarkResult {
        mean_latency_ms: mean,
        min_latency_ms: samples.iter().copied().fold(f64::INFINITY, f64::min),
        max_latency_ms: samples.iter().copied().fold(0.0, f64::max),
        std_dev_ms: variance.sqrt(),
        iterations,
        throughput_fps: if mean > 0.0 { 1000.0 / mean } else { 0.0 },
    };
    log::debug!("Benchmark: {result:?}");
    Ok(result)
}
