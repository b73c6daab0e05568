//! Error terms.
//!
//! - `squared_error` is what an output neuron reports for one target.
//! - `pattern_error` folds the per-output values of one pattern into the amount the
//!   training loop adds to the epoch error.

/// `0.5 * (target - output)^2`.
#[inline]
pub fn squared_error(target: f64, output: f64) -> f64 {
    let diff = target - output;
    0.5 * diff * diff
}

/// Square of the summed per-output errors of one pattern.
#[inline]
pub fn pattern_error(deltas: &[f64]) -> f64 {
    let sum: f64 = deltas.iter().sum();
    sum * sum
}
