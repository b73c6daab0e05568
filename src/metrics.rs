//! Metrics.
//!
//! Metrics summarize a validation run; they play no part in training.

use crate::train::ValidationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Supported evaluation metrics.
pub enum Metric {
    /// Mean of `(target - output)^2` over every output component.
    Mse,
    /// Mean of `|target - output|` over every output component.
    Mae,
    /// Fraction of output components on the same side of 0.5 as their target.
    BinaryAccuracy,
}

impl Metric {
    /// Evaluate over validation results.
    ///
    /// Components are paired position by position; a result whose output is
    /// shorter than its target only contributes the paired components. Returns
    /// `None` when nothing was paired.
    pub fn evaluate(self, results: &[ValidationResult]) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for r in results {
            for (&t, &y) in r.target.iter().zip(&r.output) {
                sum += self.component(t, y);
                count += 1;
            }
        }
        (count > 0).then(|| sum / count as f64)
    }

    #[inline]
    fn component(self, target: f64, output: f64) -> f64 {
        match self {
            Metric::Mse => {
                let d = target - output;
                d * d
            }
            Metric::Mae => (target - output).abs(),
            Metric::BinaryAccuracy => {
                if (output >= 0.5) == (target >= 0.5) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Mse => "mse",
            Metric::Mae => "mae",
            Metric::BinaryAccuracy => "binary_accuracy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    fn result(pattern: usize, target: &[f64], output: &[f64]) -> ValidationResult {
        ValidationResult {
            pattern,
            target: target.to_vec(),
            output: output.to_vec(),
        }
    }

    #[test]
    fn mse_and_mae_average_over_components() {
        let rs = [result(1, &[1.0, 0.0], &[0.5, 0.0]), result(2, &[0.0], &[1.0])];
        assert_abs_diff_eq!(Metric::Mse.evaluate(&rs).unwrap(), (0.25 + 0.0 + 1.0) / 3.0);
        assert_abs_diff_eq!(Metric::Mae.evaluate(&rs).unwrap(), (0.5 + 0.0 + 1.0) / 3.0);
    }

    #[test]
    fn binary_accuracy_thresholds_at_half() {
        let rs = [
            result(1, &[1.0], &[0.9]),
            result(2, &[0.0], &[0.4]),
            result(3, &[1.0], &[0.2]),
            result(4, &[0.0], &[0.5]),
        ];
        assert_eq!(Metric::BinaryAccuracy.evaluate(&rs), Some(0.5));
    }

    #[test]
    fn empty_results_have_no_value() {
        assert_eq!(Metric::Mse.evaluate(&[]), None);
        assert_eq!(Metric::Mae.evaluate(&[result(1, &[], &[0.3])]), None);
    }
}
