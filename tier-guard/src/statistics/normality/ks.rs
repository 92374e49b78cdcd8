//! One-sample Kolmogorov–Smirnov test against a fitted normal.

use super::{NormalityTest, Sample, TestOutcome};
use crate::statistics::normal;

const MAX_TERMS: u32 = 200;
const TERM_EPSILON: f64 = 1e-15;
const P_FLOOR: f64 = 1e-4;
const P_CEIL: f64 = 1.0 - 1e-4;

/// Kolmogorov–Smirnov test with parameters estimated from the sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct KolmogorovSmirnovTest;

impl NormalityTest for KolmogorovSmirnovTest {
    fn name(&self) -> &'static str {
        "Kolmogorov-Smirnov"
    }

    fn min_sample_size(&self) -> usize {
        5
    }

    fn compute(&self, sample: &Sample) -> TestOutcome {
        let (mean, sd) = (sample.mean(), sample.std_dev());
        let d = max_deviation(sample.sorted(), |x| normal::cdf_with(x, mean, sd));
        let lambda = d * (sample.len() as f64).sqrt();
        TestOutcome::computed(self.name(), d, kolmogorov_p_value(lambda))
    }
}

/// Largest gap between the empirical step function of `sorted` and `cdf`,
/// checking both sides of each step.
pub fn max_deviation(sorted: &[f64], cdf: impl Fn(f64) -> f64) -> f64 {
    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .fold(0.0_f64, |d, (i, &x)| {
            let f = cdf(x);
            let above = (i + 1) as f64 / n - f;
            let below = f - i as f64 / n;
            d.max(above).max(below)
        })
}

/// Asymptotic two-sided Kolmogorov p-value for `λ = D·√n`.
///
/// The alternating series is truncated once a term falls below 1e-15. A
/// series that has not converged after 200 terms reports `p = 1`. The result
/// is clamped to `[1e-4, 1 - 1e-4]`.
pub fn kolmogorov_p_value(lambda: f64) -> f64 {
    if !lambda.is_finite() || lambda <= 0.0 {
        return P_CEIL;
    }
    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=MAX_TERMS {
        let k = f64::from(k);
        let term = sign * (-2.0 * k * k * lambda * lambda).exp();
        sum += term;
        if term.abs() < TERM_EPSILON {
            return (2.0 * sum).clamp(P_FLOOR, P_CEIL);
        }
        sign = -sign;
    }
    P_CEIL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::normality::TestStatus;

    #[test]
    fn test_p_value_reference_points() {
        // Classic critical value: λ ≈ 1.358 at α = 0.05
        assert!((kolmogorov_p_value(1.358) - 0.05).abs() < 1e-3);
        assert!((kolmogorov_p_value(1.0) - 0.27).abs() < 1e-2);
    }

    #[test]
    fn test_p_value_is_clamped() {
        assert_eq!(kolmogorov_p_value(10.0), P_FLOOR);
        assert_eq!(kolmogorov_p_value(0.0), P_CEIL);
        assert!(kolmogorov_p_value(0.2) <= P_CEIL);
    }

    #[test]
    fn test_max_deviation_checks_both_step_sides() {
        // Uniform CDF on [0, 1] against a single point at 0.5
        let d = max_deviation(&[0.5], |x| x);
        assert!((d - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_requires_five_values() {
        let outcome = KolmogorovSmirnovTest.evaluate(&Sample::new(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(outcome.status, TestStatus::InsufficientData);
    }

    #[test]
    fn test_rejects_bimodal_sample() {
        let mut values = vec![0.0; 100];
        values.extend(std::iter::repeat(100.0).take(100));
        let outcome = KolmogorovSmirnovTest.evaluate(&Sample::new(&values));
        assert_eq!(outcome.status, TestStatus::Computed);
        assert!(!outcome.is_normal);
        assert!(outcome.p_value.unwrap() <= 0.05);
    }
}
