//! Moment-based test on skewness and excess kurtosis.

use super::{NormalityTest, Sample, TestOutcome};
use crate::statistics::{descriptive, normal};

/// Two-tailed critical value at α = 0.05.
const Z_CRITICAL: f64 = 1.96;

/// Standard errors of skewness and excess kurtosis for a sample of size `n`.
///
/// Defined for `n > 3`.
pub fn standard_errors(n: usize) -> (f64, f64) {
    let n = n as f64;
    let se_skew = (6.0 * n * (n - 1.0) / ((n - 2.0) * (n + 1.0) * (n + 3.0))).sqrt();
    let se_kurt = (24.0 * n * (n - 1.0).powi(2)
        / ((n - 3.0) * (n - 2.0) * (n + 3.0) * (n + 5.0)))
        .sqrt();
    (se_skew, se_kurt)
}

/// Joint z-test on skewness and kurtosis. Normal only if both |z| < 1.96.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZScoreTest;

impl NormalityTest for ZScoreTest {
    fn name(&self) -> &'static str {
        "Z-score"
    }

    fn min_sample_size(&self) -> usize {
        8
    }

    fn compute(&self, sample: &Sample) -> TestOutcome {
        let moments = descriptive::moments(sample.sorted());
        let (se_skew, se_kurt) = standard_errors(sample.len());
        let z_skew = moments.skewness / se_skew;
        let z_kurt = moments.kurtosis / se_kurt;

        let statistic = z_skew.abs().max(z_kurt.abs());
        let p_value = normal::two_tailed_p(z_skew).min(normal::two_tailed_p(z_kurt));
        let is_normal = z_skew.abs() < Z_CRITICAL && z_kurt.abs() < Z_CRITICAL;

        let interpretation = if is_normal {
            format!(
                "{}: |z_skew| = {:.3}, |z_kurt| = {:.3}, both below {Z_CRITICAL}",
                self.name(),
                z_skew.abs(),
                z_kurt.abs()
            )
        } else {
            format!(
                "{}: |z_skew| = {:.3}, |z_kurt| = {:.3}, normality rejected",
                self.name(),
                z_skew.abs(),
                z_kurt.abs()
            )
        };

        TestOutcome {
            is_normal,
            interpretation,
            ..TestOutcome::computed(self.name(), statistic, p_value)
        }
    }
}
