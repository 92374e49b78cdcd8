//! Goodness-of-fit tests against the normal distribution.
//!
//! Each test implements [`NormalityTest`] and receives a prepared [`Sample`].
//! Tests never fail: a sample that is too small, too large or constant yields
//! a [`TestOutcome`] whose [`TestStatus`] says why no statistic was computed.
//! A test that did not run never rejects normality.

pub mod anderson_darling;
pub mod ks;
pub mod z_score;

pub use anderson_darling::AndersonDarlingTest;
pub use ks::KolmogorovSmirnovTest;
pub use z_score::ZScoreTest;

use serde::{Deserialize, Serialize};

use super::descriptive;

/// Significance level shared by all tests.
pub const ALPHA: f64 = 0.05;

/// Interpretation attached to zero-variance samples.
pub const IDENTICAL_VALUES: &str = "all values identical; treated as normal (zero variance)";

/// Whether a test produced a statistic, and if not, why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Computed,
    /// Fewer values than the test requires.
    InsufficientData,
    /// Zero variance.
    Degenerate,
    /// Outside the range the approximation is valid for.
    NotApplicable,
}

/// Result of one normality test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub is_normal: bool,
    pub interpretation: String,
    pub status: TestStatus,
}

impl TestOutcome {
    /// A computed outcome; normality is accepted when `p > ALPHA`.
    pub fn computed(test: &str, statistic: f64, p_value: f64) -> Self {
        let is_normal = p_value > ALPHA;
        let interpretation = if is_normal {
            format!("{test}: p = {p_value:.4} > {ALPHA}, consistent with a normal distribution")
        } else {
            format!("{test}: p = {p_value:.4} <= {ALPHA}, normality rejected")
        };
        Self {
            statistic: Some(statistic),
            p_value: Some(p_value),
            is_normal,
            interpretation,
            status: TestStatus::Computed,
        }
    }

    /// Outcome for a zero-variance sample.
    pub fn degenerate() -> Self {
        Self::not_run(TestStatus::Degenerate, IDENTICAL_VALUES.to_string())
    }

    /// Outcome for a sample below the test's minimum size.
    pub fn insufficient_data(test: &str, required: usize, actual: usize) -> Self {
        Self::not_run(
            TestStatus::InsufficientData,
            format!("{test}: requires at least {required} values, found {actual}"),
        )
    }

    /// Outcome for a sample the test's approximation does not cover.
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self::not_run(TestStatus::NotApplicable, reason.into())
    }

    fn not_run(status: TestStatus, interpretation: String) -> Self {
        Self {
            statistic: None,
            p_value: None,
            is_normal: true,
            interpretation,
            status,
        }
    }

    /// Returns true if a statistic was computed.
    pub fn is_computed(&self) -> bool {
        self.status == TestStatus::Computed
    }

    /// Returns true if the test ran and rejected normality.
    pub fn rejects(&self) -> bool {
        self.is_computed() && !self.is_normal
    }
}

/// A sorted sample with its sample mean and standard deviation (n - 1).
#[derive(Debug, Clone)]
pub struct Sample {
    sorted: Vec<f64>,
    mean: f64,
    std_dev: f64,
    constant: bool,
}

impl Sample {
    /// Prepares a sample, dropping non-finite values.
    pub fn new(values: &[f64]) -> Self {
        let sorted = descriptive::sorted(&descriptive::finite_values(values));
        let mean = descriptive::mean(&sorted).unwrap_or(0.0);
        let std_dev = descriptive::sample_std_dev(&sorted).unwrap_or(0.0);
        let constant = descriptive::is_constant(&sorted);
        Self {
            sorted,
            mean,
            std_dev,
            constant,
        }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Values in ascending order.
    pub fn sorted(&self) -> &[f64] {
        &self.sorted
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation; zero for fewer than two values.
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// True when the sample is non-empty and every value is identical.
    pub fn is_constant(&self) -> bool {
        self.constant
    }
}

/// A normality test over a prepared sample.
pub trait NormalityTest: Send + Sync {
    /// Display name used in interpretations.
    fn name(&self) -> &'static str;

    /// Minimum number of values.
    fn min_sample_size(&self) -> usize;

    /// Maximum number of values the p-value approximation covers.
    fn max_sample_size(&self) -> Option<usize> {
        None
    }

    /// Computes the statistic. Called only with non-constant samples within
    /// the supported size range.
    fn compute(&self, sample: &Sample) -> TestOutcome;

    /// Runs the test, handling constant and out-of-range samples first.
    fn evaluate(&self, sample: &Sample) -> TestOutcome {
        if sample.is_constant() {
            return TestOutcome::degenerate();
        }
        let n = sample.len();
        if n < self.min_sample_size() {
            return TestOutcome::insufficient_data(self.name(), self.min_sample_size(), n);
        }
        if let Some(max) = self.max_sample_size() {
            if n > max {
                return TestOutcome::not_applicable(format!(
                    "{}: p-value approximation valid for at most {max} values, found {n}",
                    self.name()
                ));
            }
        }
        self.compute(sample)
    }
}
