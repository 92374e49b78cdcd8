//! Heuristic identification of a non-normal sample's distribution family.
//!
//! Scores are plausibilities in `[0, 1]`, not likelihoods. They rank the
//! candidate families for exploratory reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::descriptive;
use super::normality::ks::max_deviation;
use super::normality::{KolmogorovSmirnovTest, NormalityTest, Sample, IDENTICAL_VALUES};

/// Candidate families, in tie-breaking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionFamily {
    LogNormal,
    Exponential,
    Gamma,
    Poisson,
    Constant,
    Unknown,
}

impl DistributionFamily {
    /// Stable label used in reports and summaries.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LogNormal => "log_normal",
            Self::Exponential => "exponential",
            Self::Gamma => "gamma",
            Self::Poisson => "poisson",
            Self::Constant => "constant",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DistributionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plausibility score per candidate family.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DistributionScores {
    pub log_normal: f64,
    pub exponential: f64,
    pub gamma: f64,
    pub poisson: f64,
}

impl DistributionScores {
    fn ranked(&self) -> [(DistributionFamily, f64); 4] {
        [
            (DistributionFamily::LogNormal, self.log_normal),
            (DistributionFamily::Exponential, self.exponential),
            (DistributionFamily::Gamma, self.gamma),
            (DistributionFamily::Poisson, self.poisson),
        ]
    }
}

/// Best-fitting family with the scores it was chosen from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionFit {
    pub best_fit: DistributionFamily,
    pub scores: DistributionScores,
    pub interpretation: String,
}

impl DistributionFit {
    /// Scores every family and picks the highest. Earlier families win ties;
    /// all-zero scores yield [`DistributionFamily::Unknown`]. Identical values
    /// short-circuit to [`DistributionFamily::Constant`].
    pub fn identify(values: &[f64]) -> Self {
        let values = descriptive::finite_values(values);
        if descriptive::is_constant(&values) {
            return Self {
                best_fit: DistributionFamily::Constant,
                scores: DistributionScores::default(),
                interpretation: format!("Constant distribution: {IDENTICAL_VALUES}"),
            };
        }

        let scores = DistributionScores {
            log_normal: log_normal_score(&values),
            exponential: exponential_score(&values),
            gamma: gamma_score(&values),
            poisson: poisson_score(&values),
        };

        let (best_fit, best) = scores.ranked().into_iter().fold(
            (DistributionFamily::Unknown, 0.0),
            |(family, best), (candidate, score)| {
                if score > best {
                    (candidate, score)
                } else {
                    (family, best)
                }
            },
        );

        let interpretation = match best_fit {
            DistributionFamily::Unknown => {
                "No candidate distribution fits; shape unidentified".to_string()
            }
            family => format!("Closest match: {family} (score {best:.3})"),
        };

        Self {
            best_fit,
            scores,
            interpretation,
        }
    }
}

/// KS p-value of the log of the positive values, scaled by the positive share.
fn log_normal_score(values: &[f64]) -> f64 {
    let logs: Vec<f64> = values.iter().filter(|v| **v > 0.0).map(|v| v.ln()).collect();
    if values.is_empty() || logs.is_empty() {
        return 0.0;
    }
    let outcome = KolmogorovSmirnovTest.evaluate(&Sample::new(&logs));
    if !outcome.is_computed() {
        return 0.0;
    }
    let positive_share = logs.len() as f64 / values.len() as f64;
    outcome.p_value.unwrap_or(0.0) * positive_share
}

/// One minus the largest CDF gap to Exp(1/mean), floored at 0.1.
fn exponential_score(values: &[f64]) -> f64 {
    if values.iter().any(|v| *v < 0.0) {
        return 0.0;
    }
    let mean = match descriptive::mean(values) {
        Some(m) if m > 0.0 => m,
        _ => return 0.0,
    };
    let rate = 1.0 / mean;
    let d = max_deviation(&descriptive::sorted(values), |x| 1.0 - (-rate * x).exp());
    (1.0 - d).max(0.1)
}

/// Method-of-moments shape `mean² / variance`; moderate shapes score higher.
fn gamma_score(values: &[f64]) -> f64 {
    if values.iter().any(|v| *v < 0.0) {
        return 0.0;
    }
    let (mean, variance) = match (descriptive::mean(values), descriptive::sample_variance(values)) {
        (Some(m), Some(v)) if m > 0.0 && v > 0.0 => (m, v),
        _ => return 0.0,
    };
    let shape = mean * mean / variance;
    if shape > 0.5 && shape < 3.0 {
        0.7
    } else {
        0.3
    }
}

/// Non-negative integers score by how close the dispersion index is to 1.
fn poisson_score(values: &[f64]) -> f64 {
    if values.iter().any(|v| *v < 0.0 || v.fract() != 0.0) {
        return 0.0;
    }
    let (mean, variance) = match (descriptive::mean(values), descriptive::sample_variance(values)) {
        (Some(m), Some(v)) if m > 0.0 => (m, v),
        _ => return 0.0,
    };
    0.5 + 0.4 * (-(variance / mean - 1.0).abs()).exp()
}
