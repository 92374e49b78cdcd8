//! High/low thresholds for the value and count indicators.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{numeric_column, Row};
use crate::error::{Result, TierError};
use crate::statistics::descriptive;

/// How thresholds are derived from an indicator's distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClassificationMethod {
    /// Q3 + k·IQR above, Q1 − k·IQR below
    #[default]
    #[serde(rename = "iqr")]
    Iqr,
    /// mean ± k·σ (population σ)
    #[serde(rename = "stddev")]
    StdDev,
}

impl ClassificationMethod {
    /// Multiplier used when none is configured.
    pub fn default_multiplier(self) -> f64 {
        match self {
            Self::Iqr => 1.5,
            Self::StdDev => 2.0,
        }
    }
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iqr => f.write_str("iqr"),
            Self::StdDev => f.write_str("stddev"),
        }
    }
}

/// Method and multipliers.
///
/// Multipliers omitted from a configuration file default per method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMethodConfig")]
pub struct MethodConfig {
    pub method: ClassificationMethod,
    pub upper_multiplier: f64,
    pub lower_multiplier: f64,
}

impl MethodConfig {
    /// IQR method with 1.5 on both sides.
    pub fn iqr() -> Self {
        Self::for_method(ClassificationMethod::Iqr)
    }

    /// Standard deviation method with 2.0 on both sides.
    pub fn stddev() -> Self {
        Self::for_method(ClassificationMethod::StdDev)
    }

    pub fn for_method(method: ClassificationMethod) -> Self {
        let k = method.default_multiplier();
        Self {
            method,
            upper_multiplier: k,
            lower_multiplier: k,
        }
    }

    pub fn with_multipliers(mut self, upper: f64, lower: f64) -> Self {
        self.upper_multiplier = upper;
        self.lower_multiplier = lower;
        self
    }

    /// Rejects negative or non-finite multipliers.
    pub fn validate(&self) -> Result<()> {
        for (name, k) in [
            ("upper_multiplier", self.upper_multiplier),
            ("lower_multiplier", self.lower_multiplier),
        ] {
            if !k.is_finite() || k < 0.0 {
                return Err(TierError::configuration(format!(
                    "{name} must be a finite non-negative number, got {k}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for MethodConfig {
    fn default() -> Self {
        Self::iqr()
    }
}

#[derive(Deserialize)]
struct RawMethodConfig {
    #[serde(default)]
    method: ClassificationMethod,
    upper_multiplier: Option<f64>,
    lower_multiplier: Option<f64>,
}

impl From<RawMethodConfig> for MethodConfig {
    fn from(raw: RawMethodConfig) -> Self {
        let defaults = Self::for_method(raw.method);
        Self {
            method: raw.method,
            upper_multiplier: raw.upper_multiplier.unwrap_or(defaults.upper_multiplier),
            lower_multiplier: raw.lower_multiplier.unwrap_or(defaults.lower_multiplier),
        }
    }
}

/// Location and spread of one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorStats {
    Quartiles { q1: f64, q2: f64, q3: f64, iqr: f64 },
    Moments { mean: f64, std_dev: f64 },
}

/// Thresholds of one indicator field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorThresholds {
    pub field: String,
    pub sample_size: usize,
    pub stats: IndicatorStats,
    pub high: f64,
    pub low: f64,
}

impl IndicatorThresholds {
    /// Derives thresholds from the finite values of a sample.
    ///
    /// # Errors
    ///
    /// [`TierError::InsufficientData`] when no finite value remains.
    pub fn compute(field: &str, values: &[f64], config: &MethodConfig) -> Result<Self> {
        let values = descriptive::finite_values(values);
        if values.is_empty() {
            return Err(TierError::insufficient_data(
                format!("{} thresholds of '{field}'", config.method),
                1,
                0,
            ));
        }

        let (stats, high, low) = match config.method {
            ClassificationMethod::Iqr => {
                let q = descriptive::quartiles(&values)
                    .ok_or_else(|| TierError::internal("quartiles of a non-empty sample"))?;
                let iqr = q.iqr();
                (
                    IndicatorStats::Quartiles {
                        q1: q.q1,
                        q2: q.q2,
                        q3: q.q3,
                        iqr,
                    },
                    q.q3 + config.upper_multiplier * iqr,
                    q.q1 - config.lower_multiplier * iqr,
                )
            }
            ClassificationMethod::StdDev => {
                let mean = descriptive::mean(&values)
                    .ok_or_else(|| TierError::internal("mean of a non-empty sample"))?;
                let std_dev = descriptive::population_std_dev(&values)
                    .ok_or_else(|| TierError::internal("std dev of a non-empty sample"))?;
                (
                    IndicatorStats::Moments { mean, std_dev },
                    mean + config.upper_multiplier * std_dev,
                    mean - config.lower_multiplier * std_dev,
                )
            }
        };

        Ok(Self {
            field: field.to_string(),
            sample_size: values.len(),
            stats,
            high,
            low,
        })
    }
}

/// Thresholds for both indicators under one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationParams {
    pub method: ClassificationMethod,
    pub upper_multiplier: f64,
    pub lower_multiplier: f64,
    pub value: IndicatorThresholds,
    pub count: IndicatorThresholds,
}

impl ClassificationParams {
    /// Computes thresholds for `value_field` and `count_field` over `rows`.
    pub fn compute(
        rows: &[Row],
        value_field: &str,
        count_field: &str,
        config: &MethodConfig,
    ) -> Result<Self> {
        let values = numeric_column(rows, value_field);
        let counts = numeric_column(rows, count_field);
        Self::from_samples(
            (value_field, values.as_slice()),
            (count_field, counts.as_slice()),
            config,
        )
    }

    /// Computes thresholds from already extracted samples.
    pub fn from_samples(
        value: (&str, &[f64]),
        count: (&str, &[f64]),
        config: &MethodConfig,
    ) -> Result<Self> {
        Ok(Self {
            method: config.method,
            upper_multiplier: config.upper_multiplier,
            lower_multiplier: config.lower_multiplier,
            value: IndicatorThresholds::compute(value.0, value.1, config)?,
            count: IndicatorThresholds::compute(count.0, count.1, config)?,
        })
    }
}
