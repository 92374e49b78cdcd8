//! Descriptive statistics over `f64` samples.
//!
//! All functions expect finite inputs; callers filter NaN and infinities when
//! extracting samples (see [`finite_values`]). Empty samples return `None`
//! rather than NaN.

use serde::{Deserialize, Serialize};

/// Keeps only finite values.
pub fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Returns a sorted copy of the sample.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divide by n).
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Sample variance (divide by n - 1). Requires two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64)
}

/// Population standard deviation.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Sample standard deviation.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Returns true if every value equals the first (an empty sample is not constant).
pub fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| v == first),
        None => false,
    }
}

/// Shape of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Moments {
    /// Biased third standardized moment.
    pub skewness: f64,
    /// Biased fourth standardized moment minus 3.
    pub kurtosis: f64,
}

/// Population skewness and excess kurtosis.
///
/// Fewer than three values, or zero variance, yields `(0, 0)`.
pub fn moments(values: &[f64]) -> Moments {
    if values.len() < 3 || is_constant(values) {
        return Moments::default();
    }
    let n = values.len() as f64;
    let m = values.iter().sum::<f64>() / n;
    let (m2, m3, m4) = values.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), v| {
        let d = v - m;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    });
    let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);
    if m2 <= 0.0 {
        return Moments::default();
    }
    Moments {
        skewness: m3 / m2.powf(1.5),
        kurtosis: m4 / (m2 * m2) - 3.0,
    }
}

/// Quartiles by direct index into the sorted sample, without interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

impl Quartiles {
    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Value at index `floor(n * p)` of a sorted sample, clamped to the last index.
pub fn index_quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = ((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1);
    sorted.get(idx).copied()
}

/// Quartiles of an unsorted sample.
pub fn quartiles(values: &[f64]) -> Option<Quartiles> {
    let s = sorted(values);
    Some(Quartiles {
        q1: index_quantile(&s, 0.25)?,
        q2: index_quantile(&s, 0.5)?,
        q3: index_quantile(&s, 0.75)?,
    })
}
