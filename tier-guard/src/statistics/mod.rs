//! Statistical characterization of numeric fields.
//!
//! - [`descriptive`]: moments, variance and index quartiles
//! - [`normal`]: the standard normal CDF
//! - [`normality`]: Kolmogorov–Smirnov, Anderson–Darling and Z-score tests
//! - [`distribution`]: fallback distribution-family identification
//! - [`suite`]: the per-field and per-group test battery
//!
//! All tests use a significance level of 0.05.

pub mod descriptive;
pub mod distribution;
pub mod normal;
pub mod normality;
pub mod sampling;
pub mod suite;

pub use distribution::{DistributionFamily, DistributionFit, DistributionScores};
pub use normality::{TestOutcome, TestStatus, ALPHA};
pub use sampling::Sampler;
pub use suite::{
    FieldTestResult, GroupTestResults, NormalityConfig, NormalityTestResults, NormalityTestSuite,
    TestSummary,
};
