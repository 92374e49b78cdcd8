//! Threshold classification of aggregated rows into behavior categories.
//!
//! Thresholds are derived per indicator by [`thresholds`], applied by
//! [`classifier`], and the indicator fields themselves are chosen by a
//! [`resolver::IndicatorResolver`].
//!
//! # Example
//!
//! ```rust
//! use tier_guard::classification::{
//!     Category, ClassificationParams, MethodConfig, RiskLevel, ThresholdClassifier,
//! };
//!
//! let values = [0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0];
//! let counts = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
//! let params = ClassificationParams::from_samples(
//!     ("amount_sum", &values[..]),
//!     ("_count", &counts[..]),
//!     &MethodConfig::iqr(),
//! )
//! .unwrap();
//! assert_eq!(params.value.high, 60.0);
//!
//! let category = ThresholdClassifier::new().classify(65.0, 4.0, &params);
//! assert_eq!(category, Category::HighOnValueField);
//! assert_eq!(category.risk_level(), RiskLevel::High);
//! ```

pub mod classifier;
pub mod resolver;
pub mod thresholds;

pub use classifier::{Category, RiskLevel, ThresholdClassifier};
pub use resolver::{
    ConventionResolver, IndicatorFields, IndicatorResolver, ResolutionSource, ResolvedField,
};
pub use thresholds::{
    ClassificationMethod, ClassificationParams, IndicatorStats, IndicatorThresholds, MethodConfig,
};
