//! Prelude for commonly used types and traits in tier-guard.

pub use crate::analyzers::aggregation::{AggregationConfig, AggregationEngine};
pub use crate::analyzers::inference::{ColumnType, ColumnTypeDetector};
pub use crate::classification::{
    Category, ClassificationMethod, ClassificationParams, IndicatorResolver, MethodConfig,
    RiskLevel, ThresholdClassifier,
};
pub use crate::config::ProfileConfig;
pub use crate::core::{CancellationToken, GroupKey, Row, Value};
pub use crate::error::{Result, TierError};
pub use crate::logging::LogConfig;
pub use crate::profile::{ProfileOrchestrator, ProfileReport, ProfileRunner};
pub use crate::statistics::{NormalityTestResults, NormalityTestSuite};
