//! Dataset-level analyzers that run before the statistical stages.
//!
//! - **Column typing** (`inference`): number / percentage / string detection
//!   with keyword and value-ratio rules
//! - **Aggregation** (`aggregation`): group-by with concurrent reducers
//! - **Partitioning** (`grouped`): splitting rows by a group field for
//!   per-group tests and thresholds

pub mod aggregation;
pub mod grouped;
pub mod inference;

pub use aggregation::{AggregationConfig, AggregationEngine};
pub use grouped::{partition_rows, GroupingConfig, RowPartition};
pub use inference::{ColumnType, ColumnTypeDetector, ColumnTypeReport, DetectorConfig};
