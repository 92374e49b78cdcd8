//! # tier-guard - Behavioral Tiering for Tabular Data
//!
//! tier-guard groups and summarizes an in-memory dataset, characterizes the
//! summary statistically, and sorts every aggregated entity into a behavior
//! tier: `double-high`, `high-on-value-field`, `high-on-count-field`,
//! `middle` or `low`.
//!
//! ## Quick Start
//!
//! ```rust
//! use tier_guard::prelude::*;
//! use tier_guard::row;
//!
//! # fn main() -> tier_guard::error::Result<()> {
//! let rows = vec![
//!     row! { "g" => "A", "v" => 10 },
//!     row! { "g" => "A", "v" => 12 },
//!     row! { "g" => "B", "v" => 100 },
//!     row! { "g" => "B", "v" => 120 },
//! ];
//!
//! let mut config = ProfileConfig::default();
//! config.aggregation = AggregationConfig::new(["g"]).sum(["v"]);
//!
//! let report = ProfileRunner::new(config).run(&rows)?;
//! let a = &report.aggregated_rows[0];
//! assert_eq!(a.get("v_sum").and_then(|v| v.as_number()), Some(22.0));
//! assert_eq!(a.get("_count").and_then(|v| v.as_number()), Some(2.0));
//!
//! for row in &report.classification.rows {
//!     println!("{:?} -> {}", row.get("g"), row.get_or_null("_category"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! 1. **Column typing** (`analyzers::inference`): number, percentage or
//!    string per column, for display formatting.
//! 2. **Aggregation** (`analyzers::aggregation`): group-by with sum, count,
//!    max, min and distinct-count reducers.
//! 3. **Normality testing** (`statistics`): Kolmogorov–Smirnov,
//!    Anderson–Darling and Z-score tests per field, optionally per group,
//!    with distribution identification for non-normal fields.
//! 4. **Classification** (`classification`, `profile`): IQR or standard
//!    deviation thresholds per group, applied row by row with a coverage
//!    report.
//!
//! [`profile::ProfileRunner`] chains the stages and can move the whole run
//! onto a background thread with best-effort cancellation.
//!
//! ## Architecture
//!
//! - **`core`**: `Value`, `Row`, group-key normalization, cancellation
//! - **`analyzers`**: column typing, aggregation, row partitioning
//! - **`statistics`**: descriptive statistics, normality tests, distribution fit
//! - **`classification`**: thresholds, the classifier, indicator resolution
//! - **`profile`**: orchestration and the pipeline runner
//! - **`config`**, **`error`**, **`logging`**: ambient infrastructure

pub mod analyzers;
pub mod classification;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod profile;
pub mod statistics;

pub use error::{Result, TierError};
