//! Column type detection for display formatting.
//!
//! Classifies each column as [`ColumnType::Number`], [`ColumnType::Percentage`]
//! or [`ColumnType::String`] from value ratios and column-name keywords. The
//! result is side metadata: the statistical stages use it only to choose
//! default fields, never to change how a value is coerced.
//!
//! # Example
//!
//! ```rust
//! use tier_guard::analyzers::inference::{ColumnType, ColumnTypeDetector};
//! use tier_guard::row;
//!
//! let rows = vec![
//!     row! { "region" => "north", "amount" => 10, "conversion_rate" => 0.25 },
//!     row! { "region" => "south", "amount" => 12, "conversion_rate" => 0.5 },
//! ];
//! let report = ColumnTypeDetector::new().detect(&rows);
//! assert_eq!(report.get("region"), Some(ColumnType::String));
//! assert_eq!(report.get("amount"), Some(ColumnType::Number));
//! assert_eq!(report.get("conversion_rate"), Some(ColumnType::Percentage));
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::core::{column_names, Row, Value};

/// Display type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Plain numbers
    Number,
    /// Ratios in [0, 1] or values written with `%`
    Percentage,
    /// Anything else
    String,
}

impl ColumnType {
    /// Returns true for number and percentage columns.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Number | ColumnType::Percentage)
    }
}

/// Configuration for the column type detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of leading rows to inspect; `None` inspects the whole dataset (default: None)
    pub sample_size: Option<usize>,
    /// Fraction of non-empty values that must be numeric (default: 0.8)
    pub numeric_ratio: f64,
    /// Lower-case fragments that mark a column name as a percentage
    pub percentage_keywords: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_size: None,
            numeric_ratio: 0.8,
            percentage_keywords: [
                "percent",
                "pct",
                "ratio",
                "rate",
                "share",
                "proportion",
                "%",
                "占比",
                "比例",
                "比率",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Value counts gathered for one column.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnStats {
    pub total_samples: usize,
    pub non_empty: usize,
    pub numeric: usize,
    /// Numeric values within [0, 1]
    pub unit_interval: usize,
    /// Numeric values strictly within (0, 1)
    pub strictly_inside: usize,
    /// Some raw text value contains `%`
    pub has_percent_text: bool,
}

/// Detection result for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedColumn {
    pub name: String,
    pub column_type: ColumnType,
    /// Fraction of non-empty values that parsed as numbers
    pub numeric_ratio: f64,
    pub non_empty: usize,
}

/// Column types of a dataset, in first-row column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnTypeReport {
    pub columns: Vec<DetectedColumn>,
}

impl ColumnTypeReport {
    /// Returns the detected type of a column.
    pub fn get(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.column_type)
    }

    /// Names of number and percentage columns, in column order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.column_type.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Builder for [`ColumnTypeDetector`]
pub struct ColumnTypeDetectorBuilder {
    config: DetectorConfig,
}

impl ColumnTypeDetectorBuilder {
    /// Inspect only the first `size` rows
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = Some(size);
        self
    }

    /// Set the numeric ratio threshold
    pub fn numeric_ratio(mut self, ratio: f64) -> Self {
        self.config.numeric_ratio = ratio;
        self
    }

    /// Add a percentage keyword
    pub fn percentage_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.config
            .percentage_keywords
            .push(keyword.into().to_lowercase());
        self
    }

    /// Build the detector
    pub fn build(self) -> ColumnTypeDetector {
        ColumnTypeDetector {
            config: self.config,
        }
    }
}

/// Classifies columns as number, percentage or string.
#[derive(Debug, Clone)]
pub struct ColumnTypeDetector {
    config: DetectorConfig,
}

impl Default for ColumnTypeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnTypeDetector {
    /// Create a new builder
    pub fn builder() -> ColumnTypeDetectorBuilder {
        ColumnTypeDetectorBuilder {
            config: DetectorConfig::default(),
        }
    }

    /// Create a detector with default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a detector from a configuration section
    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Detect the type of every column discovered from the first row.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn detect(&self, rows: &[Row]) -> ColumnTypeReport {
        let columns: Vec<DetectedColumn> = column_names(rows)
            .into_iter()
            .map(|name| {
                let stats = self.analyze_column(rows, &name);
                let column_type = self.determine_type(&name, &stats);
                debug!(column = %name, ?column_type, ?stats, "Detected column type");
                DetectedColumn {
                    numeric_ratio: ratio(stats.numeric, stats.non_empty),
                    non_empty: stats.non_empty,
                    name,
                    column_type,
                }
            })
            .collect();

        info!(columns = columns.len(), "Completed column type detection");
        ColumnTypeReport { columns }
    }

    /// Detect the type of a single column.
    pub fn detect_column(&self, rows: &[Row], column: &str) -> ColumnType {
        let stats = self.analyze_column(rows, column);
        self.determine_type(column, &stats)
    }

    /// Gather value counts for a column over the configured sample
    pub fn analyze_column(&self, rows: &[Row], column: &str) -> ColumnStats {
        let limit = self.config.sample_size.unwrap_or(rows.len());
        let mut stats = ColumnStats::default();

        for row in rows.iter().take(limit) {
            stats.total_samples += 1;
            let value = row.get_or_null(column);
            if !value.is_present() {
                continue;
            }
            stats.non_empty += 1;

            if let Value::Text(s) = value {
                if s.contains('%') {
                    stats.has_percent_text = true;
                }
            }

            if let Some(n) = value.as_number() {
                stats.numeric += 1;
                if (0.0..=1.0).contains(&n) {
                    stats.unit_interval += 1;
                    if n > 0.0 && n < 1.0 {
                        stats.strictly_inside += 1;
                    }
                }
            }
        }

        stats
    }

    /// Apply the precedence rules to gathered counts
    pub fn determine_type(&self, column: &str, stats: &ColumnStats) -> ColumnType {
        if stats.non_empty == 0 {
            return ColumnType::String;
        }

        let threshold = self.config.numeric_ratio;
        let numeric_ratio = ratio(stats.numeric, stats.non_empty);
        let unit_ratio = ratio(stats.unit_interval, stats.non_empty);

        if self.has_percentage_keyword(column) && unit_ratio >= threshold {
            return ColumnType::Percentage;
        }
        if stats.has_percent_text {
            return ColumnType::Percentage;
        }
        if numeric_ratio >= threshold {
            // Pure 0/1 flags stay numbers.
            let all_in_unit = stats.unit_interval == stats.numeric;
            if all_in_unit && stats.strictly_inside > 0 {
                return ColumnType::Percentage;
            }
            return ColumnType::Number;
        }
        ColumnType::String
    }

    fn has_percentage_keyword(&self, column: &str) -> bool {
        let lowered = column.to_lowercase();
        self.config
            .percentage_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
