//! Group-by aggregation with concurrent reducers.
//!
//! Rows are grouped by a composite key and summarized by any combination of
//! sum, non-null count, max, min and distinct-count reducers. Each configured
//! field produces `<field>_sum`, `<field>_count`, `<field>_max`,
//! `<field>_min` or `<field>_distinct_count` columns; every group also gets a
//! `_count` column with its row count.
//!
//! Numeric parsing is lenient: a value that does not parse contributes zero
//! to sums and is ignored by max/min. Mixed-type spreadsheet columns therefore
//! aggregate without errors.
//!
//! # Example
//!
//! ```rust
//! use tier_guard::analyzers::aggregation::{AggregationConfig, AggregationEngine};
//! use tier_guard::row;
//!
//! let rows = vec![
//!     row! { "g" => "A", "v" => 10 },
//!     row! { "g" => "A", "v" => 12 },
//!     row! { "g" => "B", "v" => 100 },
//! ];
//! let config = AggregationConfig::new(["g"]).sum(["v"]);
//! let out = AggregationEngine::new().aggregate(&rows, &config).unwrap();
//! assert_eq!(out.len(), 2);
//! assert_eq!(out[0].get("v_sum").and_then(|v| v.as_number()), Some(22.0));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::core::{GroupKey, GroupKeyIndex, Row, Value};
use crate::error::{Result, TierError};

/// Name of the per-group row count column.
pub const GROUP_COUNT_FIELD: &str = "_count";

/// Column suffixes produced by the reducers.
pub mod suffix {
    pub const SUM: &str = "_sum";
    pub const COUNT: &str = "_count";
    pub const MAX: &str = "_max";
    pub const MIN: &str = "_min";
    pub const DISTINCT_COUNT: &str = "_distinct_count";
}

/// Which columns to group by and which reducers to apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Columns forming the composite group key, in key order.
    pub group_by: Vec<String>,
    pub sum_columns: Vec<String>,
    pub count_columns: Vec<String>,
    pub max_columns: Vec<String>,
    pub min_columns: Vec<String>,
    pub distinct_columns: Vec<String>,
}

fn owned<I, S>(columns: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    columns.into_iter().map(Into::into)
}

impl AggregationConfig {
    /// Creates a configuration grouping by the given columns.
    pub fn new<I, S>(group_by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_by: owned(group_by).collect(),
            ..Self::default()
        }
    }

    /// Adds sum reducers.
    pub fn sum<I: IntoIterator<Item = S>, S: Into<String>>(mut self, columns: I) -> Self {
        self.sum_columns.extend(owned(columns));
        self
    }

    /// Adds non-null count reducers.
    pub fn count<I: IntoIterator<Item = S>, S: Into<String>>(mut self, columns: I) -> Self {
        self.count_columns.extend(owned(columns));
        self
    }

    /// Adds max reducers.
    pub fn max<I: IntoIterator<Item = S>, S: Into<String>>(mut self, columns: I) -> Self {
        self.max_columns.extend(owned(columns));
        self
    }

    /// Adds min reducers.
    pub fn min<I: IntoIterator<Item = S>, S: Into<String>>(mut self, columns: I) -> Self {
        self.min_columns.extend(owned(columns));
        self
    }

    /// Adds distinct-count reducers.
    pub fn distinct<I: IntoIterator<Item = S>, S: Into<String>>(mut self, columns: I) -> Self {
        self.distinct_columns.extend(owned(columns));
        self
    }

    /// Returns true when no grouping is configured (rows pass through).
    pub fn is_passthrough(&self) -> bool {
        self.group_by.is_empty()
    }
}

/// Running state for one group.
#[derive(Debug)]
struct GroupAccumulator {
    key_values: Vec<Value>,
    row_count: usize,
    sums: Vec<f64>,
    counts: Vec<usize>,
    maxes: Vec<Option<f64>>,
    mins: Vec<Option<f64>>,
    distinct: Vec<HashSet<GroupKey>>,
}

impl GroupAccumulator {
    fn seed(key_values: Vec<Value>, config: &AggregationConfig) -> Self {
        Self {
            key_values,
            row_count: 0,
            sums: vec![0.0; config.sum_columns.len()],
            counts: vec![0; config.count_columns.len()],
            maxes: vec![None; config.max_columns.len()],
            mins: vec![None; config.min_columns.len()],
            distinct: vec![HashSet::new(); config.distinct_columns.len()],
        }
    }

    fn update(&mut self, row: &Row, config: &AggregationConfig) {
        self.row_count += 1;

        for (sum, column) in self.sums.iter_mut().zip(&config.sum_columns) {
            *sum += row.get_or_null(column).to_number_lenient().unwrap_or(0.0);
        }
        for (count, column) in self.counts.iter_mut().zip(&config.count_columns) {
            if row.get_or_null(column).is_present() {
                *count += 1;
            }
        }
        for (max, column) in self.maxes.iter_mut().zip(&config.max_columns) {
            if let Some(n) = row.get_or_null(column).to_number_lenient() {
                *max = Some(max.map_or(n, |m| m.max(n)));
            }
        }
        for (min, column) in self.mins.iter_mut().zip(&config.min_columns) {
            if let Some(n) = row.get_or_null(column).to_number_lenient() {
                *min = Some(min.map_or(n, |m| m.min(n)));
            }
        }
        for (set, column) in self.distinct.iter_mut().zip(&config.distinct_columns) {
            let value = row.get_or_null(column);
            if value.is_present() {
                set.insert(GroupKey::from_value(value));
            }
        }
    }

    /// Consumes the accumulator; distinct sets are reduced to their sizes here and nowhere else.
    fn finalize(self, config: &AggregationConfig) -> Row {
        let mut row = Row::with_capacity(
            config.group_by.len()
                + 1
                + self.sums.len()
                + self.counts.len()
                + self.maxes.len()
                + self.mins.len()
                + self.distinct.len(),
        );

        for (column, value) in config.group_by.iter().zip(self.key_values) {
            row.insert(column.clone(), value);
        }
        row.insert(GROUP_COUNT_FIELD, self.row_count);

        for (column, sum) in config.sum_columns.iter().zip(self.sums) {
            row.insert(format!("{column}{}", suffix::SUM), sum);
        }
        for (column, count) in config.count_columns.iter().zip(self.counts) {
            row.insert(format!("{column}{}", suffix::COUNT), count);
        }
        for (column, max) in config.max_columns.iter().zip(self.maxes) {
            row.insert(format!("{column}{}", suffix::MAX), max);
        }
        for (column, min) in config.min_columns.iter().zip(self.mins) {
            row.insert(format!("{column}{}", suffix::MIN), min);
        }
        for (column, set) in config.distinct_columns.iter().zip(self.distinct) {
            row.insert(format!("{column}{}", suffix::DISTINCT_COUNT), set.len());
        }

        row
    }
}

/// Groups rows and applies the configured reducers.
#[derive(Debug, Clone, Default)]
pub struct AggregationEngine;

impl AggregationEngine {
    /// Creates a new aggregation engine.
    pub fn new() -> Self {
        Self
    }

    /// Aggregates `rows` according to `config`.
    ///
    /// With an empty `group_by` the rows are returned unchanged. Groups are
    /// emitted in order of first appearance; each group keeps the first-seen
    /// representation of its key values.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::ColumnNotFound`] if a group-by column is absent
    /// from the first row.
    #[instrument(skip(self, rows, config), fields(rows = rows.len(), group_by = ?config.group_by))]
    pub fn aggregate(&self, rows: &[Row], config: &AggregationConfig) -> Result<Vec<Row>> {
        if config.is_passthrough() {
            debug!("No group-by columns configured, passing rows through");
            return Ok(rows.to_vec());
        }

        if let Some(first) = rows.first() {
            if let Some(missing) = config.group_by.iter().find(|c| !first.contains(c)) {
                return Err(TierError::column_not_found(missing.as_str()));
            }
        }

        let mut groups: GroupKeyIndex<GroupAccumulator> = GroupKeyIndex::new();
        for row in rows {
            let key_values: Vec<&Value> = config
                .group_by
                .iter()
                .map(|column| row.get_or_null(column))
                .collect();
            let key = GroupKey::composite(key_values.iter().copied());
            groups
                .get_or_insert_with(key, || {
                    GroupAccumulator::seed(key_values.iter().map(|v| (*v).clone()).collect(), config)
                })
                .update(row, config);
        }

        let output: Vec<Row> = groups
            .into_entries()
            .into_iter()
            .map(|(_, acc)| acc.finalize(config))
            .collect();

        info!(
            input_rows = rows.len(),
            groups = output.len(),
            "Completed aggregation"
        );
        Ok(output)
    }
}
