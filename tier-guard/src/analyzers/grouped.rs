//! Partitioning rows into segments for per-group analysis.
//!
//! Both the normality suite and the threshold classifier run independently
//! per segment. Segments are keyed by [`GroupKey`], so a segment value written
//! as `7` in one row and `" 7 "` in another lands in the same partition, while
//! `"007"` gets its own.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{GroupKey, GroupKeyIndex, Row};

/// Configuration for grouped analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Columns to group by.
    pub columns: Vec<String>,

    /// Maximum number of groups to keep; rows of further groups are skipped.
    pub max_groups: Option<usize>,
}

impl GroupingConfig {
    /// Creates a grouping configuration over the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            max_groups: None,
        }
    }

    /// Sets the maximum number of groups to track.
    pub fn with_max_groups(mut self, max: usize) -> Self {
        self.max_groups = Some(max);
        self
    }

    /// Returns the canonical key of a row under this grouping.
    pub fn key_for(&self, row: &Row) -> GroupKey {
        GroupKey::composite(self.columns.iter().map(|c| row.get_or_null(c)))
    }

    /// Returns the first-seen display label of a row's group values.
    fn label_for(&self, row: &Row) -> String {
        self.columns
            .iter()
            .map(|c| row.get_or_null(c).to_string())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Rows sharing one group key.
#[derive(Debug, Clone)]
pub struct RowPartition<'a> {
    /// Canonical key.
    pub key: GroupKey,
    /// Group values as first seen, for display.
    pub label: String,
    /// Rows in input order.
    pub rows: Vec<&'a Row>,
}

impl RowPartition<'_> {
    /// Number of rows in the partition.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the partition has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Clones the partition's rows into an owned dataset.
    pub fn to_rows(&self) -> Vec<Row> {
        self.rows.iter().map(|r| (*r).clone()).collect()
    }
}

/// Splits rows into partitions, in order of first appearance.
///
/// When `max_groups` is set, rows of groups beyond the limit are left out
/// and reported in the debug log.
pub fn partition_rows<'a>(rows: &'a [Row], config: &GroupingConfig) -> Vec<RowPartition<'a>> {
    let mut index: GroupKeyIndex<RowPartition<'a>> = GroupKeyIndex::new();
    let mut dropped_rows = 0usize;

    for row in rows {
        let key = config.key_for(row);
        let at_limit = config.max_groups.is_some_and(|max| index.len() >= max);
        if at_limit && !index.contains(&key) {
            dropped_rows += 1;
            continue;
        }
        index
            .get_or_insert_with(key.clone(), || RowPartition {
                key,
                label: config.label_for(row),
                rows: Vec::new(),
            })
            .rows
            .push(row);
    }

    if dropped_rows > 0 {
        debug!(
            dropped_rows,
            max_groups = ?config.max_groups,
            "Group limit reached, rows of further groups skipped"
        );
    }

    index.into_entries().into_iter().map(|(_, p)| p).collect()
}
