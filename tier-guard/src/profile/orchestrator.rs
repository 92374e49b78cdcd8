//! Row-by-row classification with per-group thresholds.
//!
//! [`ProfileOrchestrator`] resolves the indicator fields, computes one
//! [`ClassificationParams`] per group plus a dataset-wide fallback, and
//! produces a new annotated collection of rows. Each row's group value is
//! looked up through a [`GroupKeyIndex`], so `1` and `"1"` share thresholds
//! and a case-only mismatch is reported as a fuzzy match. Rows are never
//! dropped: a row without thresholds is labelled `unknown`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::analyzers::grouped::{partition_rows, GroupingConfig};
use crate::classification::{
    Category, ClassificationParams, ConventionResolver, IndicatorFields, IndicatorResolver,
    MethodConfig, ThresholdClassifier,
};
use crate::core::{GroupKey, GroupKeyIndex, KeyMatch, Row, Value};
use crate::error::{Result, TierError};
use crate::logging::{truncate_field, LogConfig};
use crate::{log_group, log_row};

/// Column appended with the row's category.
pub const CATEGORY_FIELD: &str = "_category";
/// Column appended with the row's risk level.
pub const RISK_LEVEL_FIELD: &str = "_risk_level";

/// Configuration of the classification stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub method: MethodConfig,
    /// Value indicator; resolved by convention when unset
    pub value_field: Option<String>,
    /// Count indicator; resolved by convention when unset
    pub count_field: Option<String>,
    /// Compute thresholds separately per value of this field
    pub group_field: Option<String>,
    /// Classify rows of groups without thresholds against the whole dataset (default: true)
    pub use_fallback: bool,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            method: MethodConfig::default(),
            value_field: None,
            count_field: None,
            group_field: None,
            use_fallback: true,
        }
    }
}

/// How many rows were classified, and how their thresholds were found.
///
/// `direct + fuzzy + fallback + unknown == total`. `anomalous` counts rows
/// that had thresholds but non-numeric indicators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub total: usize,
    pub direct: usize,
    pub fuzzy: usize,
    pub fallback: usize,
    pub anomalous: usize,
    pub unknown: usize,
}

impl CoverageReport {
    /// Rows that received thresholds.
    pub fn classified(&self) -> usize {
        self.direct + self.fuzzy + self.fallback
    }

    /// Fraction of rows that received thresholds; 1 for an empty dataset.
    pub fn coverage_ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.classified() as f64 / self.total as f64
        }
    }
}

/// Category counts of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCategoryCounts {
    pub group: String,
    pub counts: BTreeMap<Category, usize>,
}

/// Category counts overall and per group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub overall: BTreeMap<Category, usize>,
    pub by_group: Vec<GroupCategoryCounts>,
}

impl CategorySummary {
    /// Rows assigned to `category`.
    pub fn count(&self, category: Category) -> usize {
        self.overall.get(&category).copied().unwrap_or(0)
    }
}

/// Thresholds computed for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupParams {
    pub key: GroupKey,
    pub group: String,
    pub row_count: usize,
    /// `None` when the group had no usable indicator values.
    pub params: Option<ClassificationParams>,
}

/// Output of the classification stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    pub indicators: IndicatorFields,
    pub group_field: Option<String>,
    pub group_params: Vec<GroupParams>,
    pub fallback_params: Option<ClassificationParams>,
    /// Input rows with `_category` and `_risk_level` appended.
    pub rows: Vec<Row>,
    pub coverage: CoverageReport,
    pub summary: CategorySummary,
}

/// How a row found its thresholds.
enum ParamsMatch<'a> {
    Direct(&'a ClassificationParams),
    Fuzzy(&'a ClassificationParams),
    Fallback(&'a ClassificationParams),
    Missing,
}

/// Coordinates indicator resolution, threshold computation and row
/// classification for one dataset.
#[derive(Clone)]
pub struct ProfileOrchestrator {
    config: ClassificationConfig,
    resolver: Arc<dyn IndicatorResolver>,
    classifier: ThresholdClassifier,
    supplied_groups: Vec<(Value, ClassificationParams)>,
    supplied_fallback: Option<ClassificationParams>,
    log: LogConfig,
}

impl std::fmt::Debug for ProfileOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileOrchestrator")
            .field("config", &self.config)
            .field("supplied_groups", &self.supplied_groups.len())
            .field("supplied_fallback", &self.supplied_fallback.is_some())
            .finish()
    }
}

impl ProfileOrchestrator {
    /// Creates an orchestrator using the [`ConventionResolver`].
    pub fn new(config: ClassificationConfig) -> Self {
        Self::with_resolver(config, Arc::new(ConventionResolver::new()))
    }

    /// Creates an orchestrator with an explicit indicator resolver.
    pub fn with_resolver(config: ClassificationConfig, resolver: Arc<dyn IndicatorResolver>) -> Self {
        Self {
            config,
            resolver,
            classifier: ThresholdClassifier::new(),
            supplied_groups: Vec::new(),
            supplied_fallback: None,
            log: LogConfig::default(),
        }
    }

    /// Sets per-row and per-group logging detail.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Uses caller-supplied thresholds for a group instead of computing them.
    pub fn with_group_params(mut self, group: impl Into<Value>, params: ClassificationParams) -> Self {
        self.supplied_groups.push((group.into(), params));
        self
    }

    /// Uses caller-supplied dataset-wide fallback thresholds.
    pub fn with_fallback_params(mut self, params: ClassificationParams) -> Self {
        self.supplied_fallback = Some(params);
        self
    }

    pub fn config(&self) -> &ClassificationConfig {
        &self.config
    }

    /// Classifies every row, returning a new annotated collection.
    ///
    /// # Errors
    ///
    /// [`TierError::ColumnNotFound`] for a configured field missing from the
    /// data, or an error from the resolver.
    #[instrument(skip(self, rows), fields(rows = rows.len(), method = %self.config.method.method))]
    pub fn classify(&self, rows: &[Row]) -> Result<ClassificationOutcome> {
        self.config.method.validate()?;
        let indicators = self.resolver.resolve(
            rows,
            self.config.value_field.as_deref(),
            self.config.count_field.as_deref(),
        )?;
        let value_field = indicators.value.field.as_str();
        let count_field = indicators.count.field.as_str();

        let group_field = self.config.group_field.as_deref();
        if let (Some(field), Some(first)) = (group_field, rows.first()) {
            if !first.contains(field) {
                return Err(TierError::column_not_found(field));
            }
        }

        let (index, group_params) = match group_field {
            Some(field) => self.group_thresholds(rows, field, value_field, count_field)?,
            None => (GroupKeyIndex::new(), Vec::new()),
        };

        let fallback_params = if group_field.is_none() || self.config.use_fallback {
            self.fallback_thresholds(rows, value_field, count_field)?
        } else {
            None
        };

        let mut coverage = CoverageReport::default();
        let mut summary = CategorySummary::default();
        let mut per_group: GroupKeyIndex<GroupCategoryCounts> = GroupKeyIndex::new();
        let mut annotated = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let group_value = group_field.map(|f| row.get_or_null(f));
            let matched = match group_value {
                Some(value) => match index.lookup_value(value) {
                    Some((params, KeyMatch::Exact)) => ParamsMatch::Direct(params),
                    Some((params, KeyMatch::CaseInsensitive | KeyMatch::Numeric)) => {
                        ParamsMatch::Fuzzy(params)
                    }
                    None => match &fallback_params {
                        Some(params) => ParamsMatch::Fallback(params),
                        None => ParamsMatch::Missing,
                    },
                },
                None => match &fallback_params {
                    Some(params) => ParamsMatch::Direct(params),
                    None => ParamsMatch::Missing,
                },
            };

            coverage.total += 1;
            let params = match matched {
                ParamsMatch::Direct(p) => {
                    coverage.direct += 1;
                    Some(p)
                }
                ParamsMatch::Fuzzy(p) => {
                    coverage.fuzzy += 1;
                    Some(p)
                }
                ParamsMatch::Fallback(p) => {
                    coverage.fallback += 1;
                    Some(p)
                }
                ParamsMatch::Missing => {
                    coverage.unknown += 1;
                    None
                }
            };

            let category = match params {
                Some(p) => self.classifier.classify_row(row, p),
                None => Category::Unknown,
            };
            if category == Category::Anomalous {
                coverage.anomalous += 1;
            }
            let group_label = group_value.map(|v| v.to_string()).unwrap_or_default();
            log_row!(
                self.log,
                row = idx,
                group = %truncate_field(&group_label, self.log.max_field_length),
                %category,
                "Classified row"
            );

            *summary.overall.entry(category).or_insert(0) += 1;
            if let Some(value) = group_value {
                *per_group
                    .get_or_insert_with(GroupKey::from_value(value), || GroupCategoryCounts {
                        group: value.to_string(),
                        counts: BTreeMap::new(),
                    })
                    .counts
                    .entry(category)
                    .or_insert(0) += 1;
            }

            annotated.push(
                row.clone()
                    .with(CATEGORY_FIELD, category.as_str())
                    .with(RISK_LEVEL_FIELD, category.risk_level().as_str()),
            );
        }

        summary.by_group = per_group.into_entries().into_iter().map(|(_, c)| c).collect();

        if coverage.fallback > 0 {
            warn!(
                rows = coverage.fallback,
                "Rows classified with dataset-wide fallback thresholds"
            );
        }
        if coverage.unknown > 0 {
            warn!(rows = coverage.unknown, "Rows left unclassified");
        }
        info!(
            total = coverage.total,
            direct = coverage.direct,
            fuzzy = coverage.fuzzy,
            fallback = coverage.fallback,
            anomalous = coverage.anomalous,
            unknown = coverage.unknown,
            "Completed classification"
        );

        Ok(ClassificationOutcome {
            indicators,
            group_field: group_field.map(str::to_string),
            group_params,
            fallback_params,
            rows: annotated,
            coverage,
            summary,
        })
    }

    fn group_thresholds(
        &self,
        rows: &[Row],
        group_field: &str,
        value_field: &str,
        count_field: &str,
    ) -> Result<(GroupKeyIndex<ClassificationParams>, Vec<GroupParams>)> {
        let mut index = GroupKeyIndex::new();
        let mut report = Vec::new();

        for partition in partition_rows(rows, &GroupingConfig::new([group_field])) {
            let group_rows = partition.to_rows();
            let params = match ClassificationParams::compute(
                &group_rows,
                value_field,
                count_field,
                &self.config.method,
            ) {
                Ok(params) => Some(params),
                Err(TierError::InsufficientData { context, .. }) => {
                    warn!(group = %partition.label, %context, "No thresholds for group");
                    None
                }
                Err(e) => return Err(e),
            };
            log_group!(
                self.log,
                group = %truncate_field(&partition.label, self.log.max_field_length),
                rows = partition.len(),
                high_value = ?params.as_ref().map(|p| p.value.high),
                high_count = ?params.as_ref().map(|p| p.count.high),
                "Computed group thresholds"
            );
            if let Some(p) = &params {
                index.insert(partition.key.clone(), p.clone());
            }
            report.push(GroupParams {
                key: partition.key,
                group: partition.label,
                row_count: partition.rows.len(),
                params,
            });
        }

        for (group, params) in &self.supplied_groups {
            let key = GroupKey::from_value(group);
            match report.iter_mut().find(|g| g.key == key) {
                Some(entry) => entry.params = Some(params.clone()),
                None => report.push(GroupParams {
                    key: key.clone(),
                    group: group.to_string(),
                    row_count: 0,
                    params: Some(params.clone()),
                }),
            }
            index.insert(key, params.clone());
        }

        Ok((index, report))
    }

    fn fallback_thresholds(
        &self,
        rows: &[Row],
        value_field: &str,
        count_field: &str,
    ) -> Result<Option<ClassificationParams>> {
        if let Some(params) = &self.supplied_fallback {
            return Ok(Some(params.clone()));
        }
        match ClassificationParams::compute(rows, value_field, count_field, &self.config.method) {
            Ok(params) => Ok(Some(params)),
            Err(TierError::InsufficientData { context, .. }) => {
                warn!(%context, "No dataset-wide thresholds");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
