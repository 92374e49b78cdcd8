//! Per-field and per-group normality test battery.
//!
//! [`NormalityTestSuite`] runs the Kolmogorov–Smirnov, Anderson–Darling and
//! Z-score tests on every selected field, reports skewness and kurtosis, and
//! tries to identify a distribution family when both KS and Z-score reject
//! normality. Large fields are down-sampled once, so all tests see the same
//! values.
//!
//! # Example
//!
//! ```rust
//! use tier_guard::statistics::NormalityTestSuite;
//!
//! let suite = NormalityTestSuite::new();
//! let result = suite.test_field("flat", &[5.0, 5.0, 5.0, 5.0, 5.0]);
//! assert!(result.is_normal);
//! assert_eq!(result.skewness, 0.0);
//! assert!(result.ks.interpretation.contains("all values identical"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use super::descriptive;
use super::distribution::DistributionFit;
use super::normality::{
    AndersonDarlingTest, KolmogorovSmirnovTest, NormalityTest, Sample, TestOutcome, ZScoreTest,
};
use super::sampling::{Sampler, DEFAULT_MAX_SAMPLE_SIZE};
use crate::analyzers::grouped::{partition_rows, GroupingConfig};
use crate::analyzers::inference::ColumnTypeDetector;
use crate::core::{numeric_column, CancellationToken, GroupKey, Row};
use crate::error::{Result, TierError};

/// Configuration of the normality stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalityConfig {
    /// Run the stage at all (default: true)
    pub enabled: bool,
    /// Fields to test; empty selects every numeric column
    pub fields: Vec<String>,
    /// Run the battery separately per value of this field
    pub group_field: Option<String>,
    /// Values beyond this are down-sampled (default: 5000)
    pub max_sample_size: usize,
    /// Seed for reproducible down-sampling
    pub seed: Option<u64>,
}

impl Default for NormalityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fields: Vec::new(),
            group_field: None,
            max_sample_size: DEFAULT_MAX_SAMPLE_SIZE,
            seed: None,
        }
    }
}

/// Test results for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTestResult {
    pub field_name: String,
    /// Values the tests saw, after down-sampling.
    pub sample_size: usize,
    /// Finite values found before down-sampling.
    pub original_size: usize,
    pub skewness: f64,
    pub kurtosis: f64,
    pub ks: TestOutcome,
    pub anderson_darling: TestOutcome,
    pub z_score: TestOutcome,
    /// Majority verdict of the computed tests.
    pub is_normal: bool,
    pub distribution: Option<DistributionFit>,
}

impl FieldTestResult {
    fn outcomes(&self) -> [&TestOutcome; 3] {
        [&self.ks, &self.anderson_darling, &self.z_score]
    }

    /// Number of tests that produced a statistic.
    pub fn computed_tests(&self) -> usize {
        self.outcomes().iter().filter(|o| o.is_computed()).count()
    }

    /// Label of the identified distribution family, if one was fitted.
    pub fn distribution_label(&self) -> Option<&'static str> {
        self.distribution.as_ref().map(|d| d.best_fit.as_str())
    }
}

/// Counts of normal and non-normal fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub total_fields: usize,
    pub normal_fields: usize,
    pub non_normal_fields: usize,
    /// Most frequent distribution among non-normal fields.
    pub most_common_distribution: Option<String>,
}

impl TestSummary {
    /// Summarizes a set of field results.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a FieldTestResult>) -> Self {
        let mut summary = Self::default();
        let mut labels: Vec<&'static str> = Vec::new();
        for result in results {
            summary.total_fields += 1;
            if result.is_normal {
                summary.normal_fields += 1;
            } else {
                summary.non_normal_fields += 1;
                labels.extend(result.distribution_label());
            }
        }
        summary.most_common_distribution = most_common(labels);
        summary
    }
}

/// Most frequent label; ties go to the lexicographically smallest.
fn most_common(labels: Vec<&'static str>) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_label, a_count), (b_label, b_count)| {
            a_count.cmp(b_count).then_with(|| b_label.cmp(a_label))
        })
        .map(|(label, _)| label.to_string())
}

/// Results for one group of a grouped run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTestResults {
    /// Canonical group key.
    pub key: GroupKey,
    /// Group value as first seen.
    pub group: String,
    pub row_count: usize,
    pub results: Vec<FieldTestResult>,
    pub summary: TestSummary,
}

/// Output of the normality stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NormalityTestResults {
    Ungrouped {
        results: Vec<FieldTestResult>,
        summary: TestSummary,
    },
    Grouped {
        group_field: String,
        group_results: Vec<GroupTestResults>,
        overall_summary: TestSummary,
    },
}

impl NormalityTestResults {
    /// The run-wide summary.
    pub fn summary(&self) -> &TestSummary {
        match self {
            Self::Ungrouped { summary, .. } => summary,
            Self::Grouped {
                overall_summary, ..
            } => overall_summary,
        }
    }
}

/// Runs the normality battery over fields of a dataset.
#[derive(Debug, Clone)]
pub struct NormalityTestSuite {
    config: NormalityConfig,
    detector: ColumnTypeDetector,
    cancellation: Option<CancellationToken>,
}

impl Default for NormalityTestSuite {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalityTestSuite {
    /// Creates a suite with default configuration.
    pub fn new() -> Self {
        Self::with_config(NormalityConfig::default())
    }

    pub fn with_config(config: NormalityConfig) -> Self {
        Self {
            config,
            detector: ColumnTypeDetector::new(),
            cancellation: None,
        }
    }

    /// Uses `detector` to choose fields when none are configured.
    pub fn with_detector(mut self, detector: ColumnTypeDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Checks `token` between fields and groups.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &NormalityConfig {
        &self.config
    }

    /// Tests one field's values.
    pub fn test_field(&self, name: &str, values: &[f64]) -> FieldTestResult {
        let finite = descriptive::finite_values(values);
        let original_size = finite.len();
        let values = Sampler::new(self.config.max_sample_size, self.config.seed).sample(finite);
        let sample = Sample::new(&values);

        let moments = descriptive::moments(sample.sorted());
        let ks = KolmogorovSmirnovTest.evaluate(&sample);
        let anderson_darling = AndersonDarlingTest.evaluate(&sample);
        let z_score = ZScoreTest.evaluate(&sample);

        let distribution = if ks.rejects() && z_score.rejects() {
            Some(DistributionFit::identify(sample.sorted()))
        } else {
            None
        };

        let mut result = FieldTestResult {
            field_name: name.to_string(),
            sample_size: sample.len(),
            original_size,
            skewness: moments.skewness,
            kurtosis: moments.kurtosis,
            ks,
            anderson_darling,
            z_score,
            is_normal: true,
            distribution,
        };
        result.is_normal = majority_normal(&result);

        debug!(
            field = %name,
            n = result.sample_size,
            is_normal = result.is_normal,
            distribution = ?result.distribution_label(),
            "Tested field"
        );
        result
    }

    /// Tests each field over the whole dataset.
    ///
    /// With an empty `fields` list, the configured fields are used, or else
    /// every number and percentage column.
    ///
    /// # Errors
    ///
    /// [`TierError::ColumnNotFound`] for an explicit field missing from the
    /// first row; [`TierError::Cancelled`] if the token fires between fields.
    #[instrument(skip(self, rows, fields), fields(rows = rows.len()))]
    pub fn run(&self, rows: &[Row], fields: &[String]) -> Result<NormalityTestResults> {
        let fields = self.select_fields(rows, fields, None)?;
        let results = self.test_fields(rows, &fields)?;
        let summary = TestSummary::from_results(&results);
        info!(
            fields = summary.total_fields,
            normal = summary.normal_fields,
            non_normal = summary.non_normal_fields,
            "Completed normality tests"
        );
        Ok(NormalityTestResults::Ungrouped { results, summary })
    }

    /// Tests each field separately within every group of `group_field`.
    ///
    /// Groups are keyed canonically, so `1` and `"1"` share a group, and are
    /// reported in order of first appearance.
    #[instrument(skip(self, rows, fields), fields(rows = rows.len()))]
    pub fn run_grouped(
        &self,
        rows: &[Row],
        fields: &[String],
        group_field: &str,
    ) -> Result<NormalityTestResults> {
        if let Some(first) = rows.first() {
            if !first.contains(group_field) {
                return Err(TierError::column_not_found(group_field));
            }
        }
        let fields = self.select_fields(rows, fields, Some(group_field))?;
        let partitions = partition_rows(rows, &GroupingConfig::new([group_field]));

        let mut group_results = Vec::with_capacity(partitions.len());
        for partition in partitions {
            self.check_cancelled()?;
            let group_rows = partition.to_rows();
            let results = self.test_fields(&group_rows, &fields)?;
            let summary = TestSummary::from_results(&results);
            debug!(
                group = %partition.label,
                rows = partition.len(),
                normal = summary.normal_fields,
                "Tested group"
            );
            group_results.push(GroupTestResults {
                key: partition.key,
                group: partition.label,
                row_count: group_rows.len(),
                results,
                summary,
            });
        }

        let overall_summary = overall_summary(&group_results);
        info!(
            groups = group_results.len(),
            fields = overall_summary.total_fields,
            normal = overall_summary.normal_fields,
            "Completed grouped normality tests"
        );
        Ok(NormalityTestResults::Grouped {
            group_field: group_field.to_string(),
            group_results,
            overall_summary,
        })
    }

    fn test_fields(&self, rows: &[Row], fields: &[String]) -> Result<Vec<FieldTestResult>> {
        fields
            .iter()
            .map(|field| {
                self.check_cancelled()?;
                Ok(self.test_field(field, &numeric_column(rows, field)))
            })
            .collect()
    }

    fn select_fields(
        &self,
        rows: &[Row],
        fields: &[String],
        group_field: Option<&str>,
    ) -> Result<Vec<String>> {
        let explicit = if fields.is_empty() {
            &self.config.fields
        } else {
            fields
        };

        if !explicit.is_empty() {
            if let Some(first) = rows.first() {
                if let Some(missing) = explicit.iter().find(|f| !first.contains(f)) {
                    return Err(TierError::column_not_found(missing.as_str()));
                }
            }
            return Ok(explicit.to_vec());
        }

        let detected = self
            .detector
            .detect(rows)
            .numeric_columns()
            .into_iter()
            .filter(|c| Some(c.as_str()) != group_field)
            .collect();
        Ok(detected)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancellation {
            Some(token) => token.check("normality tests"),
            None => Ok(()),
        }
    }
}

/// Normal when at least half of the computed tests accept; with no computed
/// tests the field is reported normal.
fn majority_normal(result: &FieldTestResult) -> bool {
    let computed = result.computed_tests();
    let accepting = result
        .outcomes()
        .iter()
        .filter(|o| o.is_computed() && o.is_normal)
        .count();
    computed == 0 || accepting * 2 >= computed
}

/// Counts add up across groups; the distribution label is recomputed over
/// every non-normal field of the run.
fn overall_summary(groups: &[GroupTestResults]) -> TestSummary {
    TestSummary::from_results(groups.iter().flat_map(|g| g.results.iter()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::statistics::normality::TestStatus;

    #[test]
    fn test_identical_values_field() {
        let result = NormalityTestSuite::new().test_field("v", &[5.0; 5]);
        assert_eq!(result.skewness, 0.0);
        assert_eq!(result.kurtosis, 0.0);
        for outcome in result.outcomes() {
            assert!(outcome.is_normal);
            assert_eq!(outcome.status, TestStatus::Degenerate);
            assert!(outcome.interpretation.contains("all values identical"));
        }
        assert!(result.is_normal);
        assert!(result.distribution.is_none());
    }

    #[test]
    fn test_empty_field_is_inconclusive_normal() {
        let result = NormalityTestSuite::new().test_field("v", &[]);
        assert_eq!(result.sample_size, 0);
        assert_eq!(result.computed_tests(), 0);
        assert!(result.is_normal);
    }

    #[test]
    fn test_skewed_field_gets_distribution_fit() {
        let values: Vec<f64> = (1..=60).map(|i| (f64::from(i) / 6.0).exp()).collect();
        let result = NormalityTestSuite::new().test_field("revenue", &values);
        assert!(!result.is_normal);
        assert!(result.ks.rejects());
        assert!(result.z_score.rejects());
        assert!(result.distribution.is_some());
    }

    #[test]
    fn test_down_sampling_caps_sample() {
        let config = NormalityConfig {
            max_sample_size: 100,
            seed: Some(3),
            ..Default::default()
        };
        let values: Vec<f64> = (0..1000).map(f64::from).collect();
        let result = NormalityTestSuite::with_config(config).test_field("v", &values);
        assert_eq!(result.sample_size, 100);
        assert_eq!(result.original_size, 1000);
    }

    #[test]
    fn test_most_common_tie_breaks_lexicographically() {
        assert_eq!(
            most_common(vec!["poisson", "gamma", "poisson", "gamma"]),
            Some("gamma".to_string())
        );
        assert_eq!(most_common(vec![]), None);
    }

    #[test]
    fn test_run_selects_numeric_columns() {
        let rows: Vec<Row> = (0..10)
            .map(|i| row! { "name" => format!("n{i}"), "v" => i, "w" => i * 2 })
            .collect();
        let results = NormalityTestSuite::new().run(&rows, &[]).unwrap();
        match results {
            NormalityTestResults::Ungrouped { results, summary } => {
                let names: Vec<_> = results.iter().map(|r| r.field_name.as_str()).collect();
                assert_eq!(names, vec!["v", "w"]);
                assert_eq!(summary.total_fields, 2);
            }
            other => panic!("expected ungrouped results, got {other:?}"),
        }
    }

    #[test]
    fn test_run_rejects_missing_field() {
        let rows = vec![row! { "v" => 1 }];
        let err = NormalityTestSuite::new()
            .run(&rows, &["missing".to_string()])
            .unwrap_err();
        assert!(matches!(err, TierError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_cancelled_run() {
        let token = CancellationToken::new();
        token.cancel();
        let rows = vec![row! { "v" => 1 }];
        let err = NormalityTestSuite::new()
            .with_cancellation(token)
            .run(&rows, &["v".to_string()])
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
