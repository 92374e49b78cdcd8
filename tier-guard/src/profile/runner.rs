//! End-to-end profiling pipeline, synchronous or on a background thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use super::orchestrator::{ClassificationOutcome, ProfileOrchestrator};
use crate::analyzers::aggregation::AggregationEngine;
use crate::analyzers::inference::{ColumnTypeDetector, ColumnTypeReport};
use crate::classification::{ConventionResolver, IndicatorResolver};
use crate::config::ProfileConfig;
use crate::core::{CancellationToken, Row};
use crate::error::Result;
use crate::logging::LogConfig;
use crate::statistics::{NormalityTestResults, NormalityTestSuite};

/// Type alias for progress callback function.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

const STAGES: f64 = 4.0;

/// Everything one profiling run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    /// Column types of the input rows.
    pub column_types: ColumnTypeReport,
    pub aggregated_rows: Vec<Row>,
    /// `None` when the normality stage is disabled.
    pub normality: Option<NormalityTestResults>,
    pub classification: ClassificationOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProfileReport {
    /// Wall-clock duration of the run.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Runs column typing, aggregation, normality testing and classification.
///
/// # Example
///
/// ```rust
/// use tier_guard::config::ProfileConfig;
/// use tier_guard::profile::ProfileRunner;
/// use tier_guard::row;
///
/// let rows: Vec<_> = (1..=12)
///     .map(|i| row! { "customer" => format!("c{}", i % 4), "amount" => i * 10 })
///     .collect();
/// let config = ProfileConfig::from_json_str(
///     r#"{ "aggregation": { "group_by": ["customer"], "sum_columns": ["amount"] } }"#,
/// )
/// .unwrap();
///
/// let report = ProfileRunner::new(config).run(&rows).unwrap();
/// assert_eq!(report.aggregated_rows.len(), 4);
/// assert_eq!(report.classification.indicators.value.field, "amount_sum");
/// ```
#[derive(Clone)]
pub struct ProfileRunner {
    config: ProfileConfig,
    resolver: Arc<dyn IndicatorResolver>,
    cancellation: CancellationToken,
    on_progress: Option<ProgressCallback>,
    log: LogConfig,
}

impl ProfileRunner {
    /// Creates a runner with the [`ConventionResolver`].
    pub fn new(config: ProfileConfig) -> Self {
        Self {
            config,
            resolver: Arc::new(ConventionResolver::new()),
            cancellation: CancellationToken::new(),
            on_progress: None,
            log: LogConfig::default(),
        }
    }

    /// Replaces the indicator resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn IndicatorResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets per-row and per-group logging detail.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Shares `token` with the run, for cancellation from the caller.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Sets a progress callback that will be called after each stage.
    ///
    /// The callback receives a float between 0.0 and 1.0 indicating progress.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// The token checked between stages.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Runs the pipeline on the current thread.
    ///
    /// # Errors
    ///
    /// Configuration errors, missing columns, or [`crate::TierError::Cancelled`]
    /// when the token fires between stages.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn run(&self, rows: &[Row]) -> Result<ProfileReport> {
        self.config.validate()?;
        let started_at = Utc::now();
        info!("Starting profiling run");

        self.cancellation.check("column typing")?;
        let detector = ColumnTypeDetector::with_config(self.config.column_types.clone());
        let column_types = detector.detect(rows);
        self.report_progress(1.0);

        self.cancellation.check("aggregation")?;
        let aggregated_rows = AggregationEngine::new().aggregate(rows, &self.config.aggregation)?;
        self.report_progress(2.0);

        self.cancellation.check("normality tests")?;
        let normality = if self.config.normality.enabled {
            let suite = NormalityTestSuite::with_config(self.config.normality.clone())
                .with_detector(detector)
                .with_cancellation(self.cancellation.clone());
            let fields = &self.config.normality.fields;
            let results = match &self.config.normality.group_field {
                Some(group_field) => suite.run_grouped(&aggregated_rows, fields, group_field)?,
                None => suite.run(&aggregated_rows, fields)?,
            };
            Some(results)
        } else {
            debug!("Normality stage disabled");
            None
        };
        self.report_progress(3.0);

        self.cancellation.check("classification")?;
        let classification = ProfileOrchestrator::with_resolver(
            self.config.classification.clone(),
            self.resolver.clone(),
        )
        .with_log_config(self.log.clone())
        .classify(&aggregated_rows)?;
        self.report_progress(4.0);

        let finished_at = Utc::now();
        info!(
            input_rows = rows.len(),
            aggregated_rows = aggregated_rows.len(),
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "Profiling run completed"
        );

        Ok(ProfileReport {
            column_types,
            aggregated_rows,
            normality,
            classification,
            started_at,
            finished_at,
        })
    }

    /// Moves the pipeline onto tokio's blocking pool.
    ///
    /// Must be called from within a tokio runtime. The report is delivered
    /// whole through [`RunHandle::join`].
    pub fn spawn(self, rows: Vec<Row>) -> RunHandle {
        let token = self.cancellation.clone();
        let handle = tokio::task::spawn_blocking(move || self.run(&rows));
        RunHandle { handle, token }
    }

    fn report_progress(&self, completed_stages: f64) {
        if let Some(callback) = &self.on_progress {
            callback(completed_stages / STAGES);
        }
    }
}

impl std::fmt::Debug for ProfileRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileRunner")
            .field("config", &self.config)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

/// Handle to a background profiling run.
#[derive(Debug)]
pub struct RunHandle {
    handle: JoinHandle<Result<ProfileReport>>,
    token: CancellationToken,
}

impl RunHandle {
    /// Requests cancellation; the run stops at its next check.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the run to finish.
    pub async fn join(self) -> Result<ProfileReport> {
        self.handle.await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use std::sync::Mutex;

    fn rows() -> Vec<Row> {
        (0..20)
            .map(|i| row! { "store" => format!("s{}", i % 5), "sales" => i * 3, "qty" => i % 4 })
            .collect()
    }

    fn config() -> ProfileConfig {
        let mut config = ProfileConfig::default();
        config.aggregation.group_by = vec!["store".into()];
        config.aggregation.sum_columns = vec!["sales".into(), "qty".into()];
        config
    }

    #[test]
    fn test_run_produces_report() {
        let report = ProfileRunner::new(config()).run(&rows()).unwrap();
        assert_eq!(report.aggregated_rows.len(), 5);
        assert_eq!(report.classification.rows.len(), 5);
        assert!(report.normality.is_some());
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_progress_reported_per_stage() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ProfileRunner::new(config())
            .on_progress(move |p| sink.lock().unwrap().push(p))
            .run(&rows())
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let runner = ProfileRunner::new(config());
        runner.cancellation_token().cancel();
        let err = runner.run(&rows()).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_spawned_run() {
        let handle = ProfileRunner::new(config()).spawn(rows());
        let report = handle.join().await.unwrap();
        assert_eq!(report.aggregated_rows.len(), 5);
    }
}
