//! Pipeline orchestration.
//!
//! [`ProfileOrchestrator`] classifies aggregated rows with per-group
//! thresholds; [`ProfileRunner`] chains every stage into a [`ProfileReport`]
//! and can run it on a background thread.

pub mod orchestrator;
pub mod runner;

pub use orchestrator::{
    CategorySummary, ClassificationConfig, ClassificationOutcome, CoverageReport,
    GroupCategoryCounts, GroupParams, ProfileOrchestrator, CATEGORY_FIELD, RISK_LEVEL_FIELD,
};
pub use runner::{ProfileReport, ProfileRunner, ProgressCallback, RunHandle};
