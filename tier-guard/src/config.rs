//! Configuration of a profiling run.
//!
//! Every section is optional in JSON and falls back to its defaults:
//!
//! ```json
//! {
//!   "aggregation": { "group_by": ["customer"], "sum_columns": ["amount"] },
//!   "column_types": { "numeric_ratio": 0.8 },
//!   "normality": { "enabled": true, "max_sample_size": 5000, "seed": 7 },
//!   "classification": {
//!     "method": { "method": "iqr", "upper_multiplier": 1.5, "lower_multiplier": 1.5 },
//!     "group_field": "region",
//!     "use_fallback": true
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::analyzers::aggregation::AggregationConfig;
use crate::analyzers::inference::DetectorConfig;
use crate::error::{Result, TierError};
use crate::profile::ClassificationConfig;
use crate::statistics::NormalityConfig;

/// Smallest sample cap; below it the Z-score test could never run.
const MIN_SAMPLE_CAP: usize = 8;

/// All settings of one profiling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub aggregation: AggregationConfig,
    pub column_types: DetectorConfig,
    pub normality: NormalityConfig,
    pub classification: ClassificationConfig,
}

impl ProfileConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading profile configuration");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.classification.method.validate()?;

        let ratio = self.column_types.numeric_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(TierError::configuration(format!(
                "column_types.numeric_ratio must be in (0, 1], got {ratio}"
            )));
        }

        if self.normality.max_sample_size < MIN_SAMPLE_CAP {
            return Err(TierError::configuration(format!(
                "normality.max_sample_size must be at least {MIN_SAMPLE_CAP}, got {}",
                self.normality.max_sample_size
            )));
        }

        for (name, field) in [
            ("classification.value_field", &self.classification.value_field),
            ("classification.count_field", &self.classification.count_field),
            ("classification.group_field", &self.classification.group_field),
            ("normality.group_field", &self.normality.group_field),
        ] {
            if field.as_deref().is_some_and(|f| f.trim().is_empty()) {
                return Err(TierError::configuration(format!("{name} must not be empty")));
            }
        }

        let aggregation = &self.aggregation;
        for (name, fields) in [
            ("aggregation.group_by", &aggregation.group_by),
            ("aggregation.sum_columns", &aggregation.sum_columns),
            ("aggregation.count_columns", &aggregation.count_columns),
            ("aggregation.max_columns", &aggregation.max_columns),
            ("aggregation.min_columns", &aggregation.min_columns),
            ("aggregation.distinct_columns", &aggregation.distinct_columns),
            ("normality.fields", &self.normality.fields),
        ] {
            if let Some(pos) = fields.iter().position(|f| f.trim().is_empty()) {
                return Err(TierError::configuration(format!(
                    "{name}[{pos}] must not be empty"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{ClassificationMethod, MethodConfig};
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ProfileConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ProfileConfig::default());
        assert!(config.normality.enabled);
        assert_eq!(config.normality.max_sample_size, 5000);
        assert_eq!(config.classification.method, MethodConfig::iqr());
        assert!(config.classification.use_fallback);
    }

    #[test]
    fn test_partial_sections() {
        let config = ProfileConfig::from_json_str(
            r#"{
                "aggregation": { "group_by": ["g"], "sum_columns": ["v"] },
                "classification": { "method": { "method": "stddev" }, "group_field": "region" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.aggregation.group_by, vec!["g"]);
        assert_eq!(config.classification.method.method, ClassificationMethod::StdDev);
        assert_eq!(config.classification.method.upper_multiplier, 2.0);
        assert_eq!(config.classification.group_field.as_deref(), Some("region"));
    }

    #[test]
    fn test_validation_errors() {
        let bad = [
            r#"{ "column_types": { "numeric_ratio": 0.0 } }"#,
            r#"{ "normality": { "max_sample_size": 3 } }"#,
            r#"{ "classification": { "method": { "method": "iqr", "upper_multiplier": -1 } } }"#,
            r#"{ "classification": { "value_field": " " } }"#,
            r#"{ "aggregation": { "group_by": ["region", ""] } }"#,
            r#"{ "aggregation": { "group_by": ["g"], "distinct_columns": ["  "] } }"#,
            r#"{ "normality": { "fields": ["amount", "\t"] } }"#,
        ];
        for json in bad {
            let err = ProfileConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, TierError::Configuration(_)), "{json}: {err}");
        }
    }

    #[test]
    fn test_blank_list_entry_is_named() {
        let err = ProfileConfig::from_json_str(r#"{ "aggregation": { "sum_columns": ["v", " "] } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("aggregation.sum_columns[1]"), "{err}");
    }

    #[test]
    fn test_malformed_json() {
        let err = ProfileConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, TierError::Serialization(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "normality": {{ "seed": 11 }} }}"#).unwrap();
        let config = ProfileConfig::from_path(file.path()).unwrap();
        assert_eq!(config.normality.seed, Some(11));

        let err = ProfileConfig::from_path("/nonexistent/tier-guard.json").unwrap_err();
        assert!(matches!(err, TierError::Io(_)));
    }
}
