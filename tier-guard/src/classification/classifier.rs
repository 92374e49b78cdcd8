//! Threshold-based assignment of behavior categories.
//!
//! A row is placed by comparing its value and count indicators against the
//! thresholds of its group. The first matching rule wins:
//!
//! | rule | value | count | category |
//! |---|---|---|---|
//! | 1 | `v ≥ high_v` | `c ≥ high_c` | double-high |
//! | 2 | `v ≥ high_v` | `c < high_c` | high-on-value-field |
//! | 3 | `v < high_v` | `c ≥ high_c` | high-on-count-field |
//! | 4 | `low_v < v < high_v` | `low_c < c < high_c` | middle |
//! | 5 | otherwise | | low |
//!
//! Rows whose indicators are not numeric are `anomalous` and logged.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use super::thresholds::ClassificationParams;
use crate::core::{Row, Value};

/// Behavior category of a classified row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    DoubleHigh,
    HighOnValueField,
    HighOnCountField,
    Middle,
    Low,
    /// Indicator values could not be read as numbers.
    Anomalous,
    /// No thresholds were available for the row's group.
    Unknown,
}

impl Category {
    /// Every category, in report order.
    pub const ALL: [Category; 7] = [
        Category::DoubleHigh,
        Category::HighOnValueField,
        Category::HighOnCountField,
        Category::Middle,
        Category::Low,
        Category::Anomalous,
        Category::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DoubleHigh => "double-high",
            Self::HighOnValueField => "high-on-value-field",
            Self::HighOnCountField => "high-on-count-field",
            Self::Middle => "middle",
            Self::Low => "low",
            Self::Anomalous => "anomalous",
            Self::Unknown => "unknown",
        }
    }

    /// Risk level paired with the category.
    pub fn risk_level(self) -> RiskLevel {
        match self {
            Self::DoubleHigh | Self::HighOnValueField | Self::HighOnCountField => RiskLevel::High,
            Self::Middle | Self::Low => RiskLevel::Low,
            Self::Anomalous => RiskLevel::Medium,
            Self::Unknown => RiskLevel::Unknown,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless classifier applying [`ClassificationParams`] to rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdClassifier;

impl ThresholdClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classifies numeric indicator values.
    pub fn classify(&self, value: f64, count: f64, params: &ClassificationParams) -> Category {
        if !value.is_finite() || !count.is_finite() {
            return anomalous(&value, &count, params);
        }
        let (v, c) = (&params.value, &params.count);
        let high_value = value >= v.high;
        let high_count = count >= c.high;

        if high_value && high_count {
            Category::DoubleHigh
        } else if high_value {
            Category::HighOnValueField
        } else if high_count {
            Category::HighOnCountField
        } else if value > v.low && count > c.low {
            Category::Middle
        } else {
            Category::Low
        }
    }

    /// Classifies raw cell values, coercing them leniently.
    pub fn classify_values(
        &self,
        value: &Value,
        count: &Value,
        params: &ClassificationParams,
    ) -> Category {
        match (value.to_number_lenient(), count.to_number_lenient()) {
            (Some(v), Some(c)) => self.classify(v, c, params),
            _ => anomalous(value, count, params),
        }
    }

    /// Classifies a row by the indicator fields named in `params`.
    pub fn classify_row(&self, row: &Row, params: &ClassificationParams) -> Category {
        self.classify_values(
            row.get_or_null(&params.value.field),
            row.get_or_null(&params.count.field),
            params,
        )
    }
}

fn anomalous(
    value: &dyn fmt::Display,
    count: &dyn fmt::Display,
    params: &ClassificationParams,
) -> Category {
    warn!(
        value_field = %params.value.field,
        value = %value,
        count_field = %params.count.field,
        count = %count,
        "Non-numeric indicator, row marked anomalous"
    );
    Category::Anomalous
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::thresholds::{ClassificationMethod, IndicatorStats, IndicatorThresholds};
    use crate::row;
    use std::sync::{Arc, Mutex};

    fn thresholds(field: &str, low: f64, high: f64) -> IndicatorThresholds {
        IndicatorThresholds {
            field: field.to_string(),
            sample_size: 10,
            stats: IndicatorStats::Moments {
                mean: (low + high) / 2.0,
                std_dev: 1.0,
            },
            high,
            low,
        }
    }

    fn params() -> ClassificationParams {
        ClassificationParams {
            method: ClassificationMethod::Iqr,
            upper_multiplier: 1.5,
            lower_multiplier: 1.5,
            value: thresholds("amount_sum", -20.0, 60.0),
            count: thresholds("_count", 0.0, 10.0),
        }
    }

    #[test]
    fn test_rule_order() {
        let c = ThresholdClassifier::new();
        let p = params();
        assert_eq!(c.classify(65.0, 12.0, &p), Category::DoubleHigh);
        assert_eq!(c.classify(65.0, 3.0, &p), Category::HighOnValueField);
        assert_eq!(c.classify(10.0, 12.0, &p), Category::HighOnCountField);
        assert_eq!(c.classify(10.0, 3.0, &p), Category::Middle);
        assert_eq!(c.classify(-30.0, 3.0, &p), Category::Low);
    }

    #[test]
    fn test_boundaries() {
        let c = ThresholdClassifier::new();
        let p = params();
        // Equal to high counts as high
        assert_eq!(c.classify(60.0, 10.0, &p), Category::DoubleHigh);
        assert_eq!(c.classify(60.0, 9.99, &p), Category::HighOnValueField);
        // Equal to low is not middle
        assert_eq!(c.classify(-20.0, 5.0, &p), Category::Low);
        assert_eq!(c.classify(5.0, 0.0, &p), Category::Low);
        assert_eq!(c.classify(-19.99, 0.01, &p), Category::Middle);
    }

    #[test]
    fn test_non_numeric_is_anomalous() {
        let c = ThresholdClassifier::new();
        let p = params();
        let row = row! { "amount_sum" => "n/a", "_count" => 3 };
        assert_eq!(c.classify_row(&row, &p), Category::Anomalous);
        let row = row! { "amount_sum" => 5 };
        assert_eq!(c.classify_row(&row, &p), Category::Anomalous);
        assert_eq!(c.classify(f64::NAN, 1.0, &p), Category::Anomalous);
        assert_eq!(Category::Anomalous.risk_level(), RiskLevel::Medium);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_every_anomalous_path_warns() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let c = ThresholdClassifier::new();
        let p = params();
        tracing::subscriber::with_default(subscriber, || {
            assert_eq!(c.classify(f64::NAN, 1.0, &p), Category::Anomalous);
            assert_eq!(c.classify(1.0, f64::INFINITY, &p), Category::Anomalous);
            let row = row! { "amount_sum" => "n/a", "_count" => 3 };
            assert_eq!(c.classify_row(&row, &p), Category::Anomalous);
            assert_eq!(c.classify(10.0, 3.0, &p), Category::Middle);
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("row marked anomalous").count(), 3);
        assert!(output.contains("value=NaN"));
        assert!(output.contains("count=inf"));
        assert!(output.contains("value=n/a"));
    }

    #[test]
    fn test_lenient_coercion_of_text_numbers() {
        let c = ThresholdClassifier::new();
        let row = row! { "amount_sum" => "1,000", "_count" => "12" };
        assert_eq!(c.classify_row(&row, &params()), Category::DoubleHigh);
    }

    #[test]
    fn test_category_labels_and_risk() {
        assert_eq!(
            serde_json::to_string(&Category::HighOnValueField).unwrap(),
            "\"high-on-value-field\""
        );
        assert_eq!(Category::DoubleHigh.risk_level(), RiskLevel::High);
        assert_eq!(Category::Middle.risk_level(), RiskLevel::Low);
        assert_eq!(Category::Unknown.risk_level(), RiskLevel::Unknown);
        assert_eq!(RiskLevel::Medium.to_string(), "medium");
    }
}
