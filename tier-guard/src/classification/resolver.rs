//! Choosing which columns act as the value and count indicators.
//!
//! An explicitly configured field always wins and is never replaced, even
//! when it is missing from the data (that is an error). Otherwise
//! [`ConventionResolver`] looks for aggregation suffixes, then name keywords,
//! then falls back to column position.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::aggregation::{suffix, GROUP_COUNT_FIELD};
use crate::analyzers::inference::ColumnTypeDetector;
use crate::core::{column_names, Row};
use crate::error::{Result, TierError};

static VALUE_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)(amount|value|revenue|sales|price|total|spend|gmv|金额|销售额)")
        .expect("Hard-coded regex pattern should be valid")
});

static COUNT_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)(count|cnt|qty|quantity|times|frequency|orders|visits|次数|数量)")
        .expect("Hard-coded regex pattern should be valid")
});

/// How an indicator field was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Named in configuration.
    Explicit,
    /// Matched an aggregation column suffix such as `_sum` or `_count`.
    Suffix,
    /// Column name contains a value- or count-like keyword.
    Keyword,
    /// First or second numeric column.
    Position,
}

/// A resolved indicator field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub field: String,
    pub source: ResolutionSource,
}

impl ResolvedField {
    fn new(field: impl Into<String>, source: ResolutionSource) -> Self {
        Self {
            field: field.into(),
            source,
        }
    }
}

/// The value and count indicators of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorFields {
    pub value: ResolvedField,
    pub count: ResolvedField,
}

/// Chooses the value and count indicator fields of a dataset.
pub trait IndicatorResolver: Send + Sync {
    /// Resolves both indicators. Explicit fields take precedence.
    ///
    /// # Errors
    ///
    /// [`TierError::ColumnNotFound`] for an explicit field absent from the
    /// data; [`TierError::Configuration`] when no candidate exists.
    fn resolve(
        &self,
        rows: &[Row],
        value_field: Option<&str>,
        count_field: Option<&str>,
    ) -> Result<IndicatorFields>;
}

/// Resolves indicators from explicit configuration, then naming conventions,
/// then column position.
#[derive(Debug, Clone, Default)]
pub struct ConventionResolver {
    detector: ColumnTypeDetector,
}

impl ConventionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `detector` to decide which columns are numeric.
    pub fn with_detector(detector: ColumnTypeDetector) -> Self {
        Self { detector }
    }

    /// Never picks `count`, the explicitly configured count field.
    fn value_by_convention(numeric: &[String], count: Option<&str>) -> Option<ResolvedField> {
        let candidates = || numeric.iter().filter(move |c| Some(c.as_str()) != count);

        candidates()
            .find(|c| c.ends_with(suffix::SUM))
            .map(|c| ResolvedField::new(c.as_str(), ResolutionSource::Suffix))
            .or_else(|| {
                candidates()
                    .find(|c| VALUE_KEYWORDS.is_match(c))
                    .map(|c| ResolvedField::new(c.as_str(), ResolutionSource::Keyword))
            })
    }

    fn count_by_convention(numeric: &[String], value: &str) -> Option<ResolvedField> {
        let candidates = || others(numeric, value);

        // `<base>_sum` pairs with `<base>_count`
        let paired = value
            .strip_suffix(suffix::SUM)
            .map(|base| format!("{base}{}", suffix::COUNT));

        let by_suffix = paired
            .and_then(|p| candidates().find(|c| **c == p))
            .or_else(|| {
                candidates().find(|c| {
                    c.ends_with(suffix::COUNT)
                        && !c.ends_with(suffix::DISTINCT_COUNT)
                        && c.as_str() != GROUP_COUNT_FIELD
                })
            })
            .or_else(|| candidates().find(|c| c.as_str() == GROUP_COUNT_FIELD));

        by_suffix
            .map(|c| ResolvedField::new(c.as_str(), ResolutionSource::Suffix))
            .or_else(|| {
                candidates()
                    .find(|c| COUNT_KEYWORDS.is_match(c))
                    .map(|c| ResolvedField::new(c.as_str(), ResolutionSource::Keyword))
            })
    }
}

fn others<'a>(numeric: &'a [String], exclude: &'a str) -> impl Iterator<Item = &'a String> + 'a {
    numeric.iter().filter(move |c| c.as_str() != exclude)
}

fn explicit(columns: &[String], field: &str) -> Result<ResolvedField> {
    if columns.iter().any(|c| c == field) {
        Ok(ResolvedField::new(field, ResolutionSource::Explicit))
    } else {
        Err(TierError::column_not_found(field))
    }
}

fn positional(numeric: &[String], exclude: Option<&str>) -> Option<ResolvedField> {
    numeric
        .iter()
        .find(|c| Some(c.as_str()) != exclude)
        .map(|c| ResolvedField::new(c.as_str(), ResolutionSource::Position))
}

impl IndicatorResolver for ConventionResolver {
    fn resolve(
        &self,
        rows: &[Row],
        value_field: Option<&str>,
        count_field: Option<&str>,
    ) -> Result<IndicatorFields> {
        let columns = column_names(rows);
        let numeric = self.detector.detect(rows).numeric_columns();

        let value = match value_field {
            Some(field) => explicit(&columns, field)?,
            None => Self::value_by_convention(&numeric, count_field)
                .or_else(|| positional(&numeric, count_field))
                .ok_or_else(|| {
                    TierError::configuration(
                        "no numeric column available as value indicator; set classification.value_field",
                    )
                })?,
        };

        let count = match count_field {
            Some(field) => explicit(&columns, field)?,
            None => Self::count_by_convention(&numeric, &value.field)
                .or_else(|| positional(&numeric, Some(&value.field)))
                .ok_or_else(|| {
                    TierError::configuration(
                        "no numeric column available as count indicator; set classification.count_field",
                    )
                })?,
        };

        debug!(
            value = %value.field,
            value_source = ?value.source,
            count = %count.field,
            count_source = ?count.source,
            "Resolved indicator fields"
        );
        Ok(IndicatorFields { value, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn aggregated() -> Vec<Row> {
        vec![
            row! { "region" => "north", "amount_sum" => 120, "amount_count" => 4,
                   "user_distinct_count" => 3, "_count" => 4 },
            row! { "region" => "south", "amount_sum" => 80, "amount_count" => 2,
                   "user_distinct_count" => 2, "_count" => 3 },
        ]
    }

    #[test]
    fn test_suffix_convention() {
        let fields = ConventionResolver::new().resolve(&aggregated(), None, None).unwrap();
        assert_eq!(fields.value, ResolvedField::new("amount_sum", ResolutionSource::Suffix));
        assert_eq!(fields.count, ResolvedField::new("amount_count", ResolutionSource::Suffix));
    }

    #[test]
    fn test_group_count_when_no_field_count() {
        let rows = vec![
            row! { "g" => "a", "v_sum" => 1, "v_distinct_count" => 1, "_count" => 1 },
            row! { "g" => "b", "v_sum" => 2, "v_distinct_count" => 2, "_count" => 2 },
        ];
        let fields = ConventionResolver::new().resolve(&rows, None, None).unwrap();
        assert_eq!(fields.count.field, "_count");
    }

    #[test]
    fn test_explicit_field_wins_and_is_never_replaced() {
        let resolver = ConventionResolver::new();
        let fields = resolver
            .resolve(&aggregated(), Some("_count"), Some("user_distinct_count"))
            .unwrap();
        assert_eq!(fields.value, ResolvedField::new("_count", ResolutionSource::Explicit));
        assert_eq!(fields.count.source, ResolutionSource::Explicit);

        let err = resolver
            .resolve(&aggregated(), Some("revenue"), None)
            .unwrap_err();
        assert!(matches!(err, TierError::ColumnNotFound { ref column } if column == "revenue"));
    }

    #[test]
    fn test_keyword_and_position_fallbacks() {
        let rows = vec![
            row! { "name" => "a", "score" => 3, "order_qty" => 5, "revenue" => 10 },
            row! { "name" => "b", "score" => 4, "order_qty" => 6, "revenue" => 12 },
        ];
        let fields = ConventionResolver::new().resolve(&rows, None, None).unwrap();
        assert_eq!(fields.value, ResolvedField::new("revenue", ResolutionSource::Keyword));
        assert_eq!(fields.count, ResolvedField::new("order_qty", ResolutionSource::Keyword));

        let rows = vec![row! { "x" => 3, "y" => 5 }, row! { "x" => 4, "y" => 6 }];
        let fields = ConventionResolver::new().resolve(&rows, None, None).unwrap();
        assert_eq!(fields.value, ResolvedField::new("x", ResolutionSource::Position));
        assert_eq!(fields.count, ResolvedField::new("y", ResolutionSource::Position));
    }

    #[test]
    fn test_explicit_count_is_not_reused_as_value() {
        let rows = vec![
            row! { "shop" => "a", "visits_sum" => 40, "total_spend" => 900 },
            row! { "shop" => "b", "visits_sum" => 12, "total_spend" => 310 },
        ];
        let resolver = ConventionResolver::new();
        let fields = resolver.resolve(&rows, None, Some("visits_sum")).unwrap();
        assert_eq!(fields.value, ResolvedField::new("total_spend", ResolutionSource::Keyword));
        assert_eq!(fields.count, ResolvedField::new("visits_sum", ResolutionSource::Explicit));

        let rows = vec![row! { "shop" => "a", "visits_sum" => 40 }];
        let err = resolver.resolve(&rows, None, Some("visits_sum")).unwrap_err();
        assert!(matches!(err, TierError::Configuration(_)));
    }

    #[test]
    fn test_no_numeric_columns() {
        let rows = vec![row! { "name" => "a" }];
        let err = ConventionResolver::new().resolve(&rows, None, None).unwrap_err();
        assert!(matches!(err, TierError::Configuration(_)));
    }
}
