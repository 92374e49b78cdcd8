//! Integration tests for threshold computation and row classification.

use std::sync::Arc;
use tier_guard::classification::{
    Category, ClassificationMethod, ClassificationParams, ConventionResolver, IndicatorFields,
    IndicatorResolver, MethodConfig, ResolutionSource, ResolvedField, RiskLevel,
    ThresholdClassifier,
};
use tier_guard::core::{Row, Value};
use tier_guard::profile::{ClassificationConfig, ProfileOrchestrator, CATEGORY_FIELD, RISK_LEVEL_FIELD};
use tier_guard::row;
use tier_guard::TierError;

/// Q1 = 10 and Q3 = 30 for both indicators, so high = 60 and low = -20.
fn iqr_params() -> ClassificationParams {
    let sample = [0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0];
    ClassificationParams::from_samples(
        ("spend", &sample[..]),
        ("orders", &sample[..]),
        &MethodConfig::iqr(),
    )
    .unwrap()
}

#[test]
fn test_iqr_thresholds_and_rules() {
    let params = iqr_params();
    assert_eq!(params.value.high, 60.0);
    assert_eq!(params.value.low, -20.0);

    let classifier = ThresholdClassifier::new();
    assert_eq!(classifier.classify(65.0, 10.0, &params), Category::HighOnValueField);
    assert_eq!(classifier.classify(65.0, 70.0, &params), Category::DoubleHigh);
    assert_eq!(classifier.classify(20.0, 70.0, &params), Category::HighOnCountField);
    assert_eq!(classifier.classify(20.0, 10.0, &params), Category::Middle);
    assert_eq!(classifier.classify(-25.0, 10.0, &params), Category::Low);
}

#[test]
fn test_threshold_boundaries() {
    let params = iqr_params();
    let classifier = ThresholdClassifier::new();
    // High thresholds are inclusive, low thresholds exclusive.
    assert_eq!(classifier.classify(60.0, 60.0, &params), Category::DoubleHigh);
    assert_eq!(classifier.classify(60.0, 0.0, &params), Category::HighOnValueField);
    assert_eq!(classifier.classify(-20.0, 0.0, &params), Category::Low);
    assert_eq!(classifier.classify(0.0, -20.0, &params), Category::Low);
    assert_eq!(classifier.classify(-19.9, -19.9, &params), Category::Middle);
}

#[test]
fn test_stddev_method() {
    let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    let params = ClassificationParams::from_samples(
        ("v", &values[..]),
        ("c", &values[..]),
        &MethodConfig::stddev(),
    )
    .unwrap();
    // Mean 5, population sigma 2, multiplier 2.
    assert_eq!(params.method, ClassificationMethod::StdDev);
    assert_eq!(params.value.high, 9.0);
    assert_eq!(params.value.low, 1.0);
    assert_eq!(
        ThresholdClassifier::new().classify(9.0, 5.0, &params),
        Category::HighOnValueField
    );
}

#[test]
fn test_non_numeric_indicators_are_anomalous() {
    let params = iqr_params();
    let classifier = ThresholdClassifier::new();
    let row = row! { "spend" => "n/a", "orders" => 4 };
    let category = classifier.classify_row(&row, &params);
    assert_eq!(category, Category::Anomalous);
    assert_eq!(category.risk_level(), RiskLevel::Medium);

    let lenient = row! { "spend" => "1,200", "orders" => "12%" };
    assert_eq!(classifier.classify_row(&lenient, &params), Category::HighOnValueField);
}

#[test]
fn test_resolver_prefers_aggregation_suffixes() {
    let rows = vec![
        row! { "customer" => "a", "_count" => 3, "amount_sum" => 10.0, "order_id_count" => 2 },
        row! { "customer" => "b", "_count" => 1, "amount_sum" => 4.0, "order_id_count" => 1 },
    ];
    let fields = ConventionResolver::new().resolve(&rows, None, None).unwrap();
    assert_eq!(fields.value.field, "amount_sum");
    assert_eq!(fields.value.source, ResolutionSource::Suffix);
    assert_eq!(fields.count.field, "order_id_count");
}

#[test]
fn test_explicit_field_never_replaced() {
    let rows = vec![row! { "amount_sum" => 1.0, "_count" => 1 }];
    let err = ConventionResolver::new()
        .resolve(&rows, Some("revenue"), None)
        .unwrap_err();
    assert!(matches!(err, TierError::ColumnNotFound { ref column } if column == "revenue"));
}

struct FixedResolver;

impl IndicatorResolver for FixedResolver {
    fn resolve(&self, _: &[Row], _: Option<&str>, _: Option<&str>) -> tier_guard::Result<IndicatorFields> {
        Ok(IndicatorFields {
            value: ResolvedField {
                field: "spend".into(),
                source: ResolutionSource::Explicit,
            },
            count: ResolvedField {
                field: "orders".into(),
                source: ResolutionSource::Explicit,
            },
        })
    }
}

#[test]
fn test_orchestrator_with_custom_resolver_and_supplied_params() {
    let rows = vec![
        row! { "tier" => "gold", "spend" => 65, "orders" => 10 },
        row! { "tier" => "gold", "spend" => 20, "orders" => 70 },
        row! { "tier" => "GOLD", "spend" => "n/a", "orders" => 10 },
        row! { "tier" => "silver", "spend" => 1, "orders" => 1 },
    ];
    let config = ClassificationConfig {
        group_field: Some("tier".into()),
        use_fallback: false,
        ..ClassificationConfig::default()
    };
    let outcome = ProfileOrchestrator::with_resolver(config, Arc::new(FixedResolver))
        .with_group_params("gold", iqr_params())
        .classify(&rows)
        .unwrap();

    let categories: Vec<_> = outcome
        .rows
        .iter()
        .map(|r| r.get_or_null(CATEGORY_FIELD).to_string())
        .collect();
    // "GOLD" has no usable spend of its own and borrows "gold" thresholds.
    assert_eq!(
        categories,
        vec!["high-on-value-field", "high-on-count-field", "anomalous", "double-high"]
    );
    assert_eq!(outcome.rows[0].get(RISK_LEVEL_FIELD), Some(&Value::from("high")));
    assert_eq!(outcome.coverage.total, 4);
    assert_eq!(outcome.coverage.direct, 3);
    assert_eq!(outcome.coverage.fuzzy, 1);
    assert_eq!(outcome.coverage.anomalous, 1);
    assert_eq!(outcome.coverage.unknown, 0);
    assert!(outcome.fallback_params.is_none());

    let gold = outcome.group_params.iter().find(|g| g.group == "gold").unwrap();
    assert_eq!(gold.params.as_ref(), Some(&iqr_params()));
    let upper = outcome.group_params.iter().find(|g| g.group == "GOLD").unwrap();
    assert!(upper.params.is_none());
}

#[test]
fn test_rows_are_never_dropped() {
    let rows = vec![
        row! { "region" => "north", "amount_sum" => 10.0, "_count" => 2 },
        row! { "region" => "north", "amount_sum" => "bad", "_count" => 3 },
        row! { "region" => "south", "amount_sum" => Value::Null, "_count" => Value::Null },
    ];
    let config = ClassificationConfig {
        value_field: Some("amount_sum".into()),
        count_field: Some("_count".into()),
        group_field: Some("region".into()),
        use_fallback: false,
        ..ClassificationConfig::default()
    };
    let outcome = ProfileOrchestrator::new(config).classify(&rows).unwrap();

    assert_eq!(outcome.rows.len(), rows.len());
    let c = &outcome.coverage;
    assert_eq!(c.direct + c.fuzzy + c.fallback + c.unknown, c.total);
    assert_eq!(c.unknown, 1);
    assert_eq!(c.anomalous, 1);
    assert_eq!(outcome.summary.count(Category::Unknown), 1);
    assert_eq!(
        outcome.rows[2].get(CATEGORY_FIELD),
        Some(&Value::from("unknown"))
    );
}
