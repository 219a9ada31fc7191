//! Tests for metric aggregation

use cohort_metrics::algorithm::metrics::{
    CustomBucket, MetricDefinition, MetricField, MetricSummary, OUT_OF_RANGE_LABEL,
    UNKNOWN_CATEGORY, aggregate,
};
use cohort_metrics::algorithm::population::PopulationBuilder;
use cohort_metrics::models::{Gender, PatientRecord};

use crate::utils::{date, record, sample_config, sample_sites};

fn population(count: usize) -> Vec<PatientRecord> {
    PopulationBuilder::new("TEST")
        .with_config(sample_config())
        .with_sites(sample_sites())
        .with_count(count)
        .with_seed(42)
        .build()
        .unwrap()
        .records
}

fn bmi_buckets() -> Vec<CustomBucket> {
    vec![
        CustomBucket::new("Underweight", 0.0, 18.5),
        CustomBucket::new("Normal", 18.5, 25.0),
        CustomBucket::new("Overweight", 25.0, 30.0),
        CustomBucket::new("Obese I", 30.0, 35.0),
        CustomBucket::new("Obese II", 35.0, 40.0),
        CustomBucket::new("Obese III", 40.0, 100.0),
    ]
}

fn numerical(summary: MetricSummary) -> cohort_metrics::NumericalMetric {
    match summary {
        MetricSummary::Numerical(metric) => metric,
        MetricSummary::Categorical(_) => panic!("expected a numerical summary"),
    }
}

fn categorical(summary: MetricSummary) -> cohort_metrics::CategoricalMetric {
    match summary {
        MetricSummary::Categorical(metric) => metric,
        MetricSummary::Numerical(_) => panic!("expected a categorical summary"),
    }
}

#[test]
fn test_age_buckets_cover_population() {
    let records = population(1000);
    let definition = MetricDefinition::numerical("age", "Age", MetricField::Age, 6);
    let metric = numerical(aggregate(&records, &definition));

    assert_eq!(metric.total, 1000);
    assert_eq!(metric.buckets.len(), 6);
    assert_eq!(metric.buckets.iter().map(|b| b.count).sum::<usize>(), 1000);
    assert!(metric.average >= 18.0 && metric.average <= 89.0);
    assert!(metric.min >= 18.0 && metric.max <= 89.0);
    assert!(metric.buckets.windows(2).all(|w| w[0].max <= w[1].min + 1e-9));
}

#[test]
fn test_bmi_lands_in_matching_custom_bucket() {
    let mut patient = record(0, 50, Gender::Male, date(2025, 1, 1));
    patient.bmi = 36.2;

    let definition = MetricDefinition::numerical_custom("bmi", "BMI", MetricField::Bmi, bmi_buckets());
    let metric = numerical(aggregate(&[patient], &definition));

    let obese_ii = metric.buckets.iter().find(|b| b.bucket == "Obese II").unwrap();
    assert_eq!(obese_ii.count, 1);
    assert_eq!(obese_ii.percentage, 100.0);
    assert_eq!(metric.buckets.iter().map(|b| b.count).sum::<usize>(), 1);
}

#[test]
fn test_last_custom_bucket_includes_upper_bound() {
    let mut patient = record(0, 50, Gender::Male, date(2025, 1, 1));
    patient.bmi = 100.0;

    let definition = MetricDefinition::numerical_custom("bmi", "BMI", MetricField::Bmi, bmi_buckets());
    let metric = numerical(aggregate(&[patient], &definition));

    assert_eq!(metric.buckets.last().unwrap().bucket, "Obese III");
    assert_eq!(metric.buckets.last().unwrap().count, 1);
}

#[test]
fn test_values_outside_custom_buckets_are_reported() {
    let records: Vec<PatientRecord> = [17.0, 22.0, 27.0, 45.0]
        .iter()
        .enumerate()
        .map(|(i, &bmi)| {
            let mut r = record(i, 40, Gender::Female, date(2025, 1, 1));
            r.bmi = bmi;
            r
        })
        .collect();

    let buckets = vec![
        CustomBucket::new("Normal", 18.5, 25.0),
        CustomBucket::new("Overweight", 25.0, 30.0),
    ];
    let definition = MetricDefinition::numerical_custom("bmi", "BMI", MetricField::Bmi, buckets);
    let metric = numerical(aggregate(&records, &definition));

    assert_eq!(metric.total, 4);
    assert_eq!(metric.buckets.len(), 3);
    let outside = &metric.buckets[2];
    assert_eq!(outside.bucket, OUT_OF_RANGE_LABEL);
    assert!(outside.out_of_range);
    assert_eq!(outside.count, 2);
    assert_eq!(outside.min, 17.0);
    assert_eq!(outside.max, 45.0);
    assert_eq!(metric.buckets.iter().map(|b| b.count).sum::<usize>(), metric.total);
}

#[test]
fn test_summary_statistics() {
    let records: Vec<PatientRecord> = [20, 30, 40, 50]
        .iter()
        .enumerate()
        .map(|(i, &age)| record(i, age, Gender::Male, date(2025, 1, 1)))
        .collect();

    let definition = MetricDefinition::numerical("age", "Age", MetricField::Age, 2);
    let metric = numerical(aggregate(&records, &definition));

    assert_eq!(metric.min, 20.0);
    assert_eq!(metric.max, 50.0);
    assert_eq!(metric.average, 35.0);
    assert_eq!(metric.median, 35.0);
    assert_eq!(metric.buckets[0].count, 2);
    assert_eq!(metric.buckets[1].count, 2);
    assert_eq!(metric.buckets[0].bucket, "20-35");
}

#[test]
fn test_identical_samples_share_one_bucket() {
    let records: Vec<PatientRecord> = (0..5)
        .map(|i| record(i, 60, Gender::Male, date(2025, 1, 1)))
        .collect();

    let definition = MetricDefinition::numerical("age", "Age", MetricField::Age, 4);
    let metric = numerical(aggregate(&records, &definition));

    assert_eq!(metric.buckets[0].count, 5);
    assert_eq!(metric.buckets.iter().map(|b| b.count).sum::<usize>(), 5);
}

#[test]
fn test_empty_population_has_no_nan() {
    let numeric = numerical(aggregate(
        &[],
        &MetricDefinition::numerical("age", "Age", MetricField::Age, 6),
    ));
    assert_eq!(numeric.total, 0);
    assert!(numeric.buckets.is_empty());
    assert_eq!(numeric.average, 0.0);
    assert_eq!(numeric.median, 0.0);

    let custom = numerical(aggregate(
        &[],
        &MetricDefinition::numerical_custom("bmi", "BMI", MetricField::Bmi, bmi_buckets()),
    ));
    assert_eq!(custom.buckets.len(), 6);
    assert!(custom.buckets.iter().all(|b| b.count == 0 && b.percentage == 0.0));

    let cat = categorical(aggregate(
        &[],
        &MetricDefinition::categorical("gender", "Gender", MetricField::Gender),
    ));
    assert_eq!(cat.total, 0);
    assert!(cat.categories.is_empty());
}

#[test]
fn test_categories_sorted_by_count() {
    let genders = [Gender::Male, Gender::Female, Gender::Female, Gender::Other, Gender::Female, Gender::Male];
    let records: Vec<PatientRecord> = genders
        .iter()
        .enumerate()
        .map(|(i, &g)| record(i, 40, g, date(2025, 1, 1)))
        .collect();

    let metric = categorical(aggregate(
        &records,
        &MetricDefinition::categorical("gender", "Gender", MetricField::Gender),
    ));

    let labels: Vec<&str> = metric.categories.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(labels, vec!["female", "male", "other"]);
    assert_eq!(metric.categories[0].count, 3);
    assert_eq!(metric.categories[0].percentage, 50.0);
    assert_eq!(metric.categories[2].percentage, 16.7);
    assert_eq!(metric.total, 6);
}

#[test]
fn test_category_ties_keep_first_seen_order() {
    let genders = [Gender::Male, Gender::Other, Gender::Female, Gender::Male, Gender::Other, Gender::Female];
    let records: Vec<PatientRecord> = genders
        .iter()
        .enumerate()
        .map(|(i, &g)| record(i, 40, g, date(2025, 1, 1)))
        .collect();

    let metric = categorical(aggregate(
        &records,
        &MetricDefinition::categorical("gender", "Gender", MetricField::Gender),
    ));

    let labels: Vec<&str> = metric.categories.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(labels, vec!["male", "other", "female"]);
    assert!(metric.categories.iter().all(|c| c.count == 2));

    let shares: Vec<f64> = metric.categories.iter().map(|c| c.percentage).collect();
    assert_eq!(shares, vec![33.4, 33.3, 33.3]);
}

#[test]
fn test_missing_values_count_as_unknown() {
    let mut with_category = record(0, 40, Gender::Male, date(2025, 1, 1));
    with_category.enrollment_category = Some("Follow-up".to_string());
    let without_category = record(1, 40, Gender::Male, date(2025, 1, 1));

    let metric = categorical(aggregate(
        &[with_category, without_category],
        &MetricDefinition::categorical("category", "Category", MetricField::EnrollmentCategory),
    ));

    assert_eq!(metric.total, 2);
    assert!(metric.categories.iter().any(|c| c.category == UNKNOWN_CATEGORY && c.count == 1));
}

#[test]
fn test_aggregation_is_idempotent() {
    let records = population(500);
    let definitions = [
        MetricDefinition::categorical("race", "Race", MetricField::Race),
        MetricDefinition::numerical("age", "Age", MetricField::Age, 6),
        MetricDefinition::numerical_custom("bmi", "BMI", MetricField::Bmi, bmi_buckets()),
    ];

    for definition in &definitions {
        assert_eq!(aggregate(&records, definition), aggregate(&records, definition));
    }
}

#[test]
fn test_categorical_counts_reconcile() {
    let records = population(800);
    for source in [MetricField::Gender, MetricField::Race, MetricField::Status, MetricField::SiteId] {
        let metric = categorical(aggregate(
            &records,
            &MetricDefinition::categorical("m", "M", source),
        ));
        assert_eq!(metric.categories.iter().map(|c| c.count).sum::<usize>(), 800);
        let share: f64 = metric.categories.iter().map(|c| c.percentage).sum();
        assert!((share - 100.0).abs() < 0.5, "{source}: {share}");
    }
}

#[test]
fn test_high_cardinality_shares_sum_to_hundred() {
    let records = population(700);
    for source in [MetricField::Age, MetricField::Bmi] {
        let metric = categorical(aggregate(
            &records,
            &MetricDefinition::categorical("m", "M", source),
        ));
        assert!(metric.categories.len() > 20, "{source}: {}", metric.categories.len());
        let share: f64 = metric.categories.iter().map(|c| c.percentage).sum();
        assert!((share - 100.0).abs() < 1e-6, "{source}: {share}");
    }
}

#[test]
fn test_bucket_shares_sum_to_hundred() {
    let records = population(700);
    for definition in [
        MetricDefinition::numerical("age", "Age", MetricField::Age, 7),
        MetricDefinition::numerical_custom("bmi", "BMI", MetricField::Bmi, bmi_buckets()),
    ] {
        let metric = numerical(aggregate(&records, &definition));
        let share: f64 = metric.buckets.iter().map(|b| b.percentage).sum();
        assert!((share - 100.0).abs() < 1e-6, "{}: {share}", definition.id);
    }

    let records: Vec<PatientRecord> = [17.0, 22.0, 27.0]
        .iter()
        .enumerate()
        .map(|(i, &bmi)| {
            let mut r = record(i, 40, Gender::Female, date(2025, 1, 1));
            r.bmi = bmi;
            r
        })
        .collect();
    let buckets = vec![
        CustomBucket::new("Normal", 18.5, 25.0),
        CustomBucket::new("Overweight", 25.0, 30.0),
    ];
    let metric = numerical(aggregate(
        &records,
        &MetricDefinition::numerical_custom("bmi", "BMI", MetricField::Bmi, buckets),
    ));
    let shares: Vec<f64> = metric.buckets.iter().map(|b| b.percentage).collect();
    assert_eq!(shares, vec![33.4, 33.3, 33.3]);
}

#[test]
fn test_summary_json_is_tagged() {
    let records = population(50);

    let numeric = serde_json::to_value(aggregate(
        &records,
        &MetricDefinition::numerical("age", "Age", MetricField::Age, 3),
    ))
    .unwrap();
    assert_eq!(numeric["type"], "numerical");
    assert_eq!(numeric["id"], "age");
    assert_eq!(numeric["total"], 50);
    assert!(numeric["buckets"][0].get("outOfRange").is_none());

    let cat = serde_json::to_value(aggregate(
        &records,
        &MetricDefinition::categorical("gender", "Gender", MetricField::Gender),
    ))
    .unwrap();
    assert_eq!(cat["type"], "categorical");
    assert!(cat["categories"][0]["percentage"].is_f64());
}
