//! Tests for cohort criteria, filtering and demographics

use cohort_metrics::algorithm::cohort::{
    CriteriaBlock, CriterionType, UNASSIGNED_REGION, apply_criteria, filter_cohort,
    summarize_cohort,
};
use cohort_metrics::error::MetricsError;
use cohort_metrics::models::{Gender, PatientRecord, PatientStatus};

use crate::utils::{date, record, sample_sites};

fn fixture() -> Vec<PatientRecord> {
    let mut records = vec![
        record(0, 25, Gender::Female, date(2024, 3, 1)),
        record(1, 40, Gender::Male, date(2024, 9, 1)),
        record(2, 65, Gender::Female, date(2025, 2, 1)),
        record(3, 80, Gender::Other, date(2025, 5, 1)),
        record(4, 55, Gender::Male, date(2024, 11, 15)),
    ];

    records[0].comorbidities = vec!["Hypertension".to_string()];
    records[0].medications = vec!["Metformin".to_string()];
    records[0].bmi = 22.0;
    records[0].enrollment_category = Some("New Diagnosis".to_string());

    records[1].site_id = "S-2".to_string();
    records[1].medications = vec!["Aspirin".to_string()];
    records[1].bmi = 31.0;
    records[1].race = "Asian".to_string();
    records[1].status = PatientStatus::Withdrawn;

    records[2].site_id = "S-3".to_string();
    records[2].comorbidities = vec!["Hypertension".to_string(), "COPD".to_string()];
    records[2].bmi = 28.0;
    records[2].race = "Black or African American".to_string();
    records[2].status = PatientStatus::Completed;

    records[3].site_id = "S-9".to_string();
    records[3].comorbidities = vec!["Asthma".to_string()];
    records[3].bmi = 36.0;

    records[4].bmi = 26.0;

    records
}

fn ids(cohort: &[PatientRecord]) -> Vec<&str> {
    cohort.iter().map(|r| r.id.as_str()).collect()
}

fn select(inclusion: &[CriteriaBlock], exclusion: &[CriteriaBlock]) -> Vec<PatientRecord> {
    filter_cohort(&fixture(), inclusion, exclusion, &sample_sites()).unwrap()
}

fn attribute() -> CriteriaBlock {
    CriteriaBlock::new(CriterionType::PatientAttribute)
}

#[test]
fn test_no_criteria_returns_population() {
    let records = fixture();
    let cohort = filter_cohort(&records, &[], &[], &sample_sites()).unwrap();
    assert_eq!(cohort, records);
}

#[test]
fn test_age_range() {
    let block = attribute().with_option("minAge", "30").with_option("maxAge", "70");
    let cohort = select(&[block], &[]);
    assert_eq!(ids(&cohort), vec!["TEST-P00002", "TEST-P00003", "TEST-P00005"]);
}

#[test]
fn test_gender_alternatives() {
    let female = select(&[attribute().with_option("gender", "female")], &[]);
    assert_eq!(ids(&female), vec!["TEST-P00001", "TEST-P00003"]);

    let female_or_other = select(&[attribute().with_option("gender", "Female, other")], &[]);
    assert_eq!(
        ids(&female_or_other),
        vec!["TEST-P00001", "TEST-P00003", "TEST-P00004"]
    );
}

#[test]
fn test_inclusion_blocks_combine_with_and() {
    let diagnosis = CriteriaBlock::new(CriterionType::Diagnosis).with_option("condition", "hypertension");
    let age = attribute().with_option("minAge", "60");
    let cohort = select(&[diagnosis, age], &[]);
    assert_eq!(ids(&cohort), vec!["TEST-P00003"]);
}

#[test]
fn test_exclusion_removes_matches() {
    let diagnosis = CriteriaBlock::new(CriterionType::Diagnosis).with_option("condition", "Hypertension");
    let metformin = CriteriaBlock::new(CriterionType::Medication).with_option("medication", "metformin");
    let cohort = select(&[diagnosis], &[metformin]);
    assert_eq!(ids(&cohort), vec!["TEST-P00003"]);
}

#[test]
fn test_region_resolves_through_sites() {
    let cohort = select(&[attribute().with_option("region", "northeast")], &[]);
    assert_eq!(ids(&cohort), vec!["TEST-P00001", "TEST-P00005"]);
}

#[test]
fn test_unassigned_region_selects_unconfigured_sites() {
    let cohort = select(&[attribute().with_option("region", UNASSIGNED_REGION)], &[]);
    assert_eq!(ids(&cohort), vec!["TEST-P00004"]);

    let mixed = select(&[attribute().with_option("region", "west, unassigned")], &[]);
    assert_eq!(ids(&mixed), vec!["TEST-P00003", "TEST-P00004"]);

    // Same split as the demographics breakdown
    let summary = summarize_cohort(5, &fixture(), &sample_sites());
    let unassigned = summary
        .demographics
        .region
        .categories
        .iter()
        .find(|c| c.category == UNASSIGNED_REGION)
        .unwrap();
    assert_eq!(unassigned.count, cohort.len());
}

#[test]
fn test_observation_and_dates() {
    let obese = select(
        &[CriteriaBlock::new(CriterionType::Observation).with_option("minBmi", "30")],
        &[],
    );
    assert_eq!(ids(&obese), vec!["TEST-P00002", "TEST-P00004"]);

    let recent = select(&[attribute().with_option("enrolledAfter", "2025-01-01")], &[]);
    assert_eq!(ids(&recent), vec!["TEST-P00003", "TEST-P00004"]);

    let early = select(&[attribute().with_option("enrolledBefore", "2024-09-01")], &[]);
    assert_eq!(ids(&early), vec!["TEST-P00001", "TEST-P00002"]);
}

#[test]
fn test_status_race_and_category() {
    let withdrawn = select(&[attribute().with_option("status", "withdrawn")], &[]);
    assert_eq!(ids(&withdrawn), vec!["TEST-P00002"]);

    let asian = select(&[attribute().with_option("race", "asian")], &[]);
    assert_eq!(ids(&asian), vec!["TEST-P00002"]);

    let new = select(&[attribute().with_option("enrollmentCategory", "New Diagnosis")], &[]);
    assert_eq!(ids(&new), vec!["TEST-P00001"]);

    let site = select(&[attribute().with_option("siteId", "S-2,S-3")], &[]);
    assert_eq!(ids(&site), vec!["TEST-P00002", "TEST-P00003"]);
}

#[test]
fn test_unsupported_data_types_never_match() {
    let procedure = CriteriaBlock::new(CriterionType::Procedure).with_option("code", "CABG");
    assert!(select(&[procedure.clone()], &[]).is_empty());
    assert_eq!(select(&[], &[procedure]).len(), 5);

    let lab = CriteriaBlock::new(CriterionType::Lab).with_option("test", "HbA1c");
    assert!(select(&[lab], &[]).is_empty());
}

#[test]
fn test_empty_blocks_are_ignored() {
    let empty = CriteriaBlock::new(CriterionType::Diagnosis);
    assert_eq!(select(&[empty.clone()], &[empty]).len(), 5);
}

#[test]
fn test_invalid_criteria_are_rejected() {
    let sites = sample_sites();
    let records = fixture();

    let cases = [
        attribute().with_option("minAge", "old"),
        attribute().with_option("gender", "robot"),
        attribute().with_option("status", "paused"),
        attribute().with_option("enrolledAfter", "01/02/2025"),
        attribute().with_option("favouriteColour", "blue"),
        CriteriaBlock::new(CriterionType::Diagnosis).with_option("minAge", "30"),
        attribute().with_option("gender", ""),
        attribute().with_option("gender", "1"),
        attribute().with_option("race", " , "),
        attribute().with_option("siteId", ","),
        attribute().with_option("region", "Atlantis"),
        attribute().with_option("region", "west, Atlantis"),
        CriteriaBlock::new(CriterionType::Diagnosis).with_option("condition", "  "),
        CriteriaBlock::new(CriterionType::Observation).with_option("minBmi", "NaN"),
        CriteriaBlock::new(CriterionType::Observation).with_option("maxBmi", "inf"),
    ];

    for block in cases {
        let err = filter_cohort(&records, &[block], &[], &sites).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidCriteria(_)), "{err}");
    }
}

#[test]
fn test_filtering_leaves_input_untouched() {
    let records = fixture();
    let before = records.clone();
    let block = attribute().with_option("minAge", "50");

    let first = filter_cohort(&records, &[block.clone()], &[], &sample_sites()).unwrap();
    let second = filter_cohort(&records, &[block], &[], &sample_sites()).unwrap();

    assert_eq!(records, before);
    assert_eq!(first, second);
}

#[test]
fn test_apply_criteria_counts_cohort() {
    let block = attribute().with_option("gender", "male");
    let count = apply_criteria(&fixture(), &[block.clone()], &[], &sample_sites()).unwrap();
    assert_eq!(count, select(&[block], &[]).len());
    assert_eq!(count, 2);

    assert_eq!(apply_criteria(&fixture(), &[], &[], &sample_sites()).unwrap(), 5);
}

#[test]
fn test_cohort_summary_demographics() {
    let records = fixture();
    let summary = summarize_cohort(records.len(), &records, &sample_sites());

    assert_eq!(summary.population_size, 5);
    assert_eq!(summary.cohort_size, 5);

    let demographics = &summary.demographics;
    assert_eq!(demographics.gender.total, 5);
    assert_eq!(demographics.gender.categories[0].count, 2);

    let age_labels: Vec<&str> = demographics.age.buckets.iter().map(|b| b.bucket.as_str()).collect();
    assert_eq!(age_labels, vec!["18-29", "30-44", "45-59", "60-74", "75+"]);
    assert!(demographics.age.buckets.iter().all(|b| b.count == 1));

    assert!(
        demographics
            .region
            .categories
            .iter()
            .any(|c| c.category == UNASSIGNED_REGION && c.count == 1)
    );
    assert_eq!(
        demographics.region.categories.iter().map(|c| c.count).sum::<usize>(),
        5
    );
}

#[test]
fn test_criteria_block_from_json() {
    let json = r#"{
        "type": "patient-attribute",
        "options": [{ "option": "minAge", "value": "60" }],
        "open": true
    }"#;
    let block: CriteriaBlock = serde_json::from_str(json).unwrap();

    assert_eq!(block.criterion_type, CriterionType::PatientAttribute);
    assert!(block.open);
    assert_eq!(ids(&select(&[block], &[])), vec!["TEST-P00003", "TEST-P00004"]);
}

#[test]
fn test_summary_json_shape() {
    let records = fixture();
    let summary = summarize_cohort(10, &records[..2], &sample_sites());
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["populationSize"], 10);
    assert_eq!(json["cohortSize"], 2);
    assert!(json["demographics"]["gender"]["categories"].is_array());
    assert!(json["demographics"]["region"]["categories"].is_array());
}
