//! Tests for synthetic population generation

use cohort_metrics::algorithm::population::{PopulationBuilder, generate_population, patient_id};
use cohort_metrics::models::{Gender, PatientStatus};
use cohort_metrics::models::types::{HISPANIC_LABEL, NOT_HISPANIC_LABEL};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::utils::{date, sample_config, sample_sites};

fn build(seed: u64, count: usize) -> Vec<cohort_metrics::PatientRecord> {
    PopulationBuilder::new("TEST")
        .with_config(sample_config())
        .with_sites(sample_sites())
        .with_count(count)
        .with_seed(seed)
        .build()
        .unwrap()
        .records
}

#[test]
fn test_same_seed_gives_identical_population() {
    assert_eq!(build(42, 300), build(42, 300));
}

#[test]
fn test_different_seeds_give_different_populations() {
    assert_ne!(build(1, 100), build(2, 100));
}

#[test]
fn test_generator_matches_builder_with_seeded_rng() {
    let mut rng = StdRng::seed_from_u64(42);
    let direct = generate_population(&sample_config(), &sample_sites(), 50, "TEST", &mut rng).unwrap();
    assert_eq!(direct, build(42, 50));
}

#[test]
fn test_records_respect_configured_bounds() {
    let config = sample_config();
    let sites = sample_sites();
    let records = build(7, 1000);

    assert_eq!(records.len(), 1000);
    for record in &records {
        assert!((18..=89).contains(&record.age));
        assert!(record.bmi >= 16.0 && record.bmi <= 50.0);
        assert!(record.enrollment_date >= date(2024, 1, 1));
        assert!(record.enrollment_date <= date(2025, 6, 30));
        assert!(sites.iter().any(|s| s.id == record.site_id));
        assert!(record.ethnicity == HISPANIC_LABEL || record.ethnicity == NOT_HISPANIC_LABEL);
        assert!(record.comorbidities.iter().all(|c| config.comorbidities.contains(c)));
        assert!(record.medications.iter().all(|m| config.medications.contains(m)));
        assert!(record.enrollment_category.is_some());
        assert_eq!(record.study_id, "TEST");
    }
}

#[test]
fn test_patient_ids_follow_index() {
    let records = build(3, 12);
    assert_eq!(records[0].id, "TEST-P00001");
    assert_eq!(records[11].id, patient_id("TEST", 11));
}

#[test]
fn test_gender_mix_follows_weights() {
    let records = build(11, 5000);
    let female = records.iter().filter(|r| r.gender == Gender::Female).count();
    let male = records.iter().filter(|r| r.gender == Gender::Male).count();

    // 0.50 and 0.48 of 5000, with generous sampling slack
    assert!((2300..=2700).contains(&female), "female = {female}");
    assert!((2200..=2600).contains(&male), "male = {male}");
}

#[test]
fn test_status_mix_is_mostly_active() {
    let records = build(5, 2000);
    let active = records.iter().filter(|r| r.status == PatientStatus::Active).count();
    let withdrawn = records.iter().filter(|r| r.status == PatientStatus::Withdrawn).count();

    assert!(active > 1450 && active < 1750, "active = {active}");
    assert!(withdrawn < 200, "withdrawn = {withdrawn}");
}

#[test]
fn test_no_sites_uses_default_site() {
    let records = PopulationBuilder::new("TEST")
        .with_config(sample_config())
        .with_count(20)
        .build()
        .unwrap()
        .records;
    assert!(records.iter().all(|r| r.site_id == "SITE-001"));
}

#[test]
fn test_zero_count_gives_empty_population() {
    let population = PopulationBuilder::new("TEST")
        .with_config(sample_config())
        .with_count(0)
        .build()
        .unwrap();
    assert!(population.is_empty());
    assert_eq!(population.statistics().patient_count, 0);
}

#[test]
fn test_invalid_weights_are_rejected() {
    let mut config = sample_config();
    config.gender_distribution[0].weight = 0.9;

    let err = PopulationBuilder::new("TEST")
        .with_config(config)
        .with_count(10)
        .build()
        .unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("genderDistribution"));
}

#[test]
fn test_missing_config_is_rejected() {
    let err = PopulationBuilder::new("TEST").with_count(10).build().unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_population_summary_mentions_study() {
    let population = PopulationBuilder::new("TEST")
        .with_config(sample_config())
        .with_sites(sample_sites())
        .with_count(100)
        .with_seed(9)
        .build()
        .unwrap();

    let stats = population.statistics();
    assert_eq!(stats.patient_count, 100);
    assert_eq!(
        stats.active_count + stats.completed_count + stats.withdrawn_count,
        100
    );
    assert!(population.print_summary().contains("TEST"));
}
