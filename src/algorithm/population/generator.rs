//! Synthetic patient generation
//!
//! Each record is sampled independently from the study's distribution
//! config. Fields are drawn in a fixed order, so a seeded RNG reproduces
//! the exact same population.

use rand::Rng;

use crate::algorithm::sampling::{
    WeightedEntry, bounded_approx_normal, independent_subset, uniform_date, weighted_choice,
};
use crate::config::DistributionConfig;
use crate::error::{MetricsError, Result};
use crate::models::types::ethnicity_label;
use crate::models::{PatientRecord, PatientStatus, Site};
use crate::utils::round_to;

/// Site id assigned when a study has no sites configured
pub const DEFAULT_SITE_ID: &str = "SITE-001";

/// Fixed status mix, heavily biased towards active participation
pub const STATUS_WEIGHTS: [WeightedEntry<PatientStatus>; 3] = [
    WeightedEntry::new(PatientStatus::Active, 0.8),
    WeightedEntry::new(PatientStatus::Completed, 0.15),
    WeightedEntry::new(PatientStatus::Withdrawn, 0.05),
];

/// Deterministic patient id for the record at `index`
#[must_use]
pub fn patient_id(study_id: &str, index: usize) -> String {
    format!("{study_id}-P{:05}", index + 1)
}

/// Generate `count` patient records for a study
///
/// The config is validated first; an invalid config yields a
/// configuration error and no records.
pub fn generate_population<R: Rng>(
    config: &DistributionConfig,
    sites: &[Site],
    count: usize,
    study_id: &str,
    rng: &mut R,
) -> Result<Vec<PatientRecord>> {
    config.validate(&format!("studies.{study_id}.distribution"))?;

    let categories = config.enrollment_category_weights();
    let mut records = Vec::with_capacity(count);

    for index in 0..count {
        records.push(sample_patient(
            config,
            sites,
            &categories,
            study_id,
            index,
            rng,
        )?);
    }

    log::debug!("Generated {} patient records for study {study_id}", records.len());
    Ok(records)
}

fn sample_patient<R: Rng>(
    config: &DistributionConfig,
    sites: &[Site],
    categories: &[WeightedEntry<String>],
    study_id: &str,
    index: usize,
    rng: &mut R,
) -> Result<PatientRecord> {
    let gender = *weighted_choice(&config.gender_distribution, rng)
        .ok_or_else(|| empty_distribution(study_id, "genderDistribution"))?;

    let age = sample_age(config, rng);

    let bmi_range = &config.bmi_distribution;
    let bmi = round_to(
        bounded_approx_normal(bmi_range.min, bmi_range.max, bmi_range.mode, rng),
        1,
    );

    let race = weighted_choice(&config.race_distribution, rng)
        .ok_or_else(|| empty_distribution(study_id, "raceDistribution"))?
        .clone();

    let hispanic = rng.random::<f64>() < config.hispanic_share;

    let comorbidities = independent_subset(&config.comorbidities, config.comorbidity_probability, rng);
    let medications = independent_subset(&config.medications, config.medication_probability, rng);

    let window = &config.enrollment_date_range;
    let enrollment_date = uniform_date(window.start, window.end, rng);

    let status = weighted_choice(&STATUS_WEIGHTS, rng)
        .copied()
        .unwrap_or(PatientStatus::Active);

    let site_id = if sites.is_empty() {
        DEFAULT_SITE_ID.to_string()
    } else {
        sites[rng.random_range(0..sites.len())].id.clone()
    };

    let enrollment_category = weighted_choice(categories, rng).cloned();

    Ok(PatientRecord {
        id: patient_id(study_id, index),
        study_id: study_id.to_string(),
        age,
        gender,
        bmi,
        race,
        ethnicity: ethnicity_label(hispanic).to_string(),
        comorbidities,
        medications,
        enrollment_date,
        status,
        site_id,
        enrollment_category,
    })
}

fn sample_age<R: Rng>(config: &DistributionConfig, rng: &mut R) -> u32 {
    let range = &config.age_distribution;
    let lower = range.min.ceil();
    let upper = range.max.floor().max(lower);

    bounded_approx_normal(range.min, range.max, range.mode, rng)
        .round()
        .clamp(lower, upper) as u32
}

fn empty_distribution(study_id: &str, name: &str) -> MetricsError {
    MetricsError::config(
        format!("studies.{study_id}.distribution.{name}"),
        "distribution has no entries",
    )
}
