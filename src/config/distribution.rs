//! Distribution configuration for synthetic populations
//!
//! A `DistributionConfig` describes how one study's population is shaped.
//! It is validated once when the catalog is loaded; weights that do not sum
//! to one are rejected rather than renormalized.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::algorithm::sampling::{WeightedEntry, total_weight};
use crate::error::{MetricsError, Result};
use crate::models::Gender;

/// Allowed deviation of a weight sum from 1
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Bounded numeric distribution centred on a mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundedRange {
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (inclusive)
    pub max: f64,
    /// Most likely value
    pub mode: f64,
}

impl BoundedRange {
    /// Create a new bounded range
    #[must_use]
    pub const fn new(min: f64, max: f64, mode: f64) -> Self {
        Self { min, max, mode }
    }

    fn validate(&self, field: &str) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite() && self.mode.is_finite()) {
            return Err(MetricsError::config(field, "bounds must be finite numbers"));
        }
        if self.min > self.max {
            return Err(MetricsError::config(
                field,
                format!("min {} is greater than max {}", self.min, self.max),
            ));
        }
        if self.mode < self.min || self.mode > self.max {
            return Err(MetricsError::config(
                field,
                format!("mode {} lies outside [{}, {}]", self.mode, self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// Inclusive enrollment date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First possible enrollment date
    pub start: NaiveDate,
    /// Last possible enrollment date
    pub end: NaiveDate,
}

/// A weighted, study-specific enrollment category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentCategory {
    /// Stable key
    pub key: String,
    /// Label stored on patient records
    pub label: String,
    /// Probability weight
    pub weight: f64,
}

/// Per-study description of the population shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionConfig {
    /// Gender weights, in sampling order
    pub gender_distribution: Vec<WeightedEntry<Gender>>,
    /// Age in years
    pub age_distribution: BoundedRange,
    /// Body mass index
    pub bmi_distribution: BoundedRange,
    /// Race weights, in sampling order
    pub race_distribution: Vec<WeightedEntry<String>>,
    /// Pool of possible comorbidities
    #[serde(default)]
    pub comorbidities: Vec<String>,
    /// Pool of possible medications
    #[serde(default)]
    pub medications: Vec<String>,
    /// Window enrollment dates are drawn from
    pub enrollment_date_range: DateRange,
    /// Optional weighted enrollment categories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enrollment_categories: Vec<EnrollmentCategory>,
    /// Probability that a patient is labelled Hispanic or Latino
    #[serde(default = "default_hispanic_share")]
    pub hispanic_share: f64,
    /// Probability of including each comorbidity in the pool
    #[serde(default = "default_comorbidity_probability")]
    pub comorbidity_probability: f64,
    /// Probability of including each medication in the pool
    #[serde(default = "default_medication_probability")]
    pub medication_probability: f64,
}

const fn default_hispanic_share() -> f64 {
    0.15
}

const fn default_comorbidity_probability() -> f64 {
    0.2
}

const fn default_medication_probability() -> f64 {
    0.25
}

impl DistributionConfig {
    /// Validate weights, bounds and probabilities
    ///
    /// `prefix` is prepended to field names in error messages so a failure
    /// can be traced back to the study it came from.
    pub fn validate(&self, prefix: &str) -> Result<()> {
        let field = |name: &str| format!("{prefix}.{name}");

        validate_weights(&field("genderDistribution"), &self.gender_distribution)?;
        validate_weights(&field("raceDistribution"), &self.race_distribution)?;

        self.age_distribution.validate(&field("ageDistribution"))?;
        self.bmi_distribution.validate(&field("bmiDistribution"))?;

        if self.age_distribution.min < 0.0 {
            return Err(MetricsError::config(
                field("ageDistribution"),
                "ages cannot be negative",
            ));
        }

        if self.enrollment_date_range.start > self.enrollment_date_range.end {
            return Err(MetricsError::config(
                field("enrollmentDateRange"),
                format!(
                    "start {} is after end {}",
                    self.enrollment_date_range.start, self.enrollment_date_range.end
                ),
            ));
        }

        if !self.enrollment_categories.is_empty() {
            let sum: f64 = self.enrollment_categories.iter().map(|c| c.weight).sum();
            check_weight_sum(&field("enrollmentCategories"), sum)?;
            if self.enrollment_categories.iter().any(|c| c.weight < 0.0) {
                return Err(MetricsError::config(
                    field("enrollmentCategories"),
                    "weights cannot be negative",
                ));
            }
        }

        for (name, p) in [
            ("hispanicShare", self.hispanic_share),
            ("comorbidityProbability", self.comorbidity_probability),
            ("medicationProbability", self.medication_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(MetricsError::config(
                    field(name),
                    format!("probability {p} is outside [0, 1]"),
                ));
            }
        }

        Ok(())
    }

    /// Enrollment categories as an ordered weighted distribution of labels
    #[must_use]
    pub fn enrollment_category_weights(&self) -> Vec<WeightedEntry<String>> {
        self.enrollment_categories
            .iter()
            .map(|c| WeightedEntry::new(c.label.clone(), c.weight))
            .collect()
    }
}

impl fmt::Display for DistributionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Distribution Configuration:")?;
        writeln!(
            f,
            "  Age: {}-{} (mode {})",
            self.age_distribution.min, self.age_distribution.max, self.age_distribution.mode
        )?;
        writeln!(
            f,
            "  BMI: {}-{} (mode {})",
            self.bmi_distribution.min, self.bmi_distribution.max, self.bmi_distribution.mode
        )?;
        writeln!(
            f,
            "  Enrollment Window: {} to {}",
            self.enrollment_date_range.start, self.enrollment_date_range.end
        )?;
        writeln!(f, "  Comorbidity Pool: {}", self.comorbidities.len())?;
        writeln!(f, "  Medication Pool: {}", self.medications.len())?;
        if !self.enrollment_categories.is_empty() {
            writeln!(f, "  Enrollment Categories: {}", self.enrollment_categories.len())?;
        }
        Ok(())
    }
}

fn validate_weights<T>(field: &str, entries: &[WeightedEntry<T>]) -> Result<()> {
    if entries.is_empty() {
        return Err(MetricsError::config(field, "distribution has no entries"));
    }
    if entries.iter().any(|e| e.weight < 0.0 || !e.weight.is_finite()) {
        return Err(MetricsError::config(field, "weights must be finite and non-negative"));
    }
    check_weight_sum(field, total_weight(entries))
}

fn check_weight_sum(field: &str, sum: f64) -> Result<()> {
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(MetricsError::config(
            field,
            format!("weights sum to {sum:.4}, expected 1"),
        ));
    }
    Ok(())
}
