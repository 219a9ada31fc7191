//! Patient and site records
//!
//! Records are produced by the population generator and never mutated
//! afterwards; every downstream computation borrows them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{Gender, PatientStatus};

/// A single synthetic patient enrolled in a study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    /// Identifier derived from the study and the record index
    pub id: String,
    /// Study the patient is enrolled in
    pub study_id: String,
    /// Age in whole years
    pub age: u32,
    /// Gender
    pub gender: Gender,
    /// Body mass index, one decimal
    pub bmi: f64,
    /// Race category
    pub race: String,
    /// Ethnicity label
    pub ethnicity: String,
    /// Comorbidities drawn from the study pool
    pub comorbidities: Vec<String>,
    /// Medications drawn from the study pool
    pub medications: Vec<String>,
    /// Date of enrollment, serialized as ISO-8601
    pub enrollment_date: NaiveDate,
    /// Participation status
    pub status: PatientStatus,
    /// Enrolling site
    pub site_id: String,
    /// Study-specific enrollment category label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_category: Option<String>,
}

impl PatientRecord {
    /// Whether the patient was enrolled on or before `date`
    #[must_use]
    pub fn enrolled_by(&self, date: NaiveDate) -> bool {
        self.enrollment_date <= date
    }

    /// Whether the patient was enrolled within `[start, end]`
    #[must_use]
    pub fn enrolled_between(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.enrollment_date >= start && self.enrollment_date <= end
    }

    /// Case-insensitive check against the comorbidity list
    #[must_use]
    pub fn has_comorbidity(&self, name: &str) -> bool {
        self.comorbidities.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Case-insensitive check against the medication list
    #[must_use]
    pub fn takes_medication(&self, name: &str) -> bool {
        self.medications.iter().any(|m| m.eq_ignore_ascii_case(name))
    }
}

/// An enrolling site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Site identifier referenced by patient records
    pub id: String,
    /// Display name
    pub name: String,
    /// Geographic region used for cohort demographics
    pub region: String,
}
