//! Population statistics and summaries
//!
//! Quick counts over a generated population, used for logging and the
//! report binary. Dashboard metrics go through the aggregator instead.

use std::fmt::Write;

use rustc_hash::FxHashSet;

use crate::models::{PatientRecord, PatientStatus};

/// Structure containing basic population statistics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PopulationStats {
    /// Total number of patients
    pub patient_count: usize,
    /// Patients currently active
    pub active_count: usize,
    /// Patients who completed the protocol
    pub completed_count: usize,
    /// Patients who withdrew
    pub withdrawn_count: usize,
    /// Number of distinct enrolling sites
    pub site_count: usize,
    /// Mean age in years
    pub mean_age: f64,
    /// Mean number of comorbidities per patient
    pub mean_comorbidities: f64,
}

impl PopulationStats {
    /// Calculate basic statistics for a set of records
    #[must_use]
    pub fn calculate(records: &[PatientRecord]) -> Self {
        let patient_count = records.len();
        if patient_count == 0 {
            return Self::default();
        }

        let count_status = |status: PatientStatus| records.iter().filter(|r| r.status == status).count();
        let sites: FxHashSet<&str> = records.iter().map(|r| r.site_id.as_str()).collect();

        let n = patient_count as f64;
        Self {
            patient_count,
            active_count: count_status(PatientStatus::Active),
            completed_count: count_status(PatientStatus::Completed),
            withdrawn_count: count_status(PatientStatus::Withdrawn),
            site_count: sites.len(),
            mean_age: records.iter().map(|r| f64::from(r.age)).sum::<f64>() / n,
            mean_comorbidities: records.iter().map(|r| r.comorbidities.len()).sum::<usize>() as f64 / n,
        }
    }

    /// Generate a human-readable population summary
    #[must_use]
    pub fn summary(&self, study_id: &str) -> String {
        let mut summary = String::new();
        let _ = writeln!(summary, "Study Population Summary ({study_id}):");
        let _ = writeln!(summary, "  Total Patients: {}", self.patient_count);
        let _ = writeln!(summary, "  Active: {}", self.active_count);
        let _ = writeln!(summary, "  Completed: {}", self.completed_count);
        let _ = writeln!(summary, "  Withdrawn: {}", self.withdrawn_count);
        let _ = writeln!(summary, "  Sites: {}", self.site_count);
        let _ = writeln!(summary, "  Mean Age: {:.1}", self.mean_age);
        let _ = writeln!(summary, "  Mean Comorbidities: {:.2}", self.mean_comorbidities);
        summary
    }
}
