//! Cohort filtering
//!
//! This module evaluates compiled criteria against individual patient
//! records. Inclusion blocks must all hold; any matching exclusion block
//! removes the record.

use crate::error::Result;
use crate::models::{PatientRecord, Site};

use super::criteria::{CompiledBlock, CriteriaBlock, Predicate};

/// Defines a criterion for filtering patient records
pub trait FilterCriteria<T> {
    /// Determine if an entity meets the filter criteria
    fn meets_criteria(&self, entity: &T) -> bool;
}

fn any_eq_ignore_case(values: &[String], candidate: &str) -> bool {
    values.iter().any(|v| v.eq_ignore_ascii_case(candidate))
}

impl FilterCriteria<PatientRecord> for Predicate {
    fn meets_criteria(&self, record: &PatientRecord) -> bool {
        match self {
            Self::Gender(genders) => genders.contains(&record.gender),
            Self::Race(races) => any_eq_ignore_case(races, &record.race),
            Self::Ethnicity(labels) => any_eq_ignore_case(labels, &record.ethnicity),
            Self::Status(statuses) => statuses.contains(&record.status),
            Self::Site(site_ids) => site_ids.iter().any(|id| *id == record.site_id),
            Self::Region {
                site_ids,
                unassigned,
                configured,
            } => {
                site_ids.iter().any(|id| *id == record.site_id)
                    || (*unassigned && !configured.iter().any(|id| *id == record.site_id))
            }
            Self::EnrollmentCategory(categories) => record
                .enrollment_category
                .as_deref()
                .is_some_and(|c| any_eq_ignore_case(categories, c)),
            Self::MinAge(min) => record.age >= *min,
            Self::MaxAge(max) => record.age <= *max,
            Self::EnrolledAfter(date) => record.enrollment_date >= *date,
            Self::EnrolledBefore(date) => record.enrollment_date <= *date,
            Self::Condition(names) => names.iter().any(|n| record.has_comorbidity(n)),
            Self::Medication(names) => names.iter().any(|n| record.takes_medication(n)),
            Self::MinBmi(min) => record.bmi >= *min,
            Self::MaxBmi(max) => record.bmi <= *max,
            Self::NoEvidence => false,
        }
    }
}

impl FilterCriteria<PatientRecord> for CompiledBlock {
    fn meets_criteria(&self, record: &PatientRecord) -> bool {
        self.predicates.iter().all(|p| p.meets_criteria(record))
    }
}

/// Compiled inclusion and exclusion criteria
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CohortFilter {
    inclusion: Vec<CompiledBlock>,
    exclusion: Vec<CompiledBlock>,
}

impl CohortFilter {
    /// Compile inclusion and exclusion blocks
    ///
    /// Blocks without options are dropped. Any malformed option fails the
    /// whole compilation.
    pub fn compile(
        inclusion: &[CriteriaBlock],
        exclusion: &[CriteriaBlock],
        sites: &[Site],
    ) -> Result<Self> {
        let compile_all = |blocks: &[CriteriaBlock]| -> Result<Vec<CompiledBlock>> {
            let mut compiled = Vec::with_capacity(blocks.len());
            for block in blocks {
                if let Some(block) = CompiledBlock::compile(block, sites)? {
                    compiled.push(block);
                }
            }
            Ok(compiled)
        };

        Ok(Self {
            inclusion: compile_all(inclusion)?,
            exclusion: compile_all(exclusion)?,
        })
    }

    /// Whether no effective criteria remain
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inclusion.is_empty() && self.exclusion.is_empty()
    }
}

impl FilterCriteria<PatientRecord> for CohortFilter {
    fn meets_criteria(&self, record: &PatientRecord) -> bool {
        self.inclusion.iter().all(|b| b.meets_criteria(record))
            && !self.exclusion.iter().any(|b| b.meets_criteria(record))
    }
}

/// Select the records that satisfy the inclusion and exclusion criteria
///
/// Deterministic and order-preserving; the input is left untouched. With no
/// effective criteria the whole population is returned.
pub fn filter_cohort(
    records: &[PatientRecord],
    inclusion: &[CriteriaBlock],
    exclusion: &[CriteriaBlock],
    sites: &[Site],
) -> Result<Vec<PatientRecord>> {
    let filter = CohortFilter::compile(inclusion, exclusion, sites)?;
    if filter.is_empty() {
        return Ok(records.to_vec());
    }

    let cohort: Vec<PatientRecord> = records
        .iter()
        .filter(|r| filter.meets_criteria(*r))
        .cloned()
        .collect();

    log::debug!(
        "Cohort filter kept {} of {} records",
        cohort.len(),
        records.len()
    );
    Ok(cohort)
}

/// Size of the cohort selected by the criteria
pub fn apply_criteria(
    records: &[PatientRecord],
    inclusion: &[CriteriaBlock],
    exclusion: &[CriteriaBlock],
    sites: &[Site],
) -> Result<usize> {
    let filter = CohortFilter::compile(inclusion, exclusion, sites)?;
    Ok(records.iter().filter(|r| filter.meets_criteria(*r)).count())
}
