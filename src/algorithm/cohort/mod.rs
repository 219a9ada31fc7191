//! Cohort selection by inclusion and exclusion criteria
//!
//! Criteria blocks are compiled into per-record predicates and evaluated
//! against the generated population. Demographic projections of the
//! selected cohort reuse the metric aggregator.

pub mod criteria;
pub mod demographics;
pub mod filters;

// Re-export commonly used items
pub use criteria::{CompiledBlock, CriteriaBlock, CriterionOption, CriterionType, Predicate};
pub use demographics::{
    CohortDemographics, CohortSummary, UNASSIGNED_REGION, age_group_buckets, cohort_demographics,
    summarize_cohort,
};
pub use filters::{CohortFilter, FilterCriteria, apply_criteria, filter_cohort};
