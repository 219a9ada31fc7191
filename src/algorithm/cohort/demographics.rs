//! Demographic projections of a filtered cohort
//!
//! These are plain re-aggregations of the cohort records; no separate
//! estimation is involved.

use serde::Serialize;

use crate::algorithm::metrics::{
    CategoricalMetric, CustomBucket, MetricDefinition, MetricField, NumericalMetric,
    categorical_metric, numerical_metric,
};
use crate::models::{PatientRecord, Site};

/// Region label for records whose site is not configured
pub const UNASSIGNED_REGION: &str = "Unassigned";

/// Gender, age-group and region split of a cohort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortDemographics {
    /// Gender distribution
    pub gender: CategoricalMetric,
    /// Age-group distribution
    pub age: NumericalMetric,
    /// Region distribution, resolved through the enrolling site
    pub region: CategoricalMetric,
}

/// Result of applying cohort criteria to a study population
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortSummary {
    /// Size of the unfiltered population
    pub population_size: usize,
    /// Size of the selected cohort
    pub cohort_size: usize,
    /// Demographic split of the cohort
    pub demographics: CohortDemographics,
}

/// Age groups used for cohort projections
#[must_use]
pub fn age_group_buckets() -> Vec<CustomBucket> {
    vec![
        CustomBucket::new("18-29", 18.0, 30.0),
        CustomBucket::new("30-44", 30.0, 45.0),
        CustomBucket::new("45-59", 45.0, 60.0),
        CustomBucket::new("60-74", 60.0, 75.0),
        CustomBucket::new("75+", 75.0, 120.0),
    ]
}

/// Compute the demographic split of `cohort`
#[must_use]
pub fn cohort_demographics(cohort: &[PatientRecord], sites: &[Site]) -> CohortDemographics {
    let gender = categorical_metric(
        "gender",
        "Gender",
        cohort.iter().map(|r| MetricField::Gender.category_value(r)),
    );

    let age_definition =
        MetricDefinition::numerical_custom("age", "Age Group", MetricField::Age, age_group_buckets());
    let ages: Vec<f64> = cohort.iter().map(|r| f64::from(r.age)).collect();
    let age = numerical_metric(&age_definition, &ages);

    let region = categorical_metric(
        "region",
        "Region",
        cohort.iter().map(|r| {
            Some(
                sites
                    .iter()
                    .find(|s| s.id == r.site_id)
                    .map_or(UNASSIGNED_REGION, |s| s.region.as_str())
                    .to_string(),
            )
        }),
    );

    CohortDemographics { gender, age, region }
}

/// Summarise a cohort against the population it was drawn from
#[must_use]
pub fn summarize_cohort(
    population_size: usize,
    cohort: &[PatientRecord],
    sites: &[Site],
) -> CohortSummary {
    CohortSummary {
        population_size,
        cohort_size: cohort.len(),
        demographics: cohort_demographics(cohort, sites),
    }
}
