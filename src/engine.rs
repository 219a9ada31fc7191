//! Study-level entry points for the dashboard
//!
//! `CohortEngine` binds an immutable study catalog to an engine
//! configuration and exposes the operations the presentation layer calls,
//! keyed by study id. Populations are regenerated from the configured seed
//! on every call, so repeated calls return identical results.

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::algorithm::cohort::{CohortSummary, CriteriaBlock, filter_cohort, summarize_cohort};
use crate::algorithm::enrollment::{EnrollmentOptions, EnrollmentStats, compute_enrollment_stats};
use crate::algorithm::metrics::{MetricSummary, aggregate};
use crate::algorithm::population::{Population, PopulationBuilder};
use crate::config::{EngineConfig, StudyCatalog, StudyDefinition};
use crate::error::Result;
use crate::models::PatientRecord;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Everything the dashboard shows for one study
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyReport {
    /// Study id
    pub study_id: String,
    /// Study name
    pub name: String,
    /// Every registered metric, in registry order
    pub metrics: Vec<MetricSummary>,
    /// Enrollment statistics
    pub enrollment: EnrollmentStats,
    /// Unfiltered cohort summary
    pub cohort: CohortSummary,
}

/// Population metrics and cohort engine
#[derive(Debug, Clone)]
pub struct CohortEngine {
    catalog: StudyCatalog,
    config: EngineConfig,
}

impl CohortEngine {
    /// Create an engine over a validated catalog
    #[must_use]
    pub const fn new(catalog: StudyCatalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Create an engine over the builtin catalog
    pub fn with_builtin_catalog(config: EngineConfig) -> Result<Self> {
        Ok(Self::new(StudyCatalog::builtin()?, config))
    }

    /// The study catalog
    #[must_use]
    pub const fn catalog(&self) -> &StudyCatalog {
        &self.catalog
    }

    /// The engine configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Look up a study definition
    pub fn study(&self, study_id: &str) -> Result<&StudyDefinition> {
        self.catalog.get(study_id)
    }

    /// Generate `count` patient records for a study
    pub fn generate_population(&self, study_id: &str, count: usize) -> Result<Vec<PatientRecord>> {
        let study = self.study(study_id)?;
        let population = PopulationBuilder::for_study(study)
            .with_count(count)
            .with_seed(self.config.seed)
            .build()?;
        Ok(population.records)
    }

    /// Generate the study's default-sized population
    pub fn population(&self, study_id: &str) -> Result<Population> {
        let study = self.study(study_id)?;
        let count = study
            .population_size
            .unwrap_or(self.config.default_population_size);
        PopulationBuilder::for_study(study)
            .with_count(count)
            .with_seed(self.config.seed)
            .build()
    }

    /// Aggregate one registered metric over the study population
    pub fn aggregate(&self, study_id: &str, metric_id: &str) -> Result<MetricSummary> {
        let study = self.study(study_id)?;
        let definition = study.metrics.lookup(study_id, metric_id)?;

        let population = self.population(study_id)?;
        Ok(aggregate(population.records(), definition))
    }

    /// Aggregate every registered metric, in registry order
    pub fn aggregate_all(&self, study_id: &str) -> Result<Vec<MetricSummary>> {
        let start = Instant::now();
        log_operation_start("Aggregating metrics", study_id);

        let study = self.study(study_id)?;
        let population = self.population(study_id)?;
        let records = population.records();

        let summaries: Vec<MetricSummary> = study
            .metrics
            .definitions()
            .par_iter()
            .map(|definition| aggregate(records, definition))
            .collect();

        log_operation_complete("aggregated", study_id, summaries.len(), Some(start.elapsed()));
        Ok(summaries)
    }

    /// Enrollment statistics as of the configured reference date
    pub fn compute_enrollment_stats(&self, study_id: &str) -> Result<EnrollmentStats> {
        let study = self.study(study_id)?;
        let population = self.population(study_id)?;

        let options = EnrollmentOptions {
            category_field: study.enrollment_metric,
            target: study.target,
            at_risk_tolerance_months: self.config.at_risk_tolerance_months,
        };

        Ok(compute_enrollment_stats(
            population.records(),
            &study.sites,
            self.config.as_of,
            &options,
        ))
    }

    /// Select a cohort by criteria and summarise its demographics
    pub fn filter_cohort(
        &self,
        study_id: &str,
        inclusion: &[CriteriaBlock],
        exclusion: &[CriteriaBlock],
    ) -> Result<CohortSummary> {
        let study = self.study(study_id)?;
        let population = self.population(study_id)?;

        let cohort = filter_cohort(population.records(), inclusion, exclusion, &study.sites)?;
        log::info!(
            "Cohort for study {study_id}: {} of {} patients ({} inclusion, {} exclusion blocks)",
            cohort.len(),
            population.len(),
            inclusion.len(),
            exclusion.len()
        );

        Ok(summarize_cohort(population.len(), &cohort, &study.sites))
    }

    /// Build the full dashboard report for a study
    pub fn study_report(&self, study_id: &str) -> Result<StudyReport> {
        let study = self.study(study_id)?;
        Ok(StudyReport {
            study_id: study.id.clone(),
            name: study.name.clone(),
            metrics: self.aggregate_all(study_id)?,
            enrollment: self.compute_enrollment_stats(study_id)?,
            cohort: self.filter_cohort(study_id, &[], &[])?,
        })
    }
}
