//! Population builder implementation
//!
//! This module provides the builder pattern for constructing a seeded
//! synthetic study population step by step.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{DistributionConfig, StudyDefinition};
use crate::error::{MetricsError, Result};
use crate::models::{PatientRecord, Site};

use super::generator::generate_population;
use super::statistics::PopulationStats;

/// A generated study population
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    /// Study the records belong to
    pub study_id: String,
    /// Seed the records were generated with
    pub seed: u64,
    /// Generated records in index order
    pub records: Vec<PatientRecord>,
}

impl Population {
    /// Number of patients
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the population is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow the records
    #[must_use]
    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    /// Basic statistics for logging and summaries
    #[must_use]
    pub fn statistics(&self) -> PopulationStats {
        PopulationStats::calculate(&self.records)
    }

    /// Print a summary of the population
    #[must_use]
    pub fn print_summary(&self) -> String {
        self.statistics().summary(&self.study_id)
    }
}

/// Builder for constructing a population step by step
#[derive(Debug, Clone, Default)]
pub struct PopulationBuilder {
    /// Study the population is generated for
    study_id: String,
    /// Distribution to sample from
    config: Option<DistributionConfig>,
    /// Sites patients are assigned to
    sites: Vec<Site>,
    /// Number of records to generate
    count: usize,
    /// RNG seed
    seed: u64,
}

impl PopulationBuilder {
    /// Create a new population builder
    #[must_use]
    pub fn new(study_id: impl Into<String>) -> Self {
        Self {
            study_id: study_id.into(),
            ..Self::default()
        }
    }

    /// Start from a catalog study definition
    #[must_use]
    pub fn for_study(study: &StudyDefinition) -> Self {
        Self::new(study.id.clone())
            .with_config(study.distribution.clone())
            .with_sites(study.sites.clone())
            .with_count(study.population_size.unwrap_or_default())
    }

    /// Set the distribution config
    #[must_use]
    pub fn with_config(mut self, config: DistributionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the enrolling sites
    #[must_use]
    pub fn with_sites(mut self, sites: Vec<Site>) -> Self {
        self.sites = sites;
        self
    }

    /// Set the number of records
    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the RNG seed
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate the population
    pub fn build(self) -> Result<Population> {
        let config = self.config.ok_or_else(|| {
            MetricsError::config(
                format!("studies.{}.distribution", self.study_id),
                "no distribution config supplied",
            )
        })?;

        log::info!(
            "Building population of {} patients for study {} (seed {})",
            self.count,
            self.study_id,
            self.seed
        );

        let mut rng = StdRng::seed_from_u64(self.seed);
        let records = generate_population(&config, &self.sites, self.count, &self.study_id, &mut rng)?;

        Ok(Population {
            study_id: self.study_id,
            seed: self.seed,
            records,
        })
    }
}
