//! Configuration for the cohort metrics engine.
//!
//! Engine-wide settings live in [`EngineConfig`]; per-study shapes and
//! metric registries live in the [`StudyCatalog`].

pub mod distribution;
pub mod study;

use std::fmt;

use chrono::NaiveDate;

pub use distribution::{BoundedRange, DateRange, DistributionConfig, EnrollmentCategory};
pub use study::{StudyCatalog, StudyDefinition, StudyTarget};

/// Configuration for the `CohortEngine`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Seed for population generation
    pub seed: u64,
    /// Reference date for enrollment statistics
    pub as_of: NaiveDate,
    /// Months past the target date that still count as "at risk"
    pub at_risk_tolerance_months: u32,
    /// Population size for studies that do not set one
    pub default_population_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            as_of: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap_or(NaiveDate::MIN),
            at_risk_tolerance_months: 3,
            default_population_size: 1000,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder for constructing engine configuration
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Engine Configuration:")?;
        writeln!(f, "  Seed: {}", self.seed)?;
        writeln!(f, "  As Of: {}", self.as_of)?;
        writeln!(f, "  At-Risk Tolerance: {} months", self.at_risk_tolerance_months)?;
        writeln!(f, "  Default Population Size: {}", self.default_population_size)?;
        Ok(())
    }
}

/// Builder for constructing engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set the random seed
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the reference date
    #[must_use]
    pub const fn as_of(mut self, date: NaiveDate) -> Self {
        self.config.as_of = date;
        self
    }

    /// Set the at-risk tolerance in months
    #[must_use]
    pub const fn at_risk_tolerance_months(mut self, months: u32) -> Self {
        self.config.at_risk_tolerance_months = months;
        self
    }

    /// Set the fallback population size
    #[must_use]
    pub const fn default_population_size(mut self, size: usize) -> Self {
        self.config.default_population_size = size;
        self
    }

    /// Build the engine configuration
    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
