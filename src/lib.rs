//! Synthetic patient populations and cohort metrics for clinical study
//! dashboards.
//!
//! Populations are generated deterministically from a seed and a per-study
//! distribution config, then aggregated into categorical and numerical
//! metrics, enrollment statistics and filtered cohorts.

pub mod algorithm;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{DistributionConfig, EngineConfig, StudyCatalog, StudyDefinition};
pub use engine::{CohortEngine, StudyReport};
pub use error::{MetricsError, Result};
pub use models::{Gender, PatientRecord, PatientStatus, Site};

// Metrics
pub use algorithm::metrics::{
    CategoricalMetric, MetricDefinition, MetricField, MetricKind, MetricRegistry, MetricSummary,
    NumericalMetric, aggregate,
};

// Population generation
pub use algorithm::population::{Population, PopulationBuilder, generate_population};

// Enrollment and cohorts
pub use algorithm::cohort::{CohortSummary, CriteriaBlock, CriterionType, apply_criteria, filter_cohort};
pub use algorithm::enrollment::{EnrollmentStats, compute_enrollment_stats};
