//! Synthetic population generation for study dashboards
//!
//! This module samples patient records from a study's distribution config
//! and provides quick statistics over the result.

pub mod builder;
pub mod generator;
pub mod statistics;

// Re-export commonly used items
pub use builder::{Population, PopulationBuilder};
pub use generator::{DEFAULT_SITE_ID, STATUS_WEIGHTS, generate_population, patient_id};
pub use statistics::PopulationStats;
