//! Algorithm implementations for the population metrics engine
//!
//! This module contains the sampling primitives, the synthetic population
//! generator, metric aggregation, enrollment statistics and cohort
//! selection.

pub mod cohort;
pub mod enrollment;
pub mod metrics;
pub mod population;
pub mod sampling;
