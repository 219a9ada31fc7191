//! Metric definitions and aggregation
//!
//! This module turns a collection of patient records into the categorical
//! and numerical summaries the dashboard charts consume.

pub mod aggregate;
pub mod definition;

// Re-export commonly used items
pub use aggregate::{
    CategoricalMetric, CategoryCount, MetricSummary, NumericBucket, NumericalMetric,
    OUT_OF_RANGE_LABEL, SampleStats, aggregate, categorical_metric, numerical_metric,
};
pub use definition::{
    CustomBucket, MAX_BUCKETS, MetricDefinition, MetricField, MetricKind, MetricRegistry,
    UNKNOWN_CATEGORY,
};
