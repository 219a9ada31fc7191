//! Error handling for the cohort metrics engine.
//!
//! Every failure surfaced by the library is a local, recoverable
//! data-validation outcome. Out-of-range samples and empty populations are
//! not errors; they show up in the metric payloads instead.

use std::io;

/// Specialized error type for the cohort metrics engine
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// A study, distribution or metric definition failed validation
    #[error("Configuration error in {field}: {message}")]
    Config {
        /// Dotted path of the offending configuration field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// The requested study is not part of the loaded catalog
    #[error("Unknown study '{0}'")]
    UnknownStudy(String),

    /// The requested metric is not registered for the study
    #[error("Unknown metric '{metric_id}' for study '{study_id}'")]
    UnknownMetric {
        /// Study the lookup was made against
        study_id: String,
        /// Metric identifier that was not found
        metric_id: String,
    },

    /// A criteria block carries an option or value that cannot be evaluated
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    /// Error opening or reading a catalog file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error decoding catalog JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetricsError {
    /// Create a configuration error for a specific field
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unknown metric error
    pub fn unknown_metric(study_id: impl Into<String>, metric_id: impl Into<String>) -> Self {
        Self::UnknownMetric {
            study_id: study_id.into(),
            metric_id: metric_id.into(),
        }
    }

    /// Whether this error was raised while validating configuration
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

/// Result type for cohort metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;
