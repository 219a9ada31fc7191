//! Metric definitions and the per-study metric registry
//!
//! A metric definition declares which record field is measured and whether
//! it is summarised as a categorical distribution or as numeric buckets.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::models::PatientRecord;

/// Label of the category that collects records without a value
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Upper limit on equal-width buckets per numerical metric
pub const MAX_BUCKETS: usize = 100;

/// Record field a metric is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricField {
    /// Age in years
    Age,
    /// Gender label
    Gender,
    /// Body mass index
    Bmi,
    /// Race category
    Race,
    /// Ethnicity label
    Ethnicity,
    /// Participation status
    Status,
    /// Enrolling site
    SiteId,
    /// Study-specific enrollment category
    EnrollmentCategory,
    /// Number of comorbidities on the record
    #[serde(rename = "comorbidity_count", alias = "comorbidityCount")]
    ComorbidityCount,
    /// Number of medications on the record
    #[serde(rename = "medication_count", alias = "medicationCount")]
    MedicationCount,
}

impl MetricField {
    /// Whether the field resolves to a number
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Age | Self::Bmi | Self::ComorbidityCount | Self::MedicationCount
        )
    }

    /// Resolve the field to a numeric sample, if it is numeric
    #[must_use]
    pub fn numeric_value(self, record: &PatientRecord) -> Option<f64> {
        match self {
            Self::Age => Some(f64::from(record.age)),
            Self::Bmi => Some(record.bmi),
            Self::ComorbidityCount => Some(record.comorbidities.len() as f64),
            Self::MedicationCount => Some(record.medications.len() as f64),
            _ => None,
        }
    }

    /// Resolve the field to its category label; `None` means missing
    #[must_use]
    pub fn category_value(self, record: &PatientRecord) -> Option<String> {
        match self {
            Self::Age => Some(record.age.to_string()),
            Self::Gender => Some(record.gender.as_str().to_string()),
            Self::Bmi => Some(format!("{:.1}", record.bmi)),
            Self::Race => Some(record.race.clone()),
            Self::Ethnicity => Some(record.ethnicity.clone()),
            Self::Status => Some(record.status.as_str().to_string()),
            Self::SiteId => Some(record.site_id.clone()),
            Self::EnrollmentCategory => record.enrollment_category.clone(),
            Self::ComorbidityCount => Some(record.comorbidities.len().to_string()),
            Self::MedicationCount => Some(record.medications.len().to_string()),
        }
    }

    /// Source name as written in catalog JSON
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Bmi => "bmi",
            Self::Race => "race",
            Self::Ethnicity => "ethnicity",
            Self::Status => "status",
            Self::SiteId => "siteId",
            Self::EnrollmentCategory => "enrollmentCategory",
            Self::ComorbidityCount => "comorbidity_count",
            Self::MedicationCount => "medication_count",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a metric is summarised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Counts per distinct observed value
    Categorical,
    /// Counts per numeric range plus summary statistics
    Numerical,
}

/// An explicit `[min, max)` range with a display label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomBucket {
    /// Display label
    pub label: String,
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (exclusive, inclusive for the last bucket)
    pub max: f64,
}

impl CustomBucket {
    /// Create a new custom bucket
    pub fn new(label: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            label: label.into(),
            min,
            max,
        }
    }
}

/// Declaration of one measurable field for a study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    /// Identifier used by `aggregate`
    pub id: String,
    /// Display name
    pub name: String,
    /// Categorical or numerical summary
    #[serde(rename = "type")]
    pub kind: MetricKind,
    /// Field (or derived field) being measured
    pub source: MetricField,
    /// Number of equal-width buckets over the observed range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buckets: Option<usize>,
    /// Explicit ordered buckets; take precedence over `buckets`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_buckets: Option<Vec<CustomBucket>>,
}

impl MetricDefinition {
    /// A categorical metric over `source`
    pub fn categorical(id: impl Into<String>, name: impl Into<String>, source: MetricField) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: MetricKind::Categorical,
            source,
            buckets: None,
            custom_buckets: None,
        }
    }

    /// A numerical metric with `count` equal-width buckets
    pub fn numerical(
        id: impl Into<String>,
        name: impl Into<String>,
        source: MetricField,
        count: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: MetricKind::Numerical,
            source,
            buckets: Some(count),
            custom_buckets: None,
        }
    }

    /// A numerical metric with explicit buckets
    pub fn numerical_custom(
        id: impl Into<String>,
        name: impl Into<String>,
        source: MetricField,
        buckets: Vec<CustomBucket>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: MetricKind::Numerical,
            source,
            buckets: None,
            custom_buckets: Some(buckets),
        }
    }

    /// Check the bucket invariants of numerical definitions
    pub fn validate(&self, prefix: &str) -> Result<()> {
        let field = format!("{prefix}.{}", self.id);

        if self.kind == MetricKind::Categorical {
            return Ok(());
        }

        if !self.source.is_numeric() {
            return Err(MetricsError::config(
                field,
                format!("numerical metric cannot use non-numeric source '{}'", self.source),
            ));
        }

        match (&self.custom_buckets, self.buckets) {
            (Some(custom), _) => validate_custom_buckets(&field, custom),
            (None, Some(0)) => Err(MetricsError::config(field, "bucket count must be at least 1")),
            (None, Some(count)) if count > MAX_BUCKETS => Err(MetricsError::config(
                field,
                format!("bucket count {count} exceeds the limit of {MAX_BUCKETS}"),
            )),
            (None, Some(_)) => Ok(()),
            (None, None) => Err(MetricsError::config(
                field,
                "numerical metric needs either buckets or customBuckets",
            )),
        }
    }
}

fn validate_custom_buckets(field: &str, buckets: &[CustomBucket]) -> Result<()> {
    if buckets.is_empty() {
        return Err(MetricsError::config(field, "customBuckets is empty"));
    }

    for bucket in buckets {
        if !(bucket.min < bucket.max) {
            return Err(MetricsError::config(
                field,
                format!("bucket '{}' has min >= max", bucket.label),
            ));
        }
    }

    for pair in buckets.windows(2) {
        if pair[1].min < pair[0].max {
            return Err(MetricsError::config(
                field,
                format!(
                    "bucket '{}' overlaps or precedes '{}'",
                    pair[1].label, pair[0].label
                ),
            ));
        }
    }

    Ok(())
}

/// The ordered set of metrics a study exposes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricRegistry {
    definitions: Vec<MetricDefinition>,
}

impl MetricRegistry {
    /// Create a registry from definitions, in display order
    #[must_use]
    pub const fn new(definitions: Vec<MetricDefinition>) -> Self {
        Self { definitions }
    }

    /// Look up a definition by id
    #[must_use]
    pub fn get(&self, metric_id: &str) -> Option<&MetricDefinition> {
        self.definitions.iter().find(|d| d.id == metric_id)
    }

    /// Look up a definition, reporting unknown ids as errors
    pub fn lookup(&self, study_id: &str, metric_id: &str) -> Result<&MetricDefinition> {
        self.get(metric_id)
            .ok_or_else(|| MetricsError::unknown_metric(study_id, metric_id))
    }

    /// All definitions in registry order
    #[must_use]
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    /// Number of registered metrics
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no metrics are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Validate every definition and reject duplicate ids
    pub fn validate(&self, prefix: &str) -> Result<()> {
        let mut seen = FxHashSet::default();
        for definition in &self.definitions {
            if !seen.insert(definition.id.as_str()) {
                return Err(MetricsError::config(
                    format!("{prefix}.{}", definition.id),
                    "duplicate metric id",
                ));
            }
            definition.validate(prefix)?;
        }
        Ok(())
    }
}
