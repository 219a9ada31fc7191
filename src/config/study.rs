//! Study definitions and the study catalog
//!
//! The catalog is loaded once at start-up, validated as a whole, and then
//! shared read-only with the engine.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::distribution::DistributionConfig;
use crate::algorithm::metrics::{MetricField, MetricRegistry};
use crate::error::{MetricsError, Result};
use crate::models::Site;

/// Catalog shipped with the crate
const BUILTIN_CATALOG: &str = include_str!("../../data/studies.json");

/// Enrollment goal of a study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyTarget {
    /// Number of patients the study aims to enroll
    pub total: u32,
    /// Date by which the target should be reached
    pub target_date: NaiveDate,
}

/// Everything the engine needs to know about one study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyDefinition {
    /// Study identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Population shape
    pub distribution: DistributionConfig,
    /// Enrolling sites
    #[serde(default)]
    pub sites: Vec<Site>,
    /// Measurable fields
    #[serde(default)]
    pub metrics: MetricRegistry,
    /// Field used for per-category enrollment breakdowns
    #[serde(default = "default_enrollment_metric")]
    pub enrollment_metric: MetricField,
    /// Optional enrollment target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<StudyTarget>,
    /// Population size generated when none is requested explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population_size: Option<usize>,
}

const fn default_enrollment_metric() -> MetricField {
    MetricField::EnrollmentCategory
}

impl StudyDefinition {
    /// Validate the distribution, metric registry, sites and target
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(MetricsError::config("studies", "study id is empty"));
        }
        let prefix = format!("studies.{}", self.id);

        self.distribution
            .validate(&format!("{prefix}.distribution"))?;
        self.metrics.validate(&format!("{prefix}.metrics"))?;

        let mut site_ids = FxHashSet::default();
        for site in &self.sites {
            if !site_ids.insert(site.id.as_str()) {
                return Err(MetricsError::config(
                    format!("{prefix}.sites"),
                    format!("duplicate site id '{}'", site.id),
                ));
            }
        }

        if let Some(target) = &self.target {
            if target.total == 0 {
                return Err(MetricsError::config(
                    format!("{prefix}.target"),
                    "target total must be positive",
                ));
            }
        }

        Ok(())
    }

    /// Region of a site, if the site is known
    #[must_use]
    pub fn site_region(&self, site_id: &str) -> Option<&str> {
        self.sites
            .iter()
            .find(|s| s.id == site_id)
            .map(|s| s.region.as_str())
    }
}

/// Immutable set of study definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyCatalog {
    studies: Vec<StudyDefinition>,
}

impl StudyCatalog {
    /// Build a catalog from definitions, validating all of them
    pub fn new(studies: Vec<StudyDefinition>) -> Result<Self> {
        let catalog = Self { studies };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate catalog JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        log::debug!("Loaded catalog with {} studies", catalog.studies.len());
        Ok(catalog)
    }

    /// Read, parse and validate a catalog file
    pub fn from_path(path: &Path) -> Result<Self> {
        log::info!("Loading study catalog from {}", path.display());
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    /// Look up a study by id
    pub fn get(&self, study_id: &str) -> Result<&StudyDefinition> {
        self.studies
            .iter()
            .find(|s| s.id == study_id)
            .ok_or_else(|| MetricsError::UnknownStudy(study_id.to_string()))
    }

    /// All studies in catalog order
    #[must_use]
    pub fn studies(&self) -> &[StudyDefinition] {
        &self.studies
    }

    fn validate(&self) -> Result<()> {
        let mut ids = FxHashSet::default();
        for study in &self.studies {
            if !ids.insert(study.id.as_str()) {
                return Err(MetricsError::config(
                    "studies",
                    format!("duplicate study id '{}'", study.id),
                ));
            }
            study.validate()?;
        }
        Ok(())
    }
}
