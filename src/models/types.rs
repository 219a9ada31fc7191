//! Common domain type definitions
//!
//! This module contains the enum types shared by patient records,
//! distribution configs and cohort criteria.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Gender of a patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male gender
    Male,
    /// Female gender
    Female,
    /// Any other or unspecified gender
    Other,
}

impl Gender {
    /// Label used in records and metric categories
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participation status of an enrolled patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    /// Currently participating
    Active,
    /// Finished the study protocol
    Completed,
    /// Left the study early
    Withdrawn,
}

impl PatientStatus {
    /// Label used in records and metric categories
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Withdrawn => "withdrawn",
        }
    }

    /// Parse a status label, returning `None` for anything unrecognised
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "withdrawn" => Some(Self::Withdrawn),
            _ => None,
        }
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ethnicity label for patients sampled as Hispanic or Latino
pub const HISPANIC_LABEL: &str = "Hispanic or Latino";

/// Ethnicity label for everyone else
pub const NOT_HISPANIC_LABEL: &str = "Not Hispanic or Latino";

/// Map the sampled ethnicity flag to its reporting label
#[must_use]
pub const fn ethnicity_label(hispanic: bool) -> &'static str {
    if hispanic {
        HISPANIC_LABEL
    } else {
        NOT_HISPANIC_LABEL
    }
}
