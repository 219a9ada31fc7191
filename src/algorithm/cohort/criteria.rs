//! Cohort criteria blocks
//!
//! A criteria block is what the cohort explorer sends: a criterion type and
//! an ordered list of option/value pairs. Blocks are compiled into typed
//! predicates before any record is evaluated, so malformed criteria fail
//! up front instead of silently matching nothing.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::models::{Gender, PatientStatus, Site};
use crate::utils::logging::log_warning;

use super::demographics::UNASSIGNED_REGION;

/// Taxonomy of criteria blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CriterionType {
    /// Demographic or enrollment attributes of the patient
    PatientAttribute,
    /// Recorded comorbidities
    Diagnosis,
    /// Recorded medications
    Medication,
    /// Observed vitals such as BMI
    Observation,
    /// Procedures performed
    Procedure,
    /// Laboratory results
    Lab,
    /// Free-text clinical notes
    Note,
}

impl fmt::Display for CriterionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PatientAttribute => "patient-attribute",
            Self::Diagnosis => "diagnosis",
            Self::Medication => "medication",
            Self::Observation => "observation",
            Self::Procedure => "procedure",
            Self::Lab => "lab",
            Self::Note => "note",
        };
        f.write_str(label)
    }
}

/// One option of a criteria block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionOption {
    /// Option key, e.g. `minAge`
    pub option: String,
    /// Option value; comma-separated values are alternatives
    pub value: String,
}

/// A block of criteria as submitted by the cohort explorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaBlock {
    /// Criterion type
    #[serde(rename = "type")]
    pub criterion_type: CriterionType,
    /// Ordered option/value pairs, all of which must hold
    #[serde(default)]
    pub options: Vec<CriterionOption>,
    /// Whether the block is expanded in the explorer; no effect on evaluation
    #[serde(default)]
    pub open: bool,
}

impl CriteriaBlock {
    /// Create an empty block of the given type
    #[must_use]
    pub const fn new(criterion_type: CriterionType) -> Self {
        Self {
            criterion_type,
            options: Vec::new(),
            open: false,
        }
    }

    /// Append an option
    #[must_use]
    pub fn with_option(mut self, option: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(CriterionOption {
            option: option.into(),
            value: value.into(),
        });
        self
    }
}

/// A single typed check against a patient record
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Gender is one of the listed values
    Gender(Vec<Gender>),
    /// Race is one of the listed values (case-insensitive)
    Race(Vec<String>),
    /// Ethnicity is one of the listed values (case-insensitive)
    Ethnicity(Vec<String>),
    /// Status is one of the listed values
    Status(Vec<PatientStatus>),
    /// Site id is one of the listed values
    Site(Vec<String>),
    /// Site lies in one of the requested regions
    Region {
        /// Configured sites in the requested regions
        site_ids: Vec<String>,
        /// Also match records whose site is not configured
        unassigned: bool,
        /// Every configured site id
        configured: Vec<String>,
    },
    /// Enrollment category is one of the listed values (case-insensitive)
    EnrollmentCategory(Vec<String>),
    /// Age at least the given value
    MinAge(u32),
    /// Age at most the given value
    MaxAge(u32),
    /// Enrolled on or after the given date
    EnrolledAfter(NaiveDate),
    /// Enrolled on or before the given date
    EnrolledBefore(NaiveDate),
    /// Has any of the listed comorbidities
    Condition(Vec<String>),
    /// Takes any of the listed medications
    Medication(Vec<String>),
    /// BMI at least the given value
    MinBmi(f64),
    /// BMI at most the given value
    MaxBmi(f64),
    /// Requires data synthetic records do not carry; never matches
    NoEvidence,
}

/// A criteria block compiled into predicates
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBlock {
    /// Type of the source block
    pub criterion_type: CriterionType,
    /// Predicates, all of which must hold
    pub predicates: Vec<Predicate>,
}

impl CompiledBlock {
    /// Compile a block; returns `None` for blocks without options
    ///
    /// `sites` resolves `region` options into the site ids of that region.
    pub fn compile(block: &CriteriaBlock, sites: &[Site]) -> Result<Option<Self>> {
        if block.options.is_empty() {
            log::debug!("Ignoring {} criteria block without options", block.criterion_type);
            return Ok(None);
        }

        let predicates = match block.criterion_type {
            CriterionType::Procedure | CriterionType::Lab | CriterionType::Note => {
                log_warning(
                    "Synthetic records carry no data for criteria type",
                    Some(&block.criterion_type.to_string()),
                );
                vec![Predicate::NoEvidence]
            }
            criterion_type => block
                .options
                .iter()
                .map(|opt| compile_option(criterion_type, opt, sites))
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(Some(Self {
            criterion_type: block.criterion_type,
            predicates,
        }))
    }
}

fn compile_option(
    criterion_type: CriterionType,
    opt: &CriterionOption,
    sites: &[Site],
) -> Result<Predicate> {
    let predicate = match (criterion_type, opt.option.as_str()) {
        (CriterionType::PatientAttribute, "gender") => Predicate::Gender(
            required_values(opt)?
                .iter()
                .map(|v| parse_gender(v))
                .collect::<Result<_>>()?,
        ),
        (CriterionType::PatientAttribute, "race") => Predicate::Race(required_values(opt)?),
        (CriterionType::PatientAttribute, "ethnicity") => {
            Predicate::Ethnicity(required_values(opt)?)
        }
        (CriterionType::PatientAttribute, "status") => Predicate::Status(
            required_values(opt)?
                .iter()
                .map(|v| {
                    PatientStatus::parse(v)
                        .ok_or_else(|| invalid(opt, "expected active, completed or withdrawn"))
                })
                .collect::<Result<_>>()?,
        ),
        (CriterionType::PatientAttribute, "siteId") => Predicate::Site(required_values(opt)?),
        (CriterionType::PatientAttribute, "region") => compile_region(opt, sites)?,
        (CriterionType::PatientAttribute, "enrollmentCategory") => {
            Predicate::EnrollmentCategory(required_values(opt)?)
        }
        (CriterionType::PatientAttribute, "minAge") => Predicate::MinAge(parse_number(opt)?),
        (CriterionType::PatientAttribute, "maxAge") => Predicate::MaxAge(parse_number(opt)?),
        (CriterionType::PatientAttribute, "enrolledAfter") => {
            Predicate::EnrolledAfter(parse_date(opt)?)
        }
        (CriterionType::PatientAttribute, "enrolledBefore") => {
            Predicate::EnrolledBefore(parse_date(opt)?)
        }
        (CriterionType::Diagnosis, "condition") => Predicate::Condition(required_values(opt)?),
        (CriterionType::Medication, "medication") => Predicate::Medication(required_values(opt)?),
        (CriterionType::Observation, "minBmi") => Predicate::MinBmi(parse_bound(opt)?),
        (CriterionType::Observation, "maxBmi") => Predicate::MaxBmi(parse_bound(opt)?),
        _ => {
            return Err(MetricsError::InvalidCriteria(format!(
                "unsupported option '{}' for {criterion_type} criteria",
                opt.option
            )));
        }
    };

    Ok(predicate)
}

fn required_values(opt: &CriterionOption) -> Result<Vec<String>> {
    let values: Vec<String> = opt
        .value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .collect();

    if values.is_empty() {
        return Err(invalid(opt, "expected at least one value"));
    }
    Ok(values)
}

/// Resolve regions to the configured sites in them
///
/// `Unassigned` selects records whose site is not configured, mirroring the
/// region split of cohort demographics.
fn compile_region(opt: &CriterionOption, sites: &[Site]) -> Result<Predicate> {
    let mut site_ids = Vec::new();
    let mut unassigned = false;

    for region in required_values(opt)? {
        if region.eq_ignore_ascii_case(UNASSIGNED_REGION) {
            unassigned = true;
            continue;
        }

        let matching: Vec<String> = sites
            .iter()
            .filter(|s| s.region.eq_ignore_ascii_case(&region))
            .map(|s| s.id.clone())
            .collect();
        if matching.is_empty() {
            return Err(MetricsError::InvalidCriteria(format!(
                "region '{region}' has no configured sites"
            )));
        }
        site_ids.extend(matching);
    }

    Ok(Predicate::Region {
        site_ids,
        unassigned,
        configured: sites.iter().map(|s| s.id.clone()).collect(),
    })
}

fn parse_gender(value: &str) -> Result<Gender> {
    match value.to_lowercase().as_str() {
        "male" | "m" => Ok(Gender::Male),
        "female" | "f" => Ok(Gender::Female),
        "other" => Ok(Gender::Other),
        other => Err(MetricsError::InvalidCriteria(format!(
            "unknown gender '{other}'"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(opt: &CriterionOption) -> Result<T> {
    opt.value
        .trim()
        .parse::<T>()
        .map_err(|_| invalid(opt, "expected a number"))
}

fn parse_bound(opt: &CriterionOption) -> Result<f64> {
    let bound: f64 = parse_number(opt)?;
    if !bound.is_finite() {
        return Err(invalid(opt, "expected a finite number"));
    }
    Ok(bound)
}

fn parse_date(opt: &CriterionOption) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(opt.value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(opt, "expected a YYYY-MM-DD date"))
}

fn invalid(opt: &CriterionOption, expected: &str) -> MetricsError {
    MetricsError::InvalidCriteria(format!(
        "option '{}' has value '{}': {expected}",
        opt.option, opt.value
    ))
}
