//! Enrollment statistics
//!
//! Trailing-window counts, monthly trends and per-category breakdowns of
//! enrollment, all measured relative to an `as_of` reference date.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::projection::{TargetCompletion, project_target_completion};
use crate::algorithm::metrics::{CategoryCount, MetricField, UNKNOWN_CATEGORY, categorical_metric};
use crate::config::StudyTarget;
use crate::models::{PatientRecord, Site};
use crate::utils::{MonthPeriod, months_before, percentage, round_to};

/// Number of calendar months covered by the trend series
pub const TREND_MONTHS: u32 = 12;

/// Options that vary per study
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrollmentOptions {
    /// Field used for category breakdowns
    pub category_field: MetricField,
    /// Optional enrollment target
    pub target: Option<StudyTarget>,
    /// Months past the target date that still count as at-risk
    pub at_risk_tolerance_months: u32,
}

impl Default for EnrollmentOptions {
    fn default() -> Self {
        Self {
            category_field: MetricField::EnrollmentCategory,
            target: None,
            at_risk_tolerance_months: 3,
        }
    }
}

/// Short-window enrollment rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentVelocity {
    /// Enrolled in the trailing 7 days
    pub this_week: usize,
    /// Enrolled in the trailing 30 days
    pub this_month: usize,
    /// `this_month / 30`, rounded to a whole patient
    pub daily_average: u32,
}

/// Enrollment count of one category within a month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendCategory {
    /// Category label
    pub category: String,
    /// Enrolled in the month
    pub enrolled: usize,
}

/// One month of the enrollment trend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTrend {
    /// Short month label, e.g. `"Jan"`
    pub month: String,
    /// Month key, `"YYYY-MM"`
    pub period: String,
    /// Enrolled during the month
    pub enrolled: usize,
    /// Running total across the trend series
    pub cumulative: usize,
    /// Enrolled during the month per category
    pub breakdown: Vec<TrendCategory>,
}

/// Enrollment per configured site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEnrollment {
    /// Site id
    pub site_id: String,
    /// Site name
    pub name: String,
    /// Site region
    pub region: String,
    /// Patients enrolled at the site
    pub enrolled: usize,
    /// Share of all enrolled patients
    pub percentage: f64,
}

/// Enrollment summary for a study dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStats {
    /// Patients enrolled on or before the reference date
    pub total_patients: usize,
    /// Enrolled within one calendar month of the reference date
    pub new_patients_last_month: usize,
    /// Enrolled within twelve calendar months of the reference date
    pub new_patients_last_12_months: usize,
    /// Mean enrollments per month over the last twelve months, one decimal
    pub average_monthly_enrollment: f64,
    /// Short-window rates
    pub enrollment_velocity: EnrollmentVelocity,
    /// Enrolled patients by category
    pub breakdowns: Vec<CategoryCount>,
    /// Enrolled patients by configured site
    pub site_breakdown: Vec<SiteEnrollment>,
    /// Trailing twelve calendar months, oldest first
    pub monthly_trends: Vec<MonthlyTrend>,
    /// Projection against the study target, when one is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_completion: Option<TargetCompletion>,
}

/// Compute enrollment statistics relative to `as_of`
///
/// Records enrolled after `as_of` are ignored. Month windows use calendar
/// arithmetic: "last month" is `[as_of - 1 month, as_of]`.
#[must_use]
pub fn compute_enrollment_stats(
    records: &[PatientRecord],
    sites: &[Site],
    as_of: NaiveDate,
    options: &EnrollmentOptions,
) -> EnrollmentStats {
    let enrolled: Vec<&PatientRecord> = records.iter().filter(|r| r.enrolled_by(as_of)).collect();
    let total_patients = enrolled.len();

    let count_since = |start: NaiveDate| {
        enrolled
            .iter()
            .filter(|r| r.enrolled_between(start, as_of))
            .count()
    };

    let new_patients_last_month = count_since(months_before(as_of, 1));
    let new_patients_last_12_months = count_since(months_before(as_of, TREND_MONTHS));
    let average_monthly = new_patients_last_12_months as f64 / f64::from(TREND_MONTHS);

    let this_week = count_since(as_of - Duration::days(6));
    let this_month = count_since(as_of - Duration::days(29));
    let enrollment_velocity = EnrollmentVelocity {
        this_week,
        this_month,
        daily_average: (this_month as f64 / 30.0).round() as u32,
    };

    let breakdowns = categorical_metric(
        "enrollment",
        "Enrollment",
        enrolled.iter().map(|r| options.category_field.category_value(r)),
    )
    .categories;

    let category_order: Vec<&str> = breakdowns.iter().map(|c| c.category.as_str()).collect();
    let monthly_trends = monthly_trends(&enrolled, as_of, options.category_field, &category_order);

    let site_breakdown = sites
        .iter()
        .map(|site| {
            let count = enrolled.iter().filter(|r| r.site_id == site.id).count();
            SiteEnrollment {
                site_id: site.id.clone(),
                name: site.name.clone(),
                region: site.region.clone(),
                enrolled: count,
                percentage: percentage(count, total_patients),
            }
        })
        .collect();

    let target_completion = options.target.as_ref().map(|target| {
        project_target_completion(
            target,
            total_patients,
            average_monthly,
            as_of,
            options.at_risk_tolerance_months,
        )
    });

    EnrollmentStats {
        total_patients,
        new_patients_last_month,
        new_patients_last_12_months,
        average_monthly_enrollment: round_to(average_monthly, 1),
        enrollment_velocity,
        breakdowns,
        site_breakdown,
        monthly_trends,
        target_completion,
    }
}

fn monthly_trends(
    enrolled: &[&PatientRecord],
    as_of: NaiveDate,
    field: MetricField,
    category_order: &[&str],
) -> Vec<MonthlyTrend> {
    let mut cumulative = 0;

    MonthPeriod::from_date(as_of)
        .trailing(TREND_MONTHS)
        .into_iter()
        .map(|period| {
            let in_month: Vec<&&PatientRecord> = enrolled
                .iter()
                .filter(|r| period.contains(&r.enrollment_date))
                .collect();
            cumulative += in_month.len();

            let breakdown = category_order
                .iter()
                .map(|&category| TrendCategory {
                    category: category.to_string(),
                    enrolled: in_month
                        .iter()
                        .filter(|r| {
                            field
                                .category_value(r)
                                .as_deref()
                                .unwrap_or(UNKNOWN_CATEGORY)
                                == category
                        })
                        .count(),
                })
                .collect();

            MonthlyTrend {
                month: period.short_label(),
                period: period.to_string(),
                enrolled: in_month.len(),
                cumulative,
                breakdown,
            }
        })
        .collect()
}
