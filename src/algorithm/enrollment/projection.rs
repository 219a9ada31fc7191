//! Target-completion projection
//!
//! A linear extrapolation of the current monthly enrollment rate against a
//! study's enrollment target.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::StudyTarget;
use crate::utils::time_period::year_month;
use crate::utils::{months_after, round_to};

/// Whether a study is expected to reach its target in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionStatus {
    /// Projected to finish on or before the target date
    OnTrack,
    /// Projected to finish late, but within the tolerance window
    AtRisk,
    /// Projected to finish beyond the tolerance window, or not at all
    OffTrack,
}

/// Projection of when the enrollment target will be reached
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCompletion {
    /// Target date, serialized as `"YYYY-MM"`
    #[serde(with = "year_month")]
    pub target_date: NaiveDate,
    /// Projected completion, `None` when enrollment has stalled
    #[serde(serialize_with = "year_month::option::serialize")]
    pub projected_date: Option<NaiveDate>,
    /// Patients still needed
    pub remaining_patients: u32,
    /// Months needed at the current rate, one decimal
    pub months_remaining: Option<f64>,
    /// Current rate as a share of the rate needed to hit the target date (0-100)
    pub confidence: u8,
    /// On-track, at-risk or off-track
    pub status: CompletionStatus,
}

/// Project when `target` will be reached at `average_monthly` enrollments per month
///
/// `remaining / average_monthly` months are added to `as_of` (rounded up
/// to whole calendar months). A non-positive rate cannot be projected and
/// is reported as off-track without a date.
#[must_use]
pub fn project_target_completion(
    target: &StudyTarget,
    current_enrolled: usize,
    average_monthly: f64,
    as_of: NaiveDate,
    tolerance_months: u32,
) -> TargetCompletion {
    let current = u32::try_from(current_enrolled).unwrap_or(u32::MAX);
    let remaining = target.total.saturating_sub(current);

    if remaining == 0 {
        return TargetCompletion {
            target_date: target.target_date,
            projected_date: Some(as_of),
            remaining_patients: 0,
            months_remaining: Some(0.0),
            confidence: 100,
            status: CompletionStatus::OnTrack,
        };
    }

    if !(average_monthly > 0.0) || !average_monthly.is_finite() {
        return TargetCompletion {
            target_date: target.target_date,
            projected_date: None,
            remaining_patients: remaining,
            months_remaining: None,
            confidence: 0,
            status: CompletionStatus::OffTrack,
        };
    }

    let months_remaining = f64::from(remaining) / average_monthly;
    let projected = months_after(as_of, months_remaining.ceil() as u32);
    let tolerance_date = months_after(target.target_date, tolerance_months);

    let status = if projected <= target.target_date {
        CompletionStatus::OnTrack
    } else if projected <= tolerance_date {
        CompletionStatus::AtRisk
    } else {
        CompletionStatus::OffTrack
    };

    TargetCompletion {
        target_date: target.target_date,
        projected_date: Some(projected),
        remaining_patients: remaining,
        months_remaining: Some(round_to(months_remaining, 1)),
        confidence: confidence(remaining, average_monthly, as_of, target.target_date),
        status,
    }
}

fn confidence(remaining: u32, average_monthly: f64, as_of: NaiveDate, target_date: NaiveDate) -> u8 {
    let months_left = (target_date.year() * 12 + target_date.month() as i32)
        - (as_of.year() * 12 + as_of.month() as i32);
    if months_left <= 0 {
        return 0;
    }

    let required_rate = f64::from(remaining) / f64::from(months_left);
    (100.0 * average_monthly / required_rate).clamp(0.0, 100.0).round() as u8
}
