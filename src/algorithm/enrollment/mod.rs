//! Enrollment statistics and target-completion projection

pub mod projection;
pub mod stats;

pub use projection::{CompletionStatus, TargetCompletion, project_target_completion};
pub use stats::{
    EnrollmentOptions, EnrollmentStats, EnrollmentVelocity, MonthlyTrend, SiteEnrollment,
    TREND_MONTHS, TrendCategory, compute_enrollment_stats,
};
