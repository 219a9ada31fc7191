//! Shared utilities: calendar arithmetic, rounding and logging helpers

pub mod logging;
pub mod time_period;

use itertools::Itertools;

pub use time_period::{MonthPeriod, months_after, months_before};

/// Round to a fixed number of decimal places
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Percentage of `count` in `total`, one decimal; zero when `total` is zero
#[must_use]
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(100.0 * count as f64 / total as f64, 1)
}

/// One-decimal percentages of `counts` that add up to exactly 100.0
///
/// Shares are computed in tenths of a percent with the largest-remainder
/// method: every share is floored, then the missing tenths go to the
/// largest remainders, ties to the earlier entry. All zeros when the
/// counts sum to zero.
#[must_use]
pub fn apportioned_percentages(counts: &[usize]) -> Vec<f64> {
    const TENTHS: usize = 1000;

    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }

    let mut tenths: Vec<usize> = counts.iter().map(|&c| c * TENTHS / total).collect();
    let remainders: Vec<usize> = counts.iter().map(|&c| c * TENTHS % total).collect();
    let missing = TENTHS - tenths.iter().sum::<usize>();

    for slot in (0..counts.len())
        .sorted_by(|&a, &b| remainders[b].cmp(&remainders[a]))
        .take(missing)
    {
        tenths[slot] += 1;
    }

    tenths.into_iter().map(|t| t as f64 / 10.0).collect()
}
