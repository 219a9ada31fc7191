//! Sampling primitives for synthetic population generation
//!
//! Weighted distributions are ordered lists of `(value, weight)` pairs. The
//! cumulative walk in [`weighted_choice`] visits entries in list order, so a
//! seeded RNG always lands on the same entry for the same list.

use std::f64::consts::PI;

use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One entry of an ordered weighted distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEntry<T> {
    /// The value drawn when this entry is selected
    pub value: T,
    /// Probability weight; entries of a distribution sum to 1
    pub weight: f64,
}

impl<T> WeightedEntry<T> {
    /// Create a new weighted entry
    pub const fn new(value: T, weight: f64) -> Self {
        Self { value, weight }
    }
}

/// Draw one value from an ordered weighted distribution
///
/// Draws `r` uniformly from `[0, 1)` and returns the first entry whose
/// cumulative weight reaches `r`. If rounding leaves the cumulative sum just
/// below `r`, the first entry is returned. Returns `None` only for an empty
/// distribution.
pub fn weighted_choice<'a, T, R: Rng>(
    entries: &'a [WeightedEntry<T>],
    rng: &mut R,
) -> Option<&'a T> {
    let first = entries.first()?;
    let r: f64 = rng.random();

    let mut cumulative = 0.0;
    for entry in entries {
        cumulative += entry.weight;
        if cumulative >= r {
            return Some(&entry.value);
        }
    }

    Some(&first.value)
}

/// Draw from a clamped, approximately normal distribution centred on `mode`
///
/// A standard normal deviate is produced with the Box-Muller transform,
/// scaled by `(max - min) / 6` and shifted by `mode`, then clamped into
/// `[min, max]`. Clamping piles the tails onto the bounds and the mean
/// drifts away from `mode` when it is off-centre, so this is a reproducible
/// approximation rather than a true normal distribution.
pub fn bounded_approx_normal<R: Rng>(min: f64, max: f64, mode: f64, rng: &mut R) -> f64 {
    // 1 - [0, 1) keeps u1 away from zero so ln(u1) stays finite
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();

    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    let std_dev = (max - min) / 6.0;

    (mode + z * std_dev).clamp(min, max)
}

/// Pick each pool item independently with probability `p`
///
/// The subset keeps pool order and its size is binomially distributed.
pub fn independent_subset<R: Rng>(pool: &[String], p: f64, rng: &mut R) -> Vec<String> {
    pool.iter()
        .filter(|_| rng.random::<f64>() < p)
        .cloned()
        .collect()
}

/// Draw a date uniformly from the inclusive range `[start, end]`
pub fn uniform_date<R: Rng>(start: NaiveDate, end: NaiveDate, rng: &mut R) -> NaiveDate {
    let span = (end - start).num_days().max(0);
    let offset = rng.random_range(0..=span);
    start + Duration::days(offset)
}

/// Sum of all weights in a distribution
#[must_use]
pub fn total_weight<T>(entries: &[WeightedEntry<T>]) -> f64 {
    entries.iter().map(|e| e.weight).sum()
}
