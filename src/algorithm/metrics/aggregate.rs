//! Metric aggregation over patient records
//!
//! Categorical metrics count distinct observed values; numerical metrics
//! bucket numeric samples and report summary statistics. Both reconcile:
//! the bucket or category counts always add up to `total`.

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::definition::{CustomBucket, MetricDefinition, MetricKind, UNKNOWN_CATEGORY};
use crate::models::PatientRecord;
use crate::utils::{apportioned_percentages, round_to};

/// Label of the bucket holding samples outside every custom bucket
pub const OUT_OF_RANGE_LABEL: &str = "Out of range";

/// Count and share of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Observed value
    pub category: String,
    /// Number of records with this value
    pub count: usize,
    /// Share of all input records, one decimal
    pub percentage: f64,
}

/// Distribution of a field across its observed values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalMetric {
    /// Metric id
    pub id: String,
    /// Display name
    pub name: String,
    /// Categories by descending count, ties in first-seen order
    pub categories: Vec<CategoryCount>,
    /// Number of input records
    pub total: usize,
}

/// Count and share of one numeric range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericBucket {
    /// Display label
    pub bucket: String,
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Number of samples in the range
    pub count: usize,
    /// Share of all samples, one decimal
    pub percentage: f64,
    /// Set on the bucket that collects samples outside the configured ranges
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub out_of_range: bool,
}

/// Bucketed distribution of a numeric field plus summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalMetric {
    /// Metric id
    pub id: String,
    /// Display name
    pub name: String,
    /// Smallest observed sample
    pub min: f64,
    /// Largest observed sample
    pub max: f64,
    /// Mean of the observed samples, one decimal
    pub average: f64,
    /// Median of the observed samples, one decimal
    pub median: f64,
    /// Buckets in ascending order
    pub buckets: Vec<NumericBucket>,
    /// Number of samples
    pub total: usize,
}

/// Result of aggregating one metric, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetricSummary {
    /// Categorical distribution
    Categorical(CategoricalMetric),
    /// Numerical distribution
    Numerical(NumericalMetric),
}

impl MetricSummary {
    /// Metric id of either variant
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Categorical(m) => &m.id,
            Self::Numerical(m) => &m.id,
        }
    }

    /// Total count of either variant
    #[must_use]
    pub const fn total(&self) -> usize {
        match self {
            Self::Categorical(m) => m.total,
            Self::Numerical(m) => m.total,
        }
    }
}

/// Aggregate `records` according to `definition`
///
/// This is a pure function: identical inputs always give identical output,
/// including category order and bucket membership.
#[must_use]
pub fn aggregate(records: &[PatientRecord], definition: &MetricDefinition) -> MetricSummary {
    match definition.kind {
        MetricKind::Categorical => MetricSummary::Categorical(categorical_metric(
            &definition.id,
            &definition.name,
            records.iter().map(|r| definition.source.category_value(r)),
        )),
        MetricKind::Numerical => {
            let values: Vec<f64> = records
                .iter()
                .filter_map(|r| definition.source.numeric_value(r))
                .collect();
            MetricSummary::Numerical(numerical_metric(definition, &values))
        }
    }
}

/// Build a categorical metric from per-record values
///
/// Missing values (`None`) are counted under [`UNKNOWN_CATEGORY`], so
/// percentages are always taken against the full input length. Ties in
/// count keep first-seen order, and the one-decimal percentages of a
/// non-empty input add up to exactly 100.
pub fn categorical_metric<I>(id: &str, name: &str, values: I) -> CategoricalMetric
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut total = 0;

    for value in values {
        total += 1;
        let key = value.unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
        if let Some(&slot) = index.get(&key) {
            counts[slot].1 += 1;
        } else {
            index.insert(key.clone(), counts.len());
            counts.push((key, 1));
        }
    }

    let counts: Vec<(String, usize)> = counts.into_iter().sorted_by(|a, b| b.1.cmp(&a.1)).collect();
    let shares = apportioned_percentages(&counts.iter().map(|c| c.1).collect::<Vec<_>>());

    let categories = counts
        .into_iter()
        .zip(shares)
        .map(|((category, count), percentage)| CategoryCount {
            category,
            count,
            percentage,
        })
        .collect();

    CategoricalMetric {
        id: id.to_string(),
        name: name.to_string(),
        categories,
        total,
    }
}

/// Build a numerical metric from numeric samples
#[must_use]
pub fn numerical_metric(definition: &MetricDefinition, values: &[f64]) -> NumericalMetric {
    let stats = SampleStats::from_values(values);

    let buckets = match (&definition.custom_buckets, definition.buckets) {
        (Some(custom), _) => custom_buckets(custom, values, &definition.id),
        (None, Some(count)) => equal_width_buckets(count, values, &stats),
        // Rejected by registry validation; an unbucketed summary still reconciles
        (None, None) => equal_width_buckets(1, values, &stats),
    };

    NumericalMetric {
        id: definition.id.clone(),
        name: definition.name.clone(),
        min: stats.min,
        max: stats.max,
        average: round_to(stats.average, 1),
        median: round_to(stats.median, 1),
        buckets,
        total: values.len(),
    }
}

/// Summary statistics of an observed sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleStats {
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Arithmetic mean
    pub average: f64,
    /// Median (mean of the two middle samples for even counts)
    pub median: f64,
}

impl SampleStats {
    /// Compute statistics; an empty sample yields all zeros
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let sorted: Vec<f64> = values.iter().copied().sorted_by(f64::total_cmp).collect();
        let n = sorted.len();
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        Self {
            min: sorted[0],
            max: sorted[n - 1],
            average: values.iter().sum::<f64>() / n as f64,
            median,
        }
    }
}

fn equal_width_buckets(count: usize, values: &[f64], stats: &SampleStats) -> Vec<NumericBucket> {
    if values.is_empty() || count == 0 {
        return Vec::new();
    }

    let width = (stats.max - stats.min) / count as f64;
    let mut counts = vec![0usize; count];
    for &v in values {
        let slot = if width > 0.0 {
            (((v - stats.min) / width).floor() as usize).min(count - 1)
        } else {
            0
        };
        counts[slot] += 1;
    }

    let shares = apportioned_percentages(&counts);

    counts
        .into_iter()
        .zip(shares)
        .enumerate()
        .map(|(i, (n, share))| {
            let lo = stats.min + i as f64 * width;
            let hi = if i == count - 1 {
                stats.max
            } else {
                stats.min + (i + 1) as f64 * width
            };
            NumericBucket {
                bucket: format!("{}-{}", format_edge(lo), format_edge(hi)),
                min: lo,
                max: hi,
                count: n,
                percentage: share,
                out_of_range: false,
            }
        })
        .collect()
}

fn custom_buckets(buckets: &[CustomBucket], values: &[f64], metric_id: &str) -> Vec<NumericBucket> {
    let last = buckets.len().saturating_sub(1);
    let mut counts = vec![0usize; buckets.len()];
    let mut outside: Vec<f64> = Vec::new();

    for &v in values {
        let slot = buckets.iter().enumerate().position(|(i, b)| {
            v >= b.min && (v < b.max || (i == last && v <= b.max))
        });
        match slot {
            Some(slot) => counts[slot] += 1,
            None => outside.push(v),
        }
    }

    let mut all_counts = counts.clone();
    all_counts.push(outside.len());
    let mut shares = apportioned_percentages(&all_counts);
    let outside_share = shares.pop().unwrap_or_default();

    let mut result: Vec<NumericBucket> = buckets
        .iter()
        .zip(counts)
        .zip(shares)
        .map(|((b, n), share)| NumericBucket {
            bucket: b.label.clone(),
            min: b.min,
            max: b.max,
            count: n,
            percentage: share,
            out_of_range: false,
        })
        .collect();

    if !outside.is_empty() {
        log::warn!(
            "{} samples of metric '{metric_id}' fall outside every configured bucket",
            outside.len()
        );
        let stats = SampleStats::from_values(&outside);
        result.push(NumericBucket {
            bucket: OUT_OF_RANGE_LABEL.to_string(),
            min: stats.min,
            max: stats.max,
            count: outside.len(),
            percentage: outside_share,
            out_of_range: true,
        });
    }

    result
}

fn format_edge(value: f64) -> String {
    let rounded = round_to(value, 1);
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}
