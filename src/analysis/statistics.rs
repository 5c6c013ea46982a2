//! Descriptive statistics and differencing over resampled columns.

use serde::Serialize;

/// Container for descriptive statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
}

/// Compute descriptive statistics for a dataset
pub fn compute_descriptive_stats(data: &[f64]) -> DescriptiveStats {
    if data.is_empty() {
        return DescriptiveStats::default();
    }

    let n = data.len();
    let mean = data.iter().sum::<f64>() / n as f64;

    // Sample variance (two-pass for stability)
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1).max(1) as f64;

    DescriptiveStats {
        count: n,
        mean,
        stdev: variance.sqrt(),
        min: data.iter().cloned().fold(f64::INFINITY, f64::min),
        max: data.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    }
}

/// Statistics over the defined cells of a column
pub fn column_stats(values: &[Option<f64>]) -> DescriptiveStats {
    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    compute_descriptive_stats(&defined)
}

/// `values[i] - values[i - lag]`, None where either side is undefined.
///
/// The first `lag` entries are always None. A zero lag yields all None.
pub fn lagged_difference(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    if lag == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            let earlier = values.get(i.checked_sub(lag)?)?;
            Some(values[i]? - (*earlier)?)
        })
        .collect()
}

/// Row-to-row difference
pub fn first_difference(values: &[Option<f64>]) -> Vec<Option<f64>> {
    lagged_difference(values, 1)
}

/// Min and max of an iterator, None when it is empty
pub fn value_bounds<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
