use serde::{Deserialize, Serialize};

/// Compute the percentile value from a **sorted** slice using linear interpolation.
///
/// Returns 0.0 for an empty slice; callers handle the zero-run case before
/// reaching here.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let rank = p / 100.0 * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            if lower == upper {
                sorted[lower]
            } else {
                let frac = rank - lower as f64;
                sorted[lower] * (1.0 - frac) + sorted[upper] * frac
            }
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around a precomputed mean.
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn sort(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Distribution summary of per-run ending balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub mean: f64,
    pub median: f64,
    pub percentile_10: f64,
    pub percentile_25: f64,
    pub percentile_50: f64,
    pub percentile_75: f64,
    pub percentile_90: f64,
    pub std_deviation: f64,
}

impl OutcomeSummary {
    pub fn from_outcomes(outcomes: &[f64]) -> Self {
        let mut sorted = outcomes.to_vec();
        sort(&mut sorted);
        let mean = mean(&sorted);
        let percentile_50 = percentile_sorted(&sorted, 50.0);
        Self {
            mean,
            median: percentile_50,
            percentile_10: percentile_sorted(&sorted, 10.0),
            percentile_25: percentile_sorted(&sorted, 25.0),
            percentile_50,
            percentile_75: percentile_sorted(&sorted, 75.0),
            percentile_90: percentile_sorted(&sorted, 90.0),
            std_deviation: std_dev(&sorted, mean),
        }
    }

    /// Every statistic pinned to one value, with zero spread.
    pub fn constant(value: f64) -> Self {
        Self {
            mean: value,
            median: value,
            percentile_10: value,
            percentile_25: value,
            percentile_50: value,
            percentile_75: value,
            percentile_90: value,
            std_deviation: 0.0,
        }
    }
}

/// Pessimistic / median / optimistic balance at each year boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileBands {
    pub years: Vec<u32>,
    pub yearly_10th: Vec<f64>,
    pub yearly_50th: Vec<f64>,
    pub yearly_90th: Vec<f64>,
}

impl PercentileBands {
    /// Build bands from year-major snapshots: `snapshots[year][run]`.
    pub fn from_snapshots(snapshots: &mut [Vec<f64>]) -> Self {
        let mut bands = Self::with_capacity(snapshots.len());
        for (year, balances) in snapshots.iter_mut().enumerate() {
            sort(balances);
            bands.years.push(year as u32);
            bands.yearly_10th.push(percentile_sorted(balances, 10.0));
            bands.yearly_50th.push(percentile_sorted(balances, 50.0));
            bands.yearly_90th.push(percentile_sorted(balances, 90.0));
        }
        bands
    }

    /// Flat bands at `value` for years `0..=years`.
    pub fn constant(value: f64, years: u32) -> Self {
        let len = years as usize + 1;
        Self {
            years: (0..=years).collect(),
            yearly_10th: vec![value; len],
            yearly_50th: vec![value; len],
            yearly_90th: vec![value; len],
        }
    }

    fn with_capacity(n: usize) -> Self {
        Self {
            years: Vec::with_capacity(n),
            yearly_10th: Vec::with_capacity(n),
            yearly_50th: Vec::with_capacity(n),
            yearly_90th: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
