//! Measurement samples and their aggregate statistics
//!
//! All times are per-call estimates in seconds: a round's batch time divided
//! by the number of iterations in the round.

use super::config::OutlierPolicy;
use super::scenario::ScenarioId;
use serde::Serialize;
use std::time::Duration;

/// Ordered per-call time samples of one scenario, one per round
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    samples: Vec<f64>,
    iterations: u64,
}

impl Measurement {
    /// Create a measurement
    ///
    /// Returns `None` when there are no samples, when `iterations` is zero or
    /// when any sample is negative or not finite.
    pub fn new(samples: Vec<f64>, iterations: u64) -> Option<Self> {
        let valid = !samples.is_empty()
            && iterations > 0
            && samples.iter().all(|s| s.is_finite() && *s >= 0.0);
        valid.then_some(Self {
            samples,
            iterations,
        })
    }

    /// Build a measurement from per-round batch durations
    pub fn from_rounds(rounds: &[Duration], iterations: u64) -> Option<Self> {
        let per_call = rounds
            .iter()
            .map(|round| round.as_secs_f64() / iterations.max(1) as f64)
            .collect();
        Self::new(per_call, iterations)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn rounds(&self) -> usize {
        self.samples.len()
    }
}

/// Aggregate statistics of a measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation (zero for a single round)
    pub stddev: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// Calls per second at the mean
    pub ops: f64,
    /// Total measured time of the retained rounds
    pub total: f64,
    /// Rounds the statistics were computed from
    pub rounds: usize,
    pub iterations: u64,
    /// Retained samples further than one standard deviation from the mean
    pub stddev_outliers: usize,
    /// Retained samples outside 1.5 IQR of the quartiles
    pub iqr_outliers: usize,
    /// Samples dropped by the outlier policy
    pub outliers_removed: usize,
}

impl Stats {
    /// Compute statistics, applying the outlier policy first
    ///
    /// The policy never removes every sample; if it would, all samples are
    /// kept.
    pub fn from_measurement(measurement: &Measurement, policy: OutlierPolicy) -> Self {
        let mut sorted = measurement.samples.clone();
        sorted.sort_by(f64::total_cmp);

        let retained = filter_outliers(&sorted, policy);
        let outliers_removed = sorted.len() - retained.len();
        Self::from_sorted(&retained, measurement.iterations, outliers_removed)
    }

    fn from_sorted(sorted: &[f64], iterations: u64, outliers_removed: usize) -> Self {
        let n = sorted.len();
        let min = sorted[0];
        let max = sorted[n - 1];
        let sum: f64 = sorted.iter().sum();
        // Summation rounding can push the mean past an extreme
        let mean = (sum / n as f64).clamp(min, max);
        let stddev = sample_stddev(sorted, mean);
        let q1 = quantile(sorted, 0.25);
        let median = quantile(sorted, 0.5);
        let q3 = quantile(sorted, 0.75);
        let iqr = q3 - q1;

        let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
        let iqr_outliers = sorted
            .iter()
            .filter(|s| **s < low_fence || **s > high_fence)
            .count();
        let stddev_outliers = sorted
            .iter()
            .filter(|s| (**s - mean).abs() > stddev)
            .count();

        Self {
            min,
            max,
            mean,
            stddev,
            median,
            q1,
            q3,
            iqr,
            ops: if mean > 0.0 { 1.0 / mean } else { 0.0 },
            total: sum * iterations as f64,
            rounds: n,
            iterations,
            stddev_outliers,
            iqr_outliers,
            outliers_removed,
        }
    }
}

/// Aggregated statistics of one scenario, keyed by its identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    #[serde(flatten)]
    pub id: ScenarioId,
    pub stats: Stats,
}

impl ResultRecord {
    pub fn new(id: ScenarioId, stats: Stats) -> Self {
        Self { id, stats }
    }
}

fn sample_stddev(samples: &[f64], mean: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let variance = samples
        .iter()
        .map(|s| {
            let diff = s - mean;
            diff * diff
        })
        .sum::<f64>()
        / (samples.len() - 1) as f64;
    variance.sqrt()
}

/// Linearly interpolated quantile of sorted, non-empty samples
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    let (low, high) = (sorted[lower], sorted[upper]);
    (low + (high - low) * weight).clamp(low, high)
}

fn filter_outliers(sorted: &[f64], policy: OutlierPolicy) -> Vec<f64> {
    let keep: Box<dyn Fn(f64) -> bool> = match policy {
        OutlierPolicy::Keep => return sorted.to_vec(),
        OutlierPolicy::StdDev { sigma } => {
            let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
            let limit = sigma * sample_stddev(sorted, mean);
            Box::new(move |s| (s - mean).abs() <= limit)
        }
        OutlierPolicy::Iqr => {
            let (q1, q3) = (quantile(sorted, 0.25), quantile(sorted, 0.75));
            let iqr = q3 - q1;
            let (low, high) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
            Box::new(move |s| s >= low && s <= high)
        }
    };

    let retained: Vec<f64> = sorted.iter().copied().filter(|s| keep(*s)).collect();
    if retained.is_empty() {
        sorted.to_vec()
    } else {
        retained
    }
}
