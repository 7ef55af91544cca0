//! Harness run settings
//!
//! Controls warm-up, calibration, round selection, outlier handling and the
//! per-scenario wall-time budget.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default number of untimed warm-up invocations
pub const DEFAULT_WARMUP: u32 = 3;
/// Default minimum duration of one calibrated round
pub const DEFAULT_MIN_TIME: Duration = Duration::from_millis(100);
/// Default target total measuring time for automatic round selection
pub const DEFAULT_MAX_TIME: Duration = Duration::from_secs(1);
/// Default lower bound of automatically selected rounds
pub const DEFAULT_MIN_ROUNDS: u32 = 5;
/// Default upper bound of automatically selected rounds
pub const DEFAULT_MAX_ROUNDS: u32 = 10_000;
/// Default calibration batch-size cap
pub const DEFAULT_MAX_BATCH: u64 = 1 << 32;
/// Default multiplier of the standard deviation for stddev outlier filtering
pub const DEFAULT_OUTLIER_SIGMA: f64 = 2.0;

/// How samples far from the bulk of the distribution are handled
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum OutlierPolicy {
    /// Keep every sample
    #[default]
    Keep,
    /// Drop samples further than `sigma` standard deviations from the mean
    StdDev { sigma: f64 },
    /// Drop samples outside `[q1 - 1.5 IQR, q3 + 1.5 IQR]`
    Iqr,
}

impl fmt::Display for OutlierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierPolicy::Keep => f.write_str("none"),
            OutlierPolicy::StdDev { .. } => f.write_str("stddev"),
            OutlierPolicy::Iqr => f.write_str("iqr"),
        }
    }
}

impl FromStr for OutlierPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "none" | "keep" => Ok(OutlierPolicy::Keep),
            "stddev" => Ok(OutlierPolicy::StdDev {
                sigma: DEFAULT_OUTLIER_SIGMA,
            }),
            "iqr" => Ok(OutlierPolicy::Iqr),
            other => Err(format!("unknown outlier policy '{other}'")),
        }
    }
}

/// Settings of one harness
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Untimed invocations before calibration
    pub warmup: u32,
    /// Explicit round count; automatic when `None`
    pub rounds: Option<u32>,
    /// Explicit iterations per round; calibrated when `None`
    pub iterations: Option<u64>,
    /// Minimum measured duration of a calibrated round
    pub min_time: Duration,
    /// Target total measuring time for automatic rounds
    pub max_time: Duration,
    pub min_rounds: u32,
    pub max_rounds: u32,
    /// Calibration fails once a batch this large is still below `min_time`
    pub max_batch: u64,
    /// Wall-time budget of one scenario run; registered scenarios then run on a worker thread
    pub timeout: Option<Duration>,
    pub outliers: OutlierPolicy,
    /// Untimed hook invoked before every measured round
    pub between_rounds: Option<fn()>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            warmup: DEFAULT_WARMUP,
            rounds: None,
            iterations: None,
            min_time: DEFAULT_MIN_TIME,
            max_time: DEFAULT_MAX_TIME,
            min_rounds: DEFAULT_MIN_ROUNDS,
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_batch: DEFAULT_MAX_BATCH,
            timeout: None,
            outliers: OutlierPolicy::Keep,
            between_rounds: None,
        }
    }
}

impl HarnessConfig {
    /// Settings with a fixed round layout and no warm-up
    ///
    /// Skips calibration entirely; useful when the caller already knows how
    /// long an operation takes.
    #[must_use]
    pub fn fixed(rounds: u32, iterations: u64) -> Self {
        Self {
            warmup: 0,
            rounds: Some(rounds),
            iterations: Some(iterations),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_warmup(mut self, warmup: u32) -> Self {
        self.warmup = warmup;
        self
    }

    #[must_use]
    pub const fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    #[must_use]
    pub const fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = Some(iterations);
        self
    }

    #[must_use]
    pub const fn with_min_time(mut self, min_time: Duration) -> Self {
        self.min_time = min_time;
        self
    }

    #[must_use]
    pub const fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = max_time;
        self
    }

    #[must_use]
    pub const fn with_max_batch(mut self, max_batch: u64) -> Self {
        self.max_batch = max_batch;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_outliers(mut self, outliers: OutlierPolicy) -> Self {
        self.outliers = outliers;
        self
    }

    #[must_use]
    pub const fn with_between_rounds(mut self, hook: fn()) -> Self {
        self.between_rounds = Some(hook);
        self
    }

    /// Check that the settings describe a runnable layout
    pub fn validate(&self) -> Result<(), String> {
        if self.rounds == Some(0) {
            return Err("rounds must be at least 1".to_owned());
        }
        if self.iterations == Some(0) {
            return Err("iterations must be at least 1".to_owned());
        }
        if self.min_rounds == 0 || self.min_rounds > self.max_rounds {
            return Err(format!(
                "round bounds must satisfy 1 <= min_rounds ({}) <= max_rounds ({})",
                self.min_rounds, self.max_rounds
            ));
        }
        if self.max_batch == 0 {
            return Err("max_batch must be at least 1".to_owned());
        }
        if let OutlierPolicy::StdDev { sigma } = self.outliers {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(format!("outlier sigma must be positive, got {sigma}"));
            }
        }
        Ok(())
    }
}
