//! Property-based tests for measurement statistics
//!
//! Statistics must satisfy their ordering invariants for any valid sample
//! set, under every outlier policy.

#![allow(clippy::float_cmp)]

use opbench::harness::{Measurement, OutlierPolicy, Stats};
use proptest::prelude::*;
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

/// Per-call times between one nanosecond and ten seconds
fn samples_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1e-9f64..10.0f64, 1..200)
}

fn policy_strategy() -> impl Strategy<Value = OutlierPolicy> {
    prop_oneof![
        Just(OutlierPolicy::Keep),
        (0.5f64..4.0f64).prop_map(|sigma| OutlierPolicy::StdDev { sigma }),
        Just(OutlierPolicy::Iqr),
    ]
}

proptest! {
    /// Property: quantiles and mean lie between the extremes
    /// Invariant: min <= q1 <= median <= q3 <= max and min <= mean <= max
    #[test]
    fn statistics_are_ordered(samples in samples_strategy(), iterations in 1u64..1_000) {
        let measurement = Measurement::new(samples, iterations).expect("valid samples");
        let stats = Stats::from_measurement(&measurement, OutlierPolicy::Keep);

        prop_assert!(stats.min <= stats.q1);
        prop_assert!(stats.q1 <= stats.median);
        prop_assert!(stats.median <= stats.q3);
        prop_assert!(stats.q3 <= stats.max);
        prop_assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        prop_assert!(stats.stddev >= 0.0);
        prop_assert!(stats.iqr >= 0.0);
        prop_assert_eq!(stats.iterations, iterations);
    }

    /// Property: keeping every sample reports every round
    #[test]
    fn keep_policy_retains_all_rounds(samples in samples_strategy()) {
        let rounds = samples.len();
        let measurement = Measurement::new(samples, 1).expect("valid samples");
        let stats = Stats::from_measurement(&measurement, OutlierPolicy::Keep);

        prop_assert_eq!(stats.rounds, rounds);
        prop_assert_eq!(stats.outliers_removed, 0);
    }

    /// Property: outlier filtering never empties the sample set and accounts for every sample
    #[test]
    fn filtering_keeps_samples(samples in samples_strategy(), policy in policy_strategy()) {
        let total = samples.len();
        let measurement = Measurement::new(samples, 1).expect("valid samples");
        let stats = Stats::from_measurement(&measurement, policy);

        prop_assert!(stats.rounds >= 1);
        prop_assert_eq!(stats.rounds + stats.outliers_removed, total);
        prop_assert!(stats.min <= stats.mean && stats.mean <= stats.max);
    }

    /// Property: a constant sample set has no spread
    #[test]
    fn constant_samples_have_no_spread(value in 1e-9f64..1.0f64, rounds in 1usize..50) {
        let measurement = Measurement::new(vec![value; rounds], 1).expect("valid samples");
        let stats = Stats::from_measurement(&measurement, OutlierPolicy::Iqr);

        prop_assert_eq!(stats.min, value);
        prop_assert_eq!(stats.max, value);
        prop_assert_eq!(stats.median, value);
        prop_assert!(stats.stddev.abs() < 1e-12);
        prop_assert_eq!(stats.iqr_outliers, 0);
    }
}

/// Round durations in whole microseconds, possibly empty
#[derive(Debug, Clone)]
struct RoundTimes(Vec<u32>);

impl Arbitrary for RoundTimes {
    fn arbitrary(g: &mut Gen) -> Self {
        RoundTimes(Vec::<u32>::arbitrary(g))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(RoundTimes))
    }
}

/// Measurements exist exactly when there is at least one round
#[quickcheck]
fn measurement_requires_a_round(times: RoundTimes) -> bool {
    let samples: Vec<f64> = times.0.iter().map(|us| f64::from(*us) * 1e-6).collect();
    let expected = !samples.is_empty();
    Measurement::new(samples, 1).is_some() == expected
}

/// Zero iterations per round are rejected whatever the samples
#[quickcheck]
fn measurement_rejects_zero_iterations(times: RoundTimes) -> bool {
    let samples: Vec<f64> = times.0.iter().map(|us| f64::from(*us) * 1e-6).collect();
    Measurement::new(samples, 0).is_none()
}

/// Negative or non-finite samples are rejected
#[quickcheck]
fn measurement_rejects_invalid_samples(times: RoundTimes, poison: u8) -> bool {
    let mut samples: Vec<f64> = times.0.iter().map(|us| f64::from(*us) * 1e-6).collect();
    let bad = match poison % 3 {
        0 => -1.0,
        1 => f64::NAN,
        _ => f64::INFINITY,
    };
    samples.push(bad);
    Measurement::new(samples, 1).is_none()
}

/// Mean per call times iterations times rounds equals the total measured time
#[quickcheck]
fn total_matches_samples(times: RoundTimes, iterations: u8) -> bool {
    let iterations = u64::from(iterations.max(1));
    let samples: Vec<f64> = times.0.iter().map(|us| f64::from(*us) * 1e-6).collect();
    let Some(measurement) = Measurement::new(samples.clone(), iterations) else {
        return samples.is_empty();
    };
    let stats = Stats::from_measurement(&measurement, OutlierPolicy::Keep);
    let expected: f64 = samples.iter().sum::<f64>() * iterations as f64;
    (stats.total - expected).abs() <= 1e-9 * expected.max(1.0)
}
