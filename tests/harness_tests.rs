//! Integration tests for the benchmark harness contract
//!
//! Exercises registration, measurement, failure isolation and reporting
//! through the public API only.

use opbench::harness::{
    fallible_operation, operation, Harness, HarnessConfig, Operation, Params, ScenarioId, Suite,
};
use opbench::workloads::{self, string_ops};
use opbench::{Error, Report};
use std::hint::black_box;
use std::time::{Duration, Instant};

mod common;
use common::{assert_stats_invariants, calibrating_harness, fixed_harness, Result};

/// **What is tested:** Statistical invariants of real workload records
/// **Why it is tested:** Every record handed to callers must satisfy min <= mean <= max with at least one round and iteration
/// **Test conditions:** list_creation and the 1000-byte codec scenarios under auto-calibration
/// **Expectations:** All scenarios succeed and every record satisfies the invariants
#[test]
fn test_records_satisfy_invariants() -> Result {
    let suite = workloads::suite(Some(1_000))?;
    let run = suite.run_matching(&calibrating_harness(), |id| id.group() != "string_concat");

    assert!(run.is_success(), "failures: {:?}", run.failures);
    assert_eq!(run.records.len(), 3 + 6);
    for record in &run.records {
        assert_stats_invariants(&record.stats);
    }
    Ok(())
}

/// **What is tested:** Duplicate registration and distinct parameters
/// **Why it is tested:** Identity uniqueness is what lets results be keyed by scenario
/// **Test conditions:** Same (group, variant, params) twice, then the same variant with another size
/// **Expectations:** Duplicate fails with a configuration error; both sizes appear in the report
#[test]
fn test_duplicate_registration_and_distinct_params() -> Result {
    fn factory(params: &Params) -> anyhow::Result<Operation> {
        let size = params.size("size").unwrap_or(0);
        Ok(operation(move || vec![0_u8; size]))
    }

    let mut suite = Suite::new();
    suite.register("alloc", "zeroed", Params::new().with("size", 10), factory)?;
    let duplicate = suite.register("alloc", "zeroed", Params::new().with("size", 10), factory);
    assert!(matches!(duplicate, Err(Error::Configuration { .. })));
    suite.register("alloc", "zeroed", Params::new().with("size", 20), factory)?;

    let run = suite.run_all(&fixed_harness(2, 10));
    let flat = Report::from_run(&run).flatten();
    assert_eq!(flat.len(), 2);
    assert!(flat.contains_key("alloc::zeroed[size=10]"));
    assert!(flat.contains_key("alloc::zeroed[size=20]"));
    Ok(())
}

/// **What is tested:** Exclusion of fixture construction from timing
/// **Why it is tested:** Fixtures are built by the factory outside the timed region
/// **Test conditions:** 10_000_000-character fixture; a no-op over it versus a full scan of it
/// **Expectations:** The no-op mean is at least 100 times smaller than the scan mean
#[test]
fn test_fixture_cost_is_excluded() -> Result {
    const FIXTURE_LEN: usize = 10_000_000;
    let mut suite = Suite::new();
    let noop = suite
        .register("fixture", "noop", Params::new(), |_| {
            let text = "x".repeat(FIXTURE_LEN);
            Ok(operation(move || black_box(&text).len()))
        })?
        .clone();
    let scan = suite
        .register("fixture", "scan", Params::new(), |_| {
            let text = "x".repeat(FIXTURE_LEN);
            Ok(operation(move || {
                black_box(&text).bytes().filter(|b| *b == b'x').count()
            }))
        })?
        .clone();

    let run = suite.run_all(&calibrating_harness());
    assert!(run.is_success(), "failures: {:?}", run.failures);

    let noop_mean = run.record(&noop).map(|r| r.stats.mean).ok_or("noop missing")?;
    let scan_mean = run.record(&scan).map(|r| r.stats.mean).ok_or("scan missing")?;
    assert!(
        noop_mean * 100.0 <= scan_mean,
        "noop mean {noop_mean} not 100x below scan mean {scan_mean}"
    );
    Ok(())
}

/// **What is tested:** Failure isolation within a suite run
/// **Why it is tested:** One failing scenario must not abort or contaminate its siblings
/// **Test conditions:** Three scenarios where the second returns an error
/// **Expectations:** First and third have records; second has an operation error naming it
#[test]
fn test_failure_isolation() -> Result {
    let mut suite = Suite::new();
    let first = suite
        .register("iso", "first", Params::new(), |_| Ok(operation(|| 1)))?
        .clone();
    let second = suite
        .register("iso", "second", Params::new(), |_| {
            Ok(fallible_operation(|| -> anyhow::Result<u32> {
                anyhow::bail!("deliberate failure")
            }))
        })?
        .clone();
    let third = suite
        .register("iso", "third", Params::new(), |_| Ok(operation(|| 3)))?
        .clone();

    let run = suite.run_all(&fixed_harness(3, 5));

    assert!(run.record(&first).is_some());
    assert!(run.record(&third).is_some());
    assert!(run.record(&second).is_none());

    let failure = run.failure(&second).ok_or("second should have failed")?;
    match &failure.error {
        Error::Operation { scenario, source } => {
            assert_eq!(scenario, &second);
            assert!(source.to_string().contains("deliberate failure"));
        }
        other => panic!("Expected operation error, got {other:?}"),
    }
    assert!(!run.is_success());
    Ok(())
}

/// **What is tested:** Ranking stability across repeated runs
/// **Why it is tested:** A control pair with a large gap must keep its order run after run
/// **Test conditions:** 5 runs of single concatenation versus quadratic rebuild over 50_000 parts of "x"
/// **Expectations:** The single concatenation is faster in every run
#[test]
fn test_ranking_stability() -> Result {
    let parts = vec!["x"; 50_000];
    let harness = fixed_harness(2, 1);
    let fast_id = ScenarioId::new("control", "join", Params::new().with("size", 50_000));
    let slow_id = ScenarioId::new("control", "plus_equals", Params::new().with("size", 50_000));

    for attempt in 0..5 {
        let (fast, _) = harness.measure(&fast_id, || Ok(string_ops::join(&parts)))?;
        let (slow, _) = harness.measure(&slow_id, || Ok(string_ops::plus_equals(&parts)))?;
        assert!(
            fast.stats.mean < slow.stats.mean,
            "run {attempt}: join {} not below plus_equals {}",
            fast.stats.mean,
            slow.stats.mean
        );
    }
    Ok(())
}

/// **What is tested:** End-to-end run of the string_concat workloads
/// **Why it is tested:** Registered workloads must produce valid, correctly ordered records
/// **Test conditions:** join and plus_equals at count 10_000 with a fixed layout
/// **Expectations:** Both records valid; join mean <= plus_equals mean
#[test]
fn test_string_concat_end_to_end() -> Result {
    let suite = workloads::suite(Some(1_000))?;
    let params = Params::new().with("count", string_ops::COUNT);
    let join = ScenarioId::new(string_ops::GROUP, "join", params.clone());
    let plus_equals = ScenarioId::new(string_ops::GROUP, "plus_equals", params);

    let run = suite.run_selected(&fixed_harness(3, 1), &[join.clone(), plus_equals.clone()])?;
    assert!(run.is_success(), "failures: {:?}", run.failures);

    let join_stats = &run.record(&join).ok_or("join missing")?.stats;
    let plus_stats = &run.record(&plus_equals).ok_or("plus_equals missing")?.stats;
    assert_stats_invariants(join_stats);
    assert_stats_invariants(plus_stats);
    assert!(join_stats.mean <= plus_stats.mean);
    Ok(())
}

/// **What is tested:** Timeout inside a suite run
/// **Why it is tested:** An over-budget scenario must fail alone with a timeout error
/// **Test conditions:** 5 ms sleeping operation, 10 rounds under a 20 ms budget, followed by a no-op scenario
/// **Expectations:** First scenario fails with kind "timeout"; second succeeds
#[test]
fn test_timeout_in_suite() -> Result {
    let mut suite = Suite::new();
    let slow = suite
        .register("budget", "sleep", Params::new(), |_| {
            Ok(operation(|| std::thread::sleep(Duration::from_millis(5))))
        })?
        .clone();
    suite.register("budget", "noop", Params::new(), |_| Ok(operation(|| ())))?;

    let config = HarnessConfig::fixed(10, 1).with_timeout(Duration::from_millis(20));
    let run = suite.run_all(&Harness::new(config)?);

    let failure = run.failure(&slow).ok_or("sleep should time out")?;
    assert_eq!(failure.error.kind(), "timeout");
    assert_eq!(run.records.len(), 1);
    Ok(())
}

/// **What is tested:** Timeout of a scenario blocked inside one call
/// **Why it is tested:** A call that never returns must not hold up the rest of the suite
/// **Test conditions:** Operation sleeping 3 s under a 50 ms budget, followed by a no-op scenario
/// **Expectations:** Blocked scenario fails with TimeoutError, sibling gets a record, the run ends well before 3 s
#[test]
fn test_blocking_call_does_not_stall_suite() -> Result {
    let mut suite = Suite::new();
    let blocked = suite
        .register("budget", "blocked", Params::new(), |_| {
            Ok(operation(|| std::thread::sleep(Duration::from_secs(3))))
        })?
        .clone();
    let sibling = suite
        .register("budget", "noop", Params::new(), |_| Ok(operation(|| ())))?
        .clone();

    let config = HarnessConfig::fixed(1, 1).with_timeout(Duration::from_millis(50));
    let started = Instant::now();
    let run = suite.run_all(&Harness::new(config)?);
    let waited = started.elapsed();

    let failure = run.failure(&blocked).ok_or("blocked scenario should time out")?;
    assert!(matches!(failure.error, Error::Timeout { .. }), "{:?}", failure.error);
    assert!(run.record(&sibling).is_some(), "failures: {:?}", run.failures);
    assert!(waited < Duration::from_secs(2), "suite waited {waited:?}");
    Ok(())
}

/// **What is tested:** JSON report written to disk
/// **Why it is tested:** Downstream tooling consumes the written document
/// **Test conditions:** list_creation run written into a temporary directory
/// **Expectations:** File parses and lists three benchmarks with stats
#[test]
fn test_report_written_to_disk() -> Result {
    let suite = workloads::suite(Some(1_000))?;
    let run = suite.run_matching(&fixed_harness(2, 1), |id| id.group() == "list_creation");

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("report.json");
    Report::from_run(&run).write_json(&path)?;

    let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    let benchmarks = document["benchmarks"].as_array().ok_or("benchmarks array")?;
    assert_eq!(benchmarks.len(), 3);
    assert!(benchmarks.iter().all(|b| b["stats"]["mean"].is_number()));
    Ok(())
}
