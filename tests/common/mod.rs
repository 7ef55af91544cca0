//! Shared test helpers for opbench integration tests
//!
//! - [`TestCommand`] drives the `opbench` binary with a clean environment
//! - harness helpers build small, fast configurations and check record invariants

#![allow(dead_code)]

use assert_cmd::Command as AssertCommand;
use opbench::harness::{Harness, HarnessConfig, Stats};
use std::error::Error;
use std::path::Path;
use std::process::Output;

/// Main result type for the test helpers
pub type Result<T = ()> = std::result::Result<T, Box<dyn Error>>;

/// Variables the binary reads; cleared so the host environment cannot leak in
const OPBENCH_VARS: [&str; 9] = [
    "OPBENCH_WARMUP",
    "OPBENCH_ROUNDS",
    "OPBENCH_ITERATIONS",
    "OPBENCH_MIN_TIME_MS",
    "OPBENCH_MAX_TIME_MS",
    "OPBENCH_TIMEOUT_MS",
    "OPBENCH_OUTLIERS",
    "OPBENCH_LOG",
    "RUST_LOG",
];

/// Builder for one invocation of the binary
#[derive(Debug, Clone, Default)]
pub struct TestCommand {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl TestCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// One round, one iteration, no warm-up, small payloads only
    pub fn quick() -> Self {
        Self::new()
            .args(["--warmup", "0", "--rounds", "1", "--iterations", "1"])
            .args(["--max-size", "1000"])
    }

    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter().fold(self, Self::arg)
    }

    /// Restrict the run to one group
    pub fn group<S: AsRef<str>>(self, group: S) -> Self {
        self.arg("--group").arg(group)
    }

    /// Write the JSON report to `path`
    pub fn json_to(self, path: &Path) -> Self {
        self.arg("--json").arg(path.to_string_lossy())
    }

    pub fn env<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Self {
        self.envs
            .push((key.as_ref().to_owned(), value.as_ref().to_owned()));
        self
    }

    /// Build the assert_cmd command without running it
    pub fn command(&self) -> Result<AssertCommand> {
        let mut cmd = AssertCommand::cargo_bin("opbench")?;
        for var in OPBENCH_VARS {
            cmd.env_remove(var);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.args(&self.args);
        Ok(cmd)
    }

    pub fn execute(&self) -> Result<CommandOutput> {
        let output = self.command()?.output()?;
        Ok(CommandOutput::from_output(output))
    }
}

/// Captured output of the binary
#[derive(Debug)]
pub struct CommandOutput {
    output: Output,
    stdout: String,
    stderr: String,
}

impl CommandOutput {
    fn from_output(output: Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Self {
            output,
            stdout,
            stderr,
        }
    }

    pub fn is_success(&self) -> bool {
        self.output.status.success()
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Parse stdout as a JSON document
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.stdout)?)
    }
}

/// Harness with a fixed round layout and no warm-up
pub fn fixed_harness(rounds: u32, iterations: u64) -> Harness {
    Harness::new(HarnessConfig::fixed(rounds, iterations)).expect("fixed layout is valid")
}

/// Harness with calibration kept short for tests
pub fn calibrating_harness() -> Harness {
    let config = HarnessConfig::default()
        .with_warmup(1)
        .with_min_time(std::time::Duration::from_millis(2))
        .with_max_time(std::time::Duration::from_millis(20));
    Harness::new(config).expect("calibrating config is valid")
}

/// Check the ordering invariants every record must satisfy
pub fn assert_stats_invariants(stats: &Stats) {
    assert!(stats.rounds >= 1, "rounds >= 1: {stats:?}");
    assert!(stats.iterations >= 1, "iterations >= 1: {stats:?}");
    assert!(stats.min <= stats.mean, "min <= mean: {stats:?}");
    assert!(stats.mean <= stats.max, "mean <= max: {stats:?}");
    assert!(stats.min <= stats.median && stats.median <= stats.max, "median in range: {stats:?}");
    assert!(stats.stddev >= 0.0, "stddev >= 0: {stats:?}");
}
