//! Timed execution of operations
//!
//! A scenario run is a single linear pass: warm-up, calibration, measured
//! rounds, aggregation. The only loop that retries is calibration, whose
//! batch size grows monotonically up to the configured cap.
//!
//! With a timeout configured, [`Harness::run`] moves the scenario to a worker
//! thread and waits for it at most `timeout`; a worker that is still busy
//! after that is detached and the scenario fails with [`Error::Timeout`].
//! [`Harness::measure`] runs on the calling thread and checks the budget
//! between invocations only.

use super::config::HarnessConfig;
use super::scenario::ScenarioId;
use super::stats::{Measurement, ResultRecord, Stats};
use super::suite::{Output, Scenario};
use crate::error::{Error, Result, ResultExt};
use std::any::Any;
use std::hint::black_box;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of running one registered scenario
pub struct RunOutcome {
    pub record: ResultRecord,
    /// Return value of the last measured invocation
    pub output: Output,
}

/// Drives timed, repeated execution of operations
#[derive(Debug, Clone, Default)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    /// Create a harness, rejecting settings that cannot produce a measurement
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate().map_err(Error::configuration)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Build the scenario's fixture and measure its operation
    pub fn run(&self, scenario: &Scenario) -> Result<RunOutcome> {
        match self.config.timeout {
            Some(budget) => self.run_on_worker(scenario, budget),
            None => self.run_inline(scenario),
        }
    }

    fn run_on_worker(&self, scenario: &Scenario, budget: Duration) -> Result<RunOutcome> {
        let id = scenario.id().clone();
        let (sender, receiver) = mpsc::channel();
        let worker = (self.clone(), scenario.clone());

        let started = Instant::now();
        thread::Builder::new()
            .name(format!("opbench-{}", id.variant()))
            .spawn(move || {
                let (harness, scenario) = worker;
                // The receiver is gone once the run has timed out
                let _ = sender.send(harness.run_inline(&scenario));
            })?;

        match receiver.recv_timeout(budget) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                let elapsed = started.elapsed();
                warn!(
                    scenario = %id,
                    ?elapsed,
                    ?budget,
                    "scenario exceeded its time budget, detaching worker"
                );
                Err(Error::Timeout {
                    scenario: id,
                    budget,
                    elapsed,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::operation(
                id,
                anyhow::anyhow!("worker thread exited without a result"),
            )),
        }
    }

    fn run_inline(&self, scenario: &Scenario) -> Result<RunOutcome> {
        let id = scenario.id();
        let operation = guarded(id, || scenario.build())
            .map_err(|e| attach_phase(e, "building fixture"))?;
        let (record, output) = self.measure(id, operation)?;
        Ok(RunOutcome { record, output })
    }

    /// Measure a typed operation under the identity `id`
    ///
    /// Returns the aggregated record and the value of the last invocation.
    pub fn measure<T, F>(&self, id: &ScenarioId, mut operation: F) -> Result<(ResultRecord, T)>
    where
        F: FnMut() -> anyhow::Result<T>,
    {
        let span = tracing::info_span!("scenario", id = %id);
        let _entered = span.enter();

        let budget = Budget::start(id, self.config.timeout);
        let mut last: Option<T> = None;

        for _ in 0..self.config.warmup {
            last = Some(invoke(id, &mut operation)?);
            budget.check()?;
        }

        let iterations = match self.config.iterations {
            Some(iterations) => iterations,
            None => self.calibrate(id, &mut operation, &budget, &mut last)?,
        };

        let mut rounds = self.config.rounds;
        let mut durations: Vec<Duration> = Vec::new();
        while rounds.map_or(true, |target| durations.len() < target as usize) {
            if let Some(hook) = self.config.between_rounds {
                hook();
            }
            let elapsed = run_batch(id, &mut operation, iterations, &mut last)?;
            durations.push(elapsed);
            budget.check()?;

            if rounds.is_none() {
                let planned = self.planned_rounds(elapsed);
                debug!(?elapsed, planned, "planned rounds from first round");
                rounds = Some(planned);
            }
        }

        let measurement = Measurement::from_rounds(&durations, iterations)
            .ok_or_else(|| Error::configuration(format!("no samples were collected for '{id}'")))?;
        let stats = Stats::from_measurement(&measurement, self.config.outliers);
        info!(
            mean = stats.mean,
            min = stats.min,
            max = stats.max,
            rounds = stats.rounds,
            iterations = stats.iterations,
            "scenario measured"
        );

        let output = last.ok_or_else(|| {
            Error::configuration(format!("operation of '{id}' was never invoked"))
        })?;
        Ok((ResultRecord::new(id.clone(), stats), output))
    }

    /// Grow the batch size until one batch lasts at least `min_time`
    fn calibrate<T, F>(
        &self,
        id: &ScenarioId,
        operation: &mut F,
        budget: &Budget<'_>,
        last: &mut Option<T>,
    ) -> Result<u64>
    where
        F: FnMut() -> anyhow::Result<T>,
    {
        let min_time = self.config.min_time;
        let max_batch = self.config.max_batch;
        let mut batch: u64 = 1;

        loop {
            let elapsed = run_batch(id, operation, batch, last)?;
            budget.check()?;
            debug!(batch, ?elapsed, "calibration batch");

            if elapsed >= min_time {
                return Ok(batch);
            }
            if batch >= max_batch {
                return Err(Error::Calibration {
                    scenario: id.clone(),
                    max_batch,
                    min_time,
                    reached: elapsed,
                });
            }

            let factor = if elapsed.is_zero() {
                10
            } else {
                (min_time.as_secs_f64() / elapsed.as_secs_f64()).ceil() as u64
            };
            batch = batch.saturating_mul(factor.clamp(2, 10)).min(max_batch);
        }
    }

    /// Rounds needed to fill `max_time`, given the duration of one round
    fn planned_rounds(&self, round: Duration) -> u32 {
        let (min_rounds, max_rounds) = (self.config.min_rounds, self.config.max_rounds);
        if round.is_zero() {
            return max_rounds;
        }
        let wanted = (self.config.max_time.as_secs_f64() / round.as_secs_f64()).ceil();
        (wanted.min(f64::from(max_rounds)) as u32).clamp(min_rounds, max_rounds)
    }
}

/// Wall-time budget of one scenario run
struct Budget<'a> {
    scenario: &'a ScenarioId,
    started: Instant,
    limit: Option<Duration>,
}

impl<'a> Budget<'a> {
    fn start(scenario: &'a ScenarioId, limit: Option<Duration>) -> Self {
        Self {
            scenario,
            started: Instant::now(),
            limit,
        }
    }

    fn check(&self) -> Result<()> {
        let Some(budget) = self.limit else {
            return Ok(());
        };
        let elapsed = self.started.elapsed();
        if elapsed > budget {
            warn!(?elapsed, ?budget, "scenario exceeded its time budget");
            return Err(Error::Timeout {
                scenario: self.scenario.clone(),
                budget,
                elapsed,
            });
        }
        Ok(())
    }
}

/// Invoke the operation `iterations` times back to back and time the batch
fn run_batch<T, F>(
    id: &ScenarioId,
    operation: &mut F,
    iterations: u64,
    last: &mut Option<T>,
) -> Result<Duration>
where
    F: FnMut() -> anyhow::Result<T>,
{
    let start = Instant::now();
    for _ in 0..iterations {
        *last = Some(black_box(invoke(id, operation)?));
    }
    Ok(start.elapsed())
}

fn invoke<T, F>(id: &ScenarioId, operation: &mut F) -> Result<T>
where
    F: FnMut() -> anyhow::Result<T>,
{
    guarded(id, operation).inspect_error(|e| warn!(error = %e, "operation failed"))
}

/// Call `f`, turning both its error and a panic into an operation error
fn guarded<T, F>(id: &ScenarioId, f: F) -> Result<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(cause)) => Err(Error::operation(id.clone(), cause)),
        Err(payload) => Err(Error::operation(
            id.clone(),
            anyhow::anyhow!("operation panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

fn attach_phase(error: Error, phase: &str) -> Error {
    match error {
        Error::Operation { scenario, source } => Error::Operation {
            scenario,
            source: source.context(phase.to_owned()),
        },
        other => other,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
