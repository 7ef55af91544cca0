//! Scenario registry and suite execution
//!
//! Scenarios are registered once at suite-definition time and run one at a
//! time. A failing scenario never aborts its siblings: suite runs collect
//! records and failures side by side.
//!
//! Operations and their outputs are `Send` so a scenario under a time budget
//! can be moved to a worker thread and abandoned if it never returns.

use super::runner::Harness;
use super::scenario::{Params, ScenarioId};
use super::stats::ResultRecord;
use crate::error::{Error, Result};
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Opaque return value of a registered operation
pub type Output = Box<dyn Any + Send>;

/// Zero-argument operation timed by the harness
pub type Operation = Box<dyn FnMut() -> anyhow::Result<Output> + Send>;

type Factory = Arc<dyn Fn(&Params) -> anyhow::Result<Operation> + Send + Sync>;

/// Wrap an infallible closure as a registered operation
pub fn operation<T, F>(mut f: F) -> Operation
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    Box::new(move || Ok(Box::new(f()) as Output))
}

/// Wrap a fallible closure as a registered operation
pub fn fallible_operation<T, F>(mut f: F) -> Operation
where
    T: Send + 'static,
    F: FnMut() -> anyhow::Result<T> + Send + 'static,
{
    Box::new(move || f().map(|value| Box::new(value) as Output))
}

/// A registered scenario: identity plus the factory building its operation
///
/// Cloning is cheap; clones share the factory.
#[derive(Clone)]
pub struct Scenario {
    id: ScenarioId,
    factory: Factory,
}

impl Scenario {
    pub fn id(&self) -> &ScenarioId {
        &self.id
    }

    /// Construct the fixture and the operation bound to it
    pub fn build(&self) -> anyhow::Result<Operation> {
        (self.factory)(self.id.params())
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario").field("id", &self.id).finish()
    }
}

/// A scenario that failed during a suite run
#[derive(Debug)]
pub struct ScenarioFailure {
    pub id: ScenarioId,
    pub error: Error,
}

/// Records and failures of one suite run, in execution order
#[derive(Debug, Default)]
pub struct SuiteRun {
    pub records: Vec<ResultRecord>,
    pub failures: Vec<ScenarioFailure>,
}

impl SuiteRun {
    /// True when no scenario failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Record of the given scenario, if it succeeded
    pub fn record(&self, id: &ScenarioId) -> Option<&ResultRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    /// Failure of the given scenario, if it failed
    pub fn failure(&self, id: &ScenarioId) -> Option<&ScenarioFailure> {
        self.failures.iter().find(|failure| &failure.id == id)
    }

    fn push(&mut self, id: &ScenarioId, outcome: Result<ResultRecord>) {
        match outcome {
            Ok(record) => self.records.push(record),
            Err(error) => {
                warn!(scenario = %id, kind = error.kind(), error = %error, "scenario failed");
                self.failures.push(ScenarioFailure {
                    id: id.clone(),
                    error,
                });
            }
        }
    }
}

/// Registry of scenarios
#[derive(Debug, Default)]
pub struct Suite {
    scenarios: Vec<Scenario>,
    known: HashSet<ScenarioId>,
}

impl Suite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one scenario
    ///
    /// The factory receives the scenario's parameters and returns the
    /// operation to time; fixture data is built there, outside the timed
    /// region. Registering the same (group, variant, params) twice fails.
    pub fn register<G, V, F>(
        &mut self,
        group: G,
        variant: V,
        params: Params,
        factory: F,
    ) -> Result<&ScenarioId>
    where
        G: Into<String>,
        V: Into<String>,
        F: Fn(&Params) -> anyhow::Result<Operation> + Send + Sync + 'static,
    {
        let id = ScenarioId::new(group, variant, params);
        if id.group().trim().is_empty() || id.variant().trim().is_empty() {
            return Err(Error::Configuration {
                message: format!("scenario '{id}' needs a non-empty group and variant"),
                scenario: Some(id),
            });
        }
        if !self.known.insert(id.clone()) {
            return Err(Error::duplicate_scenario(id));
        }

        self.scenarios.push(Scenario {
            id,
            factory: Arc::new(factory),
        });
        let registered = &self.scenarios[self.scenarios.len() - 1];
        Ok(registered.id())
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Scenario identities in registration order
    pub fn ids(&self) -> impl Iterator<Item = &ScenarioId> {
        self.scenarios.iter().map(Scenario::id)
    }

    /// Distinct group names in registration order
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for id in self.ids() {
            if !groups.contains(&id.group()) {
                groups.push(id.group());
            }
        }
        groups
    }

    pub fn get(&self, id: &ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|scenario| scenario.id() == id)
    }

    /// Run every scenario in registration order
    pub fn run_all(&self, harness: &Harness) -> SuiteRun {
        self.run_matching(harness, |_| true)
    }

    /// Run the scenarios accepted by `predicate`, in registration order
    pub fn run_matching<P>(&self, harness: &Harness, predicate: P) -> SuiteRun
    where
        P: Fn(&ScenarioId) -> bool,
    {
        let selected: Vec<&Scenario> = self
            .scenarios
            .iter()
            .filter(|scenario| predicate(scenario.id()))
            .collect();
        Self::execute(harness, selected)
    }

    /// Run the given scenarios in the given order
    ///
    /// Fails before running anything if an identity is not registered.
    pub fn run_selected(&self, harness: &Harness, ids: &[ScenarioId]) -> Result<SuiteRun> {
        let selected = ids
            .iter()
            .map(|id| {
                self.get(id).ok_or_else(|| Error::Configuration {
                    message: format!("scenario '{id}' is not registered"),
                    scenario: Some(id.clone()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::execute(harness, selected))
    }

    fn execute(harness: &Harness, selected: Vec<&Scenario>) -> SuiteRun {
        info!(scenarios = selected.len(), "running suite");
        let mut run = SuiteRun::default();
        for scenario in selected {
            let outcome = harness.run(scenario).map(|outcome| outcome.record);
            run.push(scenario.id(), outcome);
        }
        run
    }
}
