//! Benchmark harness
//!
//! The harness registers named, parameterized scenarios and measures them:
//!
//! - [`scenario`] - scenario identity (group, variant, parameters)
//! - [`suite`] - the registry and failure-isolating suite runs
//! - [`runner`] - warm-up, calibration, timed rounds
//! - [`stats`] - measurements and their aggregate statistics
//! - [`config`] - run settings
//!
//! # Usage
//!
//! ```rust
//! use opbench::harness::{operation, Harness, HarnessConfig, Params, Suite};
//!
//! let mut suite = Suite::new();
//! suite.register("concat", "join", Params::new().with("count", 100), |params| {
//!     let count = params.size("count").unwrap_or(0);
//!     let parts = vec!["x"; count];
//!     Ok(operation(move || parts.concat()))
//! })?;
//!
//! let harness = Harness::new(HarnessConfig::fixed(3, 10))?;
//! let run = suite.run_all(&harness);
//! assert!(run.is_success());
//! assert_eq!(run.records[0].stats.rounds, 3);
//! # Ok::<(), opbench::Error>(())
//! ```

pub mod config;
pub mod runner;
pub mod scenario;
pub mod stats;
pub mod suite;

pub use config::{HarnessConfig, OutlierPolicy};
pub use runner::{Harness, RunOutcome};
pub use scenario::{ParamValue, Params, ScenarioId};
pub use stats::{Measurement, ResultRecord, Stats};
pub use suite::{
    fallible_operation, operation, Operation, Output, Scenario, ScenarioFailure, Suite, SuiteRun,
};
