//! opbench library
//!
//! A micro-benchmark harness plus a suite comparing alternative ways to
//! build lists, serialize mappings and concatenate strings.
//!
//! # Examples
//!
//! Basic usage:
//!
//! ```rust
//! use opbench::{workloads, Harness, HarnessConfig, Report};
//!
//! let suite = workloads::suite(Some(1_000))?;
//! let harness = Harness::new(HarnessConfig::fixed(2, 1))?;
//! let run = suite.run_matching(&harness, |id| id.group() == "list_creation");
//!
//! let report = Report::from_run(&run);
//! assert_eq!(report.group("list_creation").map(<[_]>::len), Some(3));
//! # Ok::<(), opbench::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod harness;
pub mod report;
pub mod workloads;

pub use config::{AppConfig, CliArgs, ConfigError};
pub use error::{Error, Result, ResultExt};
pub use harness::{
    fallible_operation, operation, Harness, HarnessConfig, OutlierPolicy, Params, ResultRecord,
    ScenarioId, Stats, Suite, SuiteRun,
};
pub use report::{report, Report, ReportFormat};
