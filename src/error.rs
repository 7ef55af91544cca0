//! Error handling module
//!
//! This module provides unified error handling for the opbench harness.
//! Every scenario failure carries the identity of the scenario it belongs to,
//! so a suite run can report which scenarios failed and why.

use crate::harness::ScenarioId;
use std::fmt;
use std::time::Duration;

/// Result type alias for the harness
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Debug)]
pub enum Error {
    /// Bad or duplicate scenario registration, or an unknown scenario selection
    Configuration {
        scenario: Option<ScenarioId>,
        message: String,
    },
    /// The timed operation (or its fixture construction) failed
    Operation {
        scenario: ScenarioId,
        source: anyhow::Error,
    },
    /// Calibration hit the batch-size cap before reaching the minimum duration
    Calibration {
        scenario: ScenarioId,
        max_batch: u64,
        min_time: Duration,
        reached: Duration,
    },
    /// The scenario exceeded its wall-time budget
    Timeout {
        scenario: ScenarioId,
        budget: Duration,
        elapsed: Duration,
    },
    /// IO-related errors
    Io(std::io::Error),
    /// Report rendering or encoding failed
    Report(String),
    /// Settings resolution errors
    Config(crate::config::ConfigError),
}

impl Error {
    /// Create a configuration error that is not tied to a scenario
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Error::Configuration {
            scenario: None,
            message: message.into(),
        }
    }

    /// Create the error raised when a scenario identity is registered twice
    pub fn duplicate_scenario(scenario: ScenarioId) -> Self {
        Error::Configuration {
            message: format!("scenario '{scenario}' is already registered"),
            scenario: Some(scenario),
        }
    }

    /// Wrap an operation failure with the identity of its scenario
    pub fn operation(scenario: ScenarioId, source: anyhow::Error) -> Self {
        Error::Operation { scenario, source }
    }

    /// Identity of the scenario this error belongs to, if any
    pub fn scenario(&self) -> Option<&ScenarioId> {
        match self {
            Error::Configuration { scenario, .. } => scenario.as_ref(),
            Error::Operation { scenario, .. }
            | Error::Calibration { scenario, .. }
            | Error::Timeout { scenario, .. } => Some(scenario),
            Error::Io(_) | Error::Report(_) | Error::Config(_) => None,
        }
    }

    /// Short machine-readable label of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration { .. } => "configuration",
            Error::Operation { .. } => "operation",
            Error::Calibration { .. } => "calibration",
            Error::Timeout { .. } => "timeout",
            Error::Io(_) => "io",
            Error::Report(_) => "report",
            Error::Config(_) => "config",
        }
    }

    /// Map the message of message-carrying errors
    ///
    /// Errors whose payload is structured (operation, calibration, timeout,
    /// IO, settings) are returned unchanged.
    pub fn map_context<F>(self, f: F) -> Self
    where
        F: FnOnce(String) -> String,
    {
        match self {
            Error::Configuration { scenario, message } => Error::Configuration {
                scenario,
                message: f(message),
            },
            Error::Report(msg) => Error::Report(f(msg)),
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration { message, .. } => write!(f, "Configuration error: {message}"),
            Error::Operation { scenario, source } => {
                write!(f, "Operation error in '{scenario}': {source:#}")
            }
            Error::Calibration {
                scenario,
                max_batch,
                min_time,
                reached,
            } => write!(
                f,
                "Calibration error in '{scenario}': {max_batch} iterations took {reached:?}, below the minimum of {min_time:?}"
            ),
            Error::Timeout {
                scenario,
                budget,
                elapsed,
            } => write!(
                f,
                "Timeout error in '{scenario}': ran for {elapsed:?}, budget is {budget:?}"
            ),
            Error::Io(err) => write!(f, "IO error: {err}"),
            Error::Report(msg) => write!(f, "Report error: {msg}"),
            Error::Config(err) => write!(f, "Settings error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Operation { source, .. } => Some(&**source),
            Error::Io(err) => Some(err),
            Error::Config(err) => Some(err),
            Error::Configuration { .. }
            | Error::Calibration { .. }
            | Error::Timeout { .. }
            | Error::Report(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Report(format!("JSON encoding failed: {err}"))
    }
}

/// Extensions for harness results
pub trait ResultExt<T> {
    /// Prefix the message of message-carrying errors with lazily built context
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Apply a side effect to the error without changing the Result
    fn inspect_error<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(&Error);
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.map_context(|msg| format!("{}: {}", f(), msg)))
    }

    fn inspect_error<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(&Error),
    {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }
}
