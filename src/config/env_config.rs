//! Environment configuration module
//!
//! Typed, validated lookups of the `OPBENCH_*` environment variables.
//! A variable that is set but malformed is an error, never a silent fallback.

use super::env_reader::{EnvError, EnvReader, SystemEnvReader};
use crate::harness::OutlierPolicy;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const ENV_WARMUP: &str = "OPBENCH_WARMUP";
pub const ENV_ROUNDS: &str = "OPBENCH_ROUNDS";
pub const ENV_ITERATIONS: &str = "OPBENCH_ITERATIONS";
pub const ENV_MIN_TIME_MS: &str = "OPBENCH_MIN_TIME_MS";
pub const ENV_MAX_TIME_MS: &str = "OPBENCH_MAX_TIME_MS";
pub const ENV_TIMEOUT_MS: &str = "OPBENCH_TIMEOUT_MS";
pub const ENV_OUTLIERS: &str = "OPBENCH_OUTLIERS";
pub const ENV_LOG: &str = "OPBENCH_LOG";
pub const ENV_RUST_LOG: &str = "RUST_LOG";

/// Errors that can occur while resolving settings
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Environment variable holds a value of the wrong shape
    InvalidEnvValue {
        key: String,
        value: String,
        expected: String,
    },
    /// Environment variable could not be read
    UnreadableEnv { key: String },
    /// Invalid CLI argument value
    InvalidCliArgument {
        argument: String,
        value: String,
        expected: String,
    },
    /// The combined settings cannot drive a harness
    InvalidSettings { reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidEnvValue {
                key,
                value,
                expected,
            } => write!(
                f,
                "Invalid environment value: {key}='{value}' (expected: {expected})"
            ),
            ConfigError::UnreadableEnv { key } => {
                write!(f, "Environment variable '{key}' could not be read")
            }
            ConfigError::InvalidCliArgument {
                argument,
                value,
                expected,
            } => write!(
                f,
                "Invalid CLI argument: {argument}='{value}' (expected: {expected})"
            ),
            ConfigError::InvalidSettings { reason } => write!(f, "Invalid settings: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<EnvError> for ConfigError {
    fn from(error: EnvError) -> Self {
        match error {
            EnvError::NotUnicode { key } => ConfigError::UnreadableEnv { key },
        }
    }
}

/// Settings found in the environment; `None` means not set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvSettings {
    pub warmup: Option<u32>,
    pub rounds: Option<u32>,
    pub iterations: Option<u64>,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
    pub timeout: Option<Duration>,
    pub outliers: Option<OutlierPolicy>,
}

impl EnvSettings {
    /// Read every setting from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_reader(&SystemEnvReader)
    }

    /// Read every setting with a custom reader (for testing)
    pub fn load_with_reader<R: EnvReader>(reader: &R) -> Result<Self, ConfigError> {
        Ok(Self {
            warmup: EnvConfig::count_with_reader(reader, ENV_WARMUP, 0)?,
            rounds: EnvConfig::count_with_reader(reader, ENV_ROUNDS, 1)?,
            iterations: EnvConfig::count_with_reader(reader, ENV_ITERATIONS, 1)?,
            min_time: EnvConfig::millis_with_reader(reader, ENV_MIN_TIME_MS, 0)?,
            max_time: EnvConfig::millis_with_reader(reader, ENV_MAX_TIME_MS, 1)?,
            timeout: EnvConfig::millis_with_reader(reader, ENV_TIMEOUT_MS, 1)?,
            outliers: EnvConfig::outliers_with_reader(reader)?,
        })
    }
}

/// Environment lookups
pub struct EnvConfig;

impl EnvConfig {
    /// Read an integer count that must be at least `min`
    pub fn count_with_reader<R, T>(reader: &R, key: &str, min: T) -> Result<Option<T>, ConfigError>
    where
        R: EnvReader,
        T: FromStr + PartialOrd + fmt::Display + Copy,
    {
        reader
            .get_var(key)?
            .map(|value| Self::parse_count(&value, key, min))
            .transpose()
    }

    /// Read a millisecond duration that must be at least `min_ms`
    pub fn millis_with_reader<R: EnvReader>(
        reader: &R,
        key: &str,
        min_ms: u64,
    ) -> Result<Option<Duration>, ConfigError> {
        Ok(Self::count_with_reader(reader, key, min_ms)?.map(Duration::from_millis))
    }

    /// Read the outlier policy name
    pub fn outliers_with_reader<R: EnvReader>(
        reader: &R,
    ) -> Result<Option<OutlierPolicy>, ConfigError> {
        reader
            .get_var(ENV_OUTLIERS)?
            .map(|value| {
                value
                    .parse::<OutlierPolicy>()
                    .map_err(|_| ConfigError::InvalidEnvValue {
                        key: ENV_OUTLIERS.to_owned(),
                        value: value.clone(),
                        expected: "none, stddev or iqr".to_owned(),
                    })
            })
            .transpose()
    }

    /// Read the log filter directives; `OPBENCH_LOG` wins over `RUST_LOG`
    pub fn log_filter_with_reader<R: EnvReader>(
        reader: &R,
    ) -> Result<Option<String>, ConfigError> {
        for key in [ENV_LOG, ENV_RUST_LOG] {
            if let Some(value) = reader.get_var(key)? {
                EnvFilter::try_new(&value).map_err(|e| ConfigError::InvalidEnvValue {
                    key: key.to_owned(),
                    value: value.clone(),
                    expected: format!("tracing filter directives ({e})"),
                })?;
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn parse_count<T>(value: &str, key: &str, min: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + fmt::Display + Copy,
    {
        value
            .parse::<T>()
            .ok()
            .filter(|parsed| *parsed >= min)
            .ok_or_else(|| ConfigError::InvalidEnvValue {
                key: key.to_owned(),
                value: value.to_owned(),
                expected: format!("an integer >= {min}"),
            })
    }
}
