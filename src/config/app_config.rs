//! Application configuration module
//!
//! This module provides the main application configuration structure that combines
//! CLI arguments with environment settings using a clear priority system.

use super::env_config::EnvSettings;
use super::env_reader::EnvReader;
use super::ConfigError;
use crate::harness::{HarnessConfig, OutlierPolicy, ScenarioId};
use crate::report::ReportFormat;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI arguments structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// Only print the registered scenarios
    pub list: bool,
    /// Groups to run; all when empty
    pub groups: Vec<String>,
    /// Substring the scenario name must contain
    pub filter: Option<String>,
    pub warmup: Option<u32>,
    pub rounds: Option<u32>,
    pub iterations: Option<u64>,
    pub min_time_ms: Option<u64>,
    pub max_time_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    /// Outlier policy name (`none`, `stddev`, `iqr`)
    pub outliers: Option<String>,
    /// Largest serialization payload size to register
    pub max_size: Option<usize>,
    /// Stdout format name (`text`, `json`)
    pub format: Option<String>,
    /// Where to also write the JSON report
    pub json: Option<PathBuf>,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    harness: HarnessConfig,
    list: bool,
    groups: Vec<String>,
    filter: Option<String>,
    max_size: Option<usize>,
    format: ReportFormat,
    json_path: Option<PathBuf>,
}

/// Configuration builder for functional composition
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    harness: HarnessConfig,
    list: bool,
    groups: Vec<String>,
    filter: Option<String>,
    max_size: Option<usize>,
    format: ReportFormat,
    json_path: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Create a new configuration builder with default harness settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_harness(mut self, harness: HarnessConfig) -> Self {
        self.harness = harness;
        self
    }

    #[must_use]
    pub const fn with_list(mut self, list: bool) -> Self {
        self.list = list;
        self
    }

    #[must_use]
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn with_max_size(mut self, max_size: Option<usize>) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub const fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_json_path(mut self, path: Option<PathBuf>) -> Self {
        self.json_path = path;
        self
    }

    /// Build the final AppConfig, rejecting harness settings that cannot run
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.harness
            .validate()
            .map_err(|reason| ConfigError::InvalidSettings { reason })?;

        Ok(AppConfig {
            harness: self.harness,
            list: self.list,
            groups: self.groups,
            filter: self.filter,
            max_size: self.max_size,
            format: self.format,
            json_path: self.json_path,
        })
    }
}

impl AppConfig {
    /// Create AppConfig from CLI arguments and the process environment
    ///
    /// Priority order:
    /// 1. CLI parameters (highest priority)
    /// 2. `OPBENCH_*` environment variables
    /// 3. Harness defaults
    pub fn from_cli(cli_args: CliArgs) -> Result<Self, ConfigError> {
        Self::from_settings(cli_args, EnvSettings::load()?)
    }

    /// Create AppConfig with a custom environment reader (for testing)
    pub fn from_cli_with_reader<R: EnvReader>(
        cli_args: CliArgs,
        reader: &R,
    ) -> Result<Self, ConfigError> {
        Self::from_settings(cli_args, EnvSettings::load_with_reader(reader)?)
    }

    /// Create AppConfig from CLI arguments and already loaded environment settings
    pub fn from_settings(cli_args: CliArgs, env: EnvSettings) -> Result<Self, ConfigError> {
        let harness = Self::resolve_harness(&cli_args, &env)?;
        let format = cli_args
            .format
            .as_deref()
            .map(Self::parse_cli_format)
            .transpose()?
            .unwrap_or_default();

        ConfigBuilder::new()
            .with_harness(harness)
            .with_list(cli_args.list)
            .with_groups(cli_args.groups)
            .with_filter(cli_args.filter.filter(|f| !f.trim().is_empty()))
            .with_max_size(cli_args.max_size)
            .with_format(format)
            .with_json_path(cli_args.json)
            .build()
    }

    /// Merge CLI and environment settings over the harness defaults
    fn resolve_harness(cli_args: &CliArgs, env: &EnvSettings) -> Result<HarnessConfig, ConfigError> {
        let defaults = HarnessConfig::default();

        let rounds = Self::require_positive("--rounds", cli_args.rounds)?.or(env.rounds);
        let iterations =
            Self::require_positive("--iterations", cli_args.iterations)?.or(env.iterations);
        let max_time = Self::require_positive("--max-time-ms", cli_args.max_time_ms)?
            .map(Duration::from_millis)
            .or(env.max_time);
        let timeout = Self::require_positive("--timeout-ms", cli_args.timeout_ms)?
            .map(Duration::from_millis)
            .or(env.timeout);
        let outliers = cli_args
            .outliers
            .as_deref()
            .map(Self::parse_cli_outliers)
            .transpose()?
            .or(env.outliers);

        Ok(HarnessConfig {
            warmup: cli_args.warmup.or(env.warmup).unwrap_or(defaults.warmup),
            rounds,
            iterations,
            min_time: cli_args
                .min_time_ms
                .map(Duration::from_millis)
                .or(env.min_time)
                .unwrap_or(defaults.min_time),
            max_time: max_time.unwrap_or(defaults.max_time),
            timeout,
            outliers: outliers.unwrap_or(defaults.outliers),
            ..defaults
        })
    }

    /// Pass an optional count through, rejecting zero
    fn require_positive<T>(argument: &str, value: Option<T>) -> Result<Option<T>, ConfigError>
    where
        T: PartialOrd + Default + Display + Copy,
    {
        match value {
            Some(v) if v <= T::default() => Err(ConfigError::InvalidCliArgument {
                argument: argument.to_owned(),
                value: v.to_string(),
                expected: "an integer >= 1".to_owned(),
            }),
            other => Ok(other),
        }
    }

    fn parse_cli_outliers(value: &str) -> Result<OutlierPolicy, ConfigError> {
        value
            .parse()
            .map_err(|_| ConfigError::InvalidCliArgument {
                argument: "--outliers".to_owned(),
                value: value.to_owned(),
                expected: "none, stddev or iqr".to_owned(),
            })
    }

    fn parse_cli_format(value: &str) -> Result<ReportFormat, ConfigError> {
        value
            .parse()
            .map_err(|_| ConfigError::InvalidCliArgument {
                argument: "--format".to_owned(),
                value: value.to_owned(),
                expected: "text or json".to_owned(),
            })
    }

    /// Harness settings after CLI and environment resolution
    pub fn harness_config(&self) -> &HarnessConfig {
        &self.harness
    }

    pub fn list_only(&self) -> bool {
        self.list
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    pub fn json_path(&self) -> Option<&Path> {
        self.json_path.as_deref()
    }

    /// Whether the group and name filters select this scenario
    pub fn selects(&self, id: &ScenarioId) -> bool {
        let group_selected =
            self.groups.is_empty() || self.groups.iter().any(|group| group == id.group());
        let name_selected = self
            .filter
            .as_deref()
            .is_none_or(|needle| id.to_string().contains(needle));
        group_selected && name_selected
    }
}
