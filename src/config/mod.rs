//! Configuration module for opbench
//!
//! This module combines CLI arguments with `OPBENCH_*` environment variables
//! using strict error handling and clear priority logic.
//!
//! # Architecture
//!
//! - [`env_reader`] - Low-level environment lookup abstraction
//! - [`env_config`] - Typed, validated environment settings
//! - [`app_config`] - High-level application configuration with CLI integration
//!
//! # Error Handling
//!
//! - Unreadable variables result in [`ConfigError`], not fallback to defaults
//! - Malformed values result in [`ConfigError`], not fallback to defaults
//! - Only unset variables fall through to the defaults
//!
//! # Priority Logic
//!
//! 1. CLI parameters (highest priority)
//! 2. Environment variables
//! 3. Harness defaults
//!
//! # Usage
//!
//! ```rust
//! use opbench::config::{AppConfig, CliArgs, ConfigError};
//!
//! let cli_args = CliArgs {
//!     rounds: Some(5),
//!     iterations: Some(10),
//!     ..CliArgs::default()
//! };
//!
//! match AppConfig::from_cli(cli_args) {
//!     Ok(config) => {
//!         assert_eq!(config.harness_config().rounds, Some(5));
//!     }
//!     Err(ConfigError::InvalidEnvValue { key, value, expected }) => {
//!         eprintln!("{key}='{value}' is invalid, expected {expected}");
//!     }
//!     Err(other) => eprintln!("{other}"),
//! }
//! ```

pub mod app_config;
pub mod env_config;
pub mod env_reader;

pub use app_config::{AppConfig, CliArgs, ConfigBuilder};
pub use env_config::{ConfigError, EnvConfig, EnvSettings};
pub use env_reader::{EnvError, EnvReader, SystemEnvReader};

#[cfg(test)]
pub use env_reader::MockEnvReader;
