//! CLI entry point for opbench
//!
//! Registers the workload suite, runs the selected scenarios and prints the
//! report. Exit status: 0 when every selected scenario succeeded, 1 when any
//! failed, 2 on configuration errors.

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

use opbench::config::{CliArgs, ConfigError, EnvConfig, EnvReader, SystemEnvReader};
use opbench::{workloads, AppConfig, Error, Harness, Report, Result, ResultExt};

const DEFAULT_LOG_FILTER: &str = "warn";

/// Micro-benchmarks comparing alternative ways to perform common operations
#[derive(Parser)]
#[command(name = "opbench")]
#[command(version, about, long_about = None)]
struct Args {
    /// Print the registered scenarios and exit
    #[arg(long)]
    list: bool,

    /// Run only this group (repeatable)
    #[arg(short, long = "group", value_name = "NAME")]
    groups: Vec<String>,

    /// Run only scenarios whose name contains this text
    #[arg(short = 'k', long, value_name = "SUBSTR")]
    filter: Option<String>,

    /// Untimed invocations before measuring
    #[arg(long, value_name = "N")]
    warmup: Option<u32>,

    /// Measured rounds per scenario (automatic when unset)
    #[arg(long, value_name = "N")]
    rounds: Option<u32>,

    /// Iterations per round (calibrated when unset)
    #[arg(long, value_name = "N")]
    iterations: Option<u64>,

    /// Minimum duration of a calibrated round
    #[arg(long, value_name = "MS")]
    min_time_ms: Option<u64>,

    /// Target total measuring time for automatic rounds
    #[arg(long, value_name = "MS")]
    max_time_ms: Option<u64>,

    /// Wall-time budget per scenario
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Outlier handling: none, stddev or iqr
    #[arg(long, value_name = "POLICY")]
    outliers: Option<String>,

    /// Skip serialization scenarios whose payload size exceeds N
    #[arg(long, value_name = "N")]
    max_size: Option<usize>,

    /// Stdout format: text or json
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Also write the JSON report to this file
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

/// Convert CLI args to CliArgs struct for AppConfig
impl From<Args> for CliArgs {
    fn from(args: Args) -> Self {
        Self {
            list: args.list,
            groups: args.groups,
            filter: args.filter,
            warmup: args.warmup,
            rounds: args.rounds,
            iterations: args.iterations,
            min_time_ms: args.min_time_ms,
            max_time_ms: args.max_time_ms,
            timeout_ms: args.timeout_ms,
            outliers: args.outliers,
            max_size: args.max_size,
            format: args.format,
            json: args.json,
        }
    }
}

/// Log filter from the environment, or the default when none is set
fn log_filter<R: EnvReader>(reader: &R) -> std::result::Result<String, ConfigError> {
    Ok(EnvConfig::log_filter_with_reader(reader)?
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned()))
}

/// Install the stderr subscriber; `OPBENCH_LOG` wins over `RUST_LOG`
fn init_tracing() -> std::result::Result<(), ConfigError> {
    let filter = log_filter(&SystemEnvReader)?;
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .try_init();
    Ok(())
}

/// Run the selected scenarios and write the report
///
/// Returns whether every selected scenario succeeded.
fn run<W: Write>(config: &AppConfig, mut output: W) -> Result<bool> {
    let suite = workloads::suite(config.max_size())?;

    if config.list_only() {
        for id in suite.ids().filter(|id| config.selects(id)) {
            writeln!(output, "{id}")?;
        }
        return Ok(true);
    }

    let harness = Harness::new(config.harness_config().clone())?;
    let run = suite.run_matching(&harness, |id| config.selects(id));
    if run.records.is_empty() && run.failures.is_empty() {
        return Err(Error::configuration("no scenario matches the selection"));
    }
    info!(
        succeeded = run.records.len(),
        failed = run.failures.len(),
        "suite finished"
    );

    let report = Report::from_run(&run);
    write!(output, "{}", report.render(config.format())?)?;
    output.flush()?;

    if let Some(path) = config.json_path() {
        report
            .write_json(path)
            .with_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), "wrote JSON report");
    }

    Ok(run.is_success())
}

fn exit_code_for(error: &Error) -> ExitCode {
    match error {
        Error::Configuration { .. } | Error::Config(_) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    if let Err(error) = init_tracing() {
        eprintln!("Error: {error}");
        return ExitCode::from(2);
    }

    let config = match AppConfig::from_cli(CliArgs::from(Args::parse())) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {error}");
            return ExitCode::from(2);
        }
    };

    match run(&config, io::stdout().lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Error: {error}");
            exit_code_for(&error)
        }
    }
}
