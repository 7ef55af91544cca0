//! Result reporting
//!
//! Groups result records by group name, sorted by variant and parameters,
//! and renders them as a console table or a JSON document. The flat
//! `identity -> statistics` mapping is available for any other consumer.

use crate::error::{Error, Result};
use crate::harness::{Params, ResultRecord, Stats, SuiteRun};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;
use std::str::FromStr;
use tempfile::NamedTempFile;

/// Stdout rendering of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{other}'")),
        }
    }
}

/// A failed scenario as shown in reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureSummary {
    pub name: String,
    pub group: String,
    pub variant: String,
    pub params: Params,
    pub kind: &'static str,
    pub message: String,
}

/// Records grouped for output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    groups: BTreeMap<String, Vec<ResultRecord>>,
    failures: Vec<FailureSummary>,
}

/// Group records by group name, sorted by variant and parameters
pub fn report(records: &[ResultRecord]) -> Report {
    let mut groups: BTreeMap<String, Vec<ResultRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.id.group().to_owned())
            .or_default()
            .push(record.clone());
    }
    for records in groups.values_mut() {
        records.sort_by(|a, b| a.id.cmp(&b.id));
    }
    Report {
        groups,
        failures: Vec::new(),
    }
}

#[derive(Serialize)]
struct JsonBenchmark<'a> {
    name: String,
    #[serde(flatten)]
    record: &'a ResultRecord,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    benchmarks: Vec<JsonBenchmark<'a>>,
    failures: &'a [FailureSummary],
}

impl Report {
    /// Build a report from a suite run, keeping its failures
    pub fn from_run(run: &SuiteRun) -> Self {
        let mut built = report(&run.records);
        built.failures = run
            .failures
            .iter()
            .map(|failure| FailureSummary {
                name: failure.id.to_string(),
                group: failure.id.group().to_owned(),
                variant: failure.id.variant().to_owned(),
                params: failure.id.params().clone(),
                kind: failure.error.kind(),
                message: failure.error.to_string(),
            })
            .collect();
        built
    }

    /// Group names in sorted order
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Sorted records of one group
    pub fn group(&self, name: &str) -> Option<&[ResultRecord]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn failures(&self) -> &[FailureSummary] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.failures.is_empty()
    }

    /// Flat mapping from scenario identity to statistics
    pub fn flatten(&self) -> BTreeMap<String, Stats> {
        self.groups
            .values()
            .flatten()
            .map(|record| (record.id.to_string(), record.stats.clone()))
            .collect()
    }

    /// Render in the requested format
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// JSON document with `benchmarks` and `failures` arrays
    pub fn to_json(&self) -> Result<String> {
        let benchmarks = self
            .groups
            .values()
            .flatten()
            .map(|record| JsonBenchmark {
                name: record.id.to_string(),
                record,
            })
            .collect();
        let document = JsonDocument {
            benchmarks,
            failures: &self.failures,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Write the JSON document to `path`, replacing it atomically
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staging = NamedTempFile::new_in(directory)?;
        staging.write_all(json.as_bytes())?;
        staging.write_all(b"\n")?;
        staging
            .persist(path)
            .map_err(|e| Error::Report(format!("failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Console table per group, followed by the failure list
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (group, records) in &self.groups {
            render_group(&mut out, group, records);
            out.push('\n');
        }
        if !self.failures.is_empty() {
            let _ = writeln!(out, "{} scenario(s) failed:", self.failures.len());
            for failure in &self.failures {
                let _ = writeln!(
                    out,
                    "  FAILED {} [{}]: {}",
                    failure.name, failure.kind, failure.message
                );
            }
        }
        out
    }
}

/// Unit name and scale picked from the fastest minimum of a group
fn time_unit(records: &[ResultRecord]) -> (&'static str, f64) {
    let fastest = records
        .iter()
        .map(|record| record.stats.min)
        .fold(f64::INFINITY, f64::min);
    match fastest {
        t if t < 1e-6 => ("ns", 1e9),
        t if t < 1e-3 => ("us", 1e6),
        t if t < 1.0 => ("ms", 1e3),
        _ => ("s", 1.0),
    }
}

fn render_group(out: &mut String, group: &str, records: &[ResultRecord]) {
    let (unit, scale) = time_unit(records);
    let name_header = format!("Name (time in {unit})");
    let headers = [
        "Min", "Max", "Mean", "StdDev", "Median", "IQR", "Outliers", "OPS", "Rounds", "Iterations",
    ];

    let rows: Vec<(String, Vec<String>)> = records
        .iter()
        .map(|record| {
            let s = &record.stats;
            let cells = vec![
                format!("{:.4}", s.min * scale),
                format!("{:.4}", s.max * scale),
                format!("{:.4}", s.mean * scale),
                format!("{:.4}", s.stddev * scale),
                format!("{:.4}", s.median * scale),
                format!("{:.4}", s.iqr * scale),
                format!("{};{}", s.stddev_outliers, s.iqr_outliers),
                format!("{:.4}", s.ops),
                s.rounds.to_string(),
                s.iterations.to_string(),
            ];
            (record.id.label(), cells)
        })
        .collect();

    let name_width = rows
        .iter()
        .map(|(name, _)| name.len())
        .chain(std::iter::once(name_header.len()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|(_, cells)| cells[i].len())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut header_line = format!("{name_header:<name_width$}");
    for (header, width) in headers.iter().zip(&widths) {
        let _ = write!(header_line, "  {header:>width$}");
    }
    let rule = "-".repeat(header_line.len());

    let _ = writeln!(out, "benchmark '{group}': {} tests", records.len());
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{header_line}");
    let _ = writeln!(out, "{rule}");
    for (name, cells) in &rows {
        let mut line = format!("{name:<name_width$}");
        for (cell, width) in cells.iter().zip(&widths) {
            let _ = write!(line, "  {cell:>width$}");
        }
        let _ = writeln!(out, "{line}");
    }
    let _ = writeln!(out, "{rule}");
}
