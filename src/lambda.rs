//! Per-alarm failure-rate (lambda) estimation over first-occurrence sheets.
//!
//! Reads every coach sheet produced by the first-occurrence pipeline,
//! optionally gap-fills empty cells with the inter-maintenance gap, and
//! estimates one rate per alarm column: occurrences observed divided by total
//! exposure hours. Zero exposure means the rate is undefined, not zero.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::model::COMPLETION_FORMAT;

/// One first-occurrence sheet loaded back into memory. The first two columns
/// are the intervention timestamps; every column after that is an alarm.
#[derive(Debug)]
pub struct SheetTable {
    pub maintenance_times: Vec<Option<NaiveDateTime>>,
    pub alarm_columns: Vec<String>,
    /// `values[row][col]`, parallel to `alarm_columns`.
    pub values: Vec<Vec<Option<f64>>>,
}

/// Reads one coach sheet. Unparseable timestamps and non-numeric cells are
/// kept as `None` rather than failing the sheet.
pub fn read_sheet(path: &Path) -> Result<SheetTable> {
    let file =
        File::open(path).with_context(|| format!("cannot open sheet {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers = rdr.headers()?.clone();
    let alarm_columns: Vec<String> = headers.iter().skip(2).map(str::to_string).collect();

    let mut maintenance_times = Vec::new();
    let mut values = Vec::new();

    for result in rdr.records() {
        let record = result?;
        maintenance_times.push(
            record
                .get(1)
                .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), COMPLETION_FORMAT).ok()),
        );

        let row: Vec<Option<f64>> = (0..alarm_columns.len())
            .map(|col| {
                record
                    .get(col + 2)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .and_then(|s| s.parse::<f64>().ok())
            })
            .collect();
        values.push(row);
    }

    debug!(
        path = %path.display(),
        rows = values.len(),
        alarms = alarm_columns.len(),
        "Sheet loaded"
    );
    Ok(SheetTable {
        maintenance_times,
        alarm_columns,
        values,
    })
}

/// Gap-fill preprocessing: an empty alarm cell whose own `maintenance_time`
/// is defined is replaced with the gap in hours to the next row with a
/// defined `maintenance_time`.
///
/// A single backward pass carries the next known timestamp, so each cell is
/// resolved in constant time.
pub fn gap_fill(table: &mut SheetTable) {
    let n = table.maintenance_times.len();
    let mut next_known: Vec<Option<NaiveDateTime>> = vec![None; n];
    let mut carry = None;
    for i in (0..n).rev() {
        next_known[i] = carry;
        if table.maintenance_times[i].is_some() {
            carry = table.maintenance_times[i];
        }
    }

    for (i, row) in table.values.iter_mut().enumerate() {
        let (Some(prev), Some(next)) = (table.maintenance_times[i], next_known[i]) else {
            continue;
        };
        let gap_hours = (next - prev).num_seconds() as f64 / 3600.0;
        for cell in row.iter_mut() {
            if cell.is_none() {
                *cell = Some(gap_hours);
            }
        }
    }
}

/// Accumulated evidence for one alarm type across all sheets.
#[derive(Debug, Default, Clone, Copy)]
pub struct LambdaEstimate {
    pub occurrences: usize,
    pub exposure_hours: f64,
}

impl LambdaEstimate {
    /// Occurrences per exposure hour; `None` when there is no exposure time
    /// to divide by.
    pub fn rate(&self) -> Option<f64> {
        if self.exposure_hours > 0.0 {
            Some(self.occurrences as f64 / self.exposure_hours)
        } else {
            None
        }
    }
}

/// Combines all sheets and estimates a rate per alarm column, ordered by
/// numeric alarm id.
pub fn estimate_lambdas(tables: &[SheetTable]) -> Vec<(String, LambdaEstimate)> {
    let mut by_alarm: HashMap<String, LambdaEstimate> = HashMap::new();

    for table in tables {
        for (col, alarm) in table.alarm_columns.iter().enumerate() {
            let estimate = by_alarm.entry(alarm.clone()).or_default();
            for row in &table.values {
                if let Some(hours) = row[col] {
                    estimate.occurrences += 1;
                    estimate.exposure_hours += hours;
                }
            }
        }
    }

    let mut estimates: Vec<_> = by_alarm.into_iter().collect();
    estimates.sort_by_key(|(alarm, _)| {
        let numeric = alarm.parse::<i64>().ok();
        (numeric.is_none(), numeric, alarm.clone())
    });
    estimates
}

/// Writes the `alarm,lambda` summary CSV. An undefined rate is an empty cell.
pub fn write_lambdas(path: &Path, estimates: &[(String, LambdaEstimate)]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);
    writer.write_record(["alarm", "lambda"])?;

    for (alarm, estimate) in estimates {
        let rate = estimate.rate().map(|r| r.to_string()).unwrap_or_default();
        writer.write_record([alarm.as_str(), rate.as_str()])?;
    }

    writer.flush()?;
    Ok(())
}

/// Loads every coach sheet under `results_dir`, optionally gap-fills, and
/// writes the lambda summary to `output`.
#[tracing::instrument]
pub fn run_lambda_estimation(results_dir: &Path, preprocess: bool, output: &Path) -> Result<()> {
    let mut tables = Vec::new();

    for path in discover_sheets(results_dir)? {
        match read_sheet(&path) {
            Ok(mut table) => {
                if preprocess {
                    gap_fill(&mut table);
                }
                tables.push(table);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Sheet skipped"),
        }
    }

    info!(sheets = tables.len(), preprocess, "Estimating failure rates");
    let estimates = estimate_lambdas(&tables);
    write_lambdas(output, &estimates)?;
    info!(alarms = estimates.len(), path = %output.display(), "Lambda summary written");
    Ok(())
}

/// Every coach CSV under the per-train result directories, sorted.
fn discover_sheets(results_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sheets = Vec::new();

    for entry in fs::read_dir(results_dir)? {
        let train_dir = entry?.path();
        let is_train_dir = train_dir.is_dir()
            && train_dir
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("_prima_occorrenza"));
        if !is_train_dir {
            continue;
        }

        for entry in fs::read_dir(&train_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                sheets.push(path);
            }
        }
    }

    sheets.sort();
    Ok(sheets)
}
