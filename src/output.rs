//! Result serialization: per-coach first-occurrence sheets and the run
//! summary.
//!
//! Each train gets a `<train>_prima_occorrenza/` directory under the results
//! directory, with one CSV per coach (the workbook-sheet layout flattened to
//! partitioned files). A `summary.json` at the results root records what was
//! written and what was skipped.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::correlator::ResultRow;
use crate::model::COMPLETION_FORMAT;

/// Writes one coach's result sheet and returns its path.
///
/// Header is `Fine guasto`, `maintenance_time`, then one string-labeled
/// column per observed alarm id. Values are hours with two decimals; "no
/// occurrence" is an empty cell.
pub fn write_coach_sheet(
    train_dir: &Path,
    coach: &str,
    alarms: &[i64],
    rows: &[ResultRow],
) -> Result<PathBuf> {
    let path = train_dir.join(format!("{coach}.csv"));
    let mut writer = csv::Writer::from_writer(File::create(&path)?);

    let mut header = vec!["Fine guasto".to_string(), "maintenance_time".to_string()];
    header.extend(alarms.iter().map(|a| a.to_string()));
    writer.write_record(&header)?;

    for row in rows {
        let mut record = Vec::with_capacity(2 + row.hours_to_first.len());
        record.push(row.fault_end_raw.clone());
        record.push(
            row.boundary
                .map(|b| b.format(COMPLETION_FORMAT).to_string())
                .unwrap_or_default(),
        );
        for value in &row.hours_to_first {
            record.push(value.map(|h| format!("{h:.2}")).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "Coach sheet written");
    Ok(path)
}

/// Creates (if needed) and returns the per-train results directory.
pub fn train_results_dir(results_dir: &Path, train: &str) -> Result<PathBuf> {
    let dir = results_dir.join(format!("{train}_prima_occorrenza"));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Why a train or coach produced no output sheet.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingComposition,
    UnreadableMaintenance,
    MissingDiagnostics,
    NoMaintenanceEvents,
    NoDiagnosticEvents,
}

#[derive(Debug, Serialize)]
pub struct SkippedCoach {
    pub coach: String,
    pub reason: SkipReason,
}

#[derive(Debug, Serialize)]
pub struct TrainSummary {
    pub train: String,
    pub sheets_written: Vec<String>,
    pub skipped_coaches: Vec<SkippedCoach>,
    pub skip_reason: Option<SkipReason>,
}

/// Machine-readable record of a whole pipeline run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub trains: Vec<TrainSummary>,
}

impl RunSummary {
    pub fn new() -> Self {
        RunSummary {
            generated_at: Utc::now(),
            trains: Vec::new(),
        }
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes the run summary as pretty-printed JSON under the results directory.
pub fn write_summary(results_dir: &Path, summary: &RunSummary) -> Result<PathBuf> {
    let path = results_dir.join("summary.json");
    fs::write(&path, serde_json::to_string_pretty(summary)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn row(
        fault_end: &str,
        boundary: Option<chrono::NaiveDateTime>,
        values: Vec<Option<f64>>,
    ) -> ResultRow {
        ResultRow {
            fault_end_raw: fault_end.to_string(),
            boundary,
            hours_to_first: values,
        }
    }

    #[test]
    fn test_write_coach_sheet_header_and_values() {
        let dir = temp_dir("train_reliability_out_basic");
        let boundary = chrono::NaiveDate::from_ymd_opt(2023, 5, 11)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let rows = vec![
            row("2023/05/10 14:32:07", Some(boundary), vec![Some(3.0), None]),
            row("???", None, vec![None, None]),
        ];

        let path = write_coach_sheet(&dir, "C1", &[3, 11], &rows).unwrap();
        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = content.lines().collect();

        assert_eq!(lines[0], "Fine guasto,maintenance_time,3,11");
        assert_eq!(lines[1], "2023/05/10 14:32:07,2023/05/11 00:00:00,3.00,");
        assert_eq!(lines[2], "???,,,");
    }

    #[test]
    fn test_train_results_dir_is_created() {
        let dir = temp_dir("train_reliability_out_dir");
        let train_dir = train_results_dir(&dir, "ETR100").unwrap();

        assert!(train_dir.is_dir());
        assert!(train_dir.ends_with("ETR100_prima_occorrenza"));
    }

    #[test]
    fn test_write_summary_produces_json() {
        let dir = temp_dir("train_reliability_out_summary");
        let mut summary = RunSummary::new();
        summary.trains.push(TrainSummary {
            train: "ETR100".to_string(),
            sheets_written: vec!["C1".to_string()],
            skipped_coaches: vec![SkippedCoach {
                coach: "C2".to_string(),
                reason: SkipReason::NoMaintenanceEvents,
            }],
            skip_reason: None,
        });

        let path = write_summary(&dir, &summary).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("ETR100"));
        assert!(content.contains("no_maintenance_events"));
    }
}
