//! First-occurrence pipeline: trains outer loop, coaches inner loop.
//!
//! Every failure is local: a train with a missing composition or diagnostic
//! file, or a coach with no matching records, is logged and skipped and the
//! run continues.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::correlator::{CoachDiagnostics, correlate_coach};
use crate::loaders::{load_composition, load_diagnostics, load_maintenance};
use crate::output::{
    RunSummary, SkipReason, SkippedCoach, TrainSummary, train_results_dir, write_coach_sheet,
    write_summary,
};

/// Input and output locations for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub maintenance_dir: PathBuf,
    pub composition_dir: PathBuf,
    pub diagnostics_dir: PathBuf,
    pub results_dir: PathBuf,
}

/// Runs the whole first-occurrence analysis and writes per-coach sheets plus
/// a run summary under the results directory.
#[tracing::instrument(skip(config))]
pub fn run_first_occurrence(config: &PipelineConfig) -> Result<RunSummary> {
    fs::create_dir_all(&config.results_dir)?;

    let trains = discover_trains(&config.maintenance_dir)?;
    info!(trains = trains.len(), "Starting first-occurrence analysis");

    let mut summary = RunSummary::new();
    for train in trains {
        summary.trains.push(process_train(config, &train)?);
    }

    let summary_path = write_summary(&config.results_dir, &summary)?;
    info!(path = %summary_path.display(), "Run summary written");
    Ok(summary)
}

/// One train: load composition, maintenance, and diagnostics, then correlate
/// and write each coach.
#[tracing::instrument(skip(config))]
fn process_train(config: &PipelineConfig, train: &str) -> Result<TrainSummary> {
    let mut train_summary = TrainSummary {
        train: train.to_string(),
        sheets_written: Vec::new(),
        skipped_coaches: Vec::new(),
        skip_reason: None,
    };

    let composition = match load_composition(&config.composition_dir, train) {
        Ok(c) => c,
        Err(e) => {
            warn!(train, error = %e, "No composition, train skipped");
            train_summary.skip_reason = Some(SkipReason::MissingComposition);
            return Ok(train_summary);
        }
    };
    // Diagnostic records key every coach's alarms to the lead coach.
    let lead_coach = composition[0].clone();

    let maintenance = match load_maintenance(&config.maintenance_dir, train) {
        Ok(m) => m,
        Err(e) => {
            warn!(train, error = %e, "Unreadable maintenance table, train skipped");
            train_summary.skip_reason = Some(SkipReason::UnreadableMaintenance);
            return Ok(train_summary);
        }
    };

    let diagnostics = match load_diagnostics(&config.diagnostics_dir, train) {
        Ok(d) => d,
        Err(e) => {
            warn!(train, error = %e, "No diagnostic log, train skipped");
            train_summary.skip_reason = Some(SkipReason::MissingDiagnostics);
            return Ok(train_summary);
        }
    };

    let train_dir = train_results_dir(&config.results_dir, train)?;

    for coach in &composition {
        let coach_events: Vec<_> = maintenance
            .iter()
            .filter(|e| e.coach == *coach)
            .cloned()
            .collect();
        if coach_events.is_empty() {
            info!(train, coach, "No maintenance interventions, coach skipped");
            train_summary.skipped_coaches.push(SkippedCoach {
                coach: coach.clone(),
                reason: SkipReason::NoMaintenanceEvents,
            });
            continue;
        }

        let coach_diagnostics = CoachDiagnostics::for_coach(&diagnostics, coach, &lead_coach);
        if coach_diagnostics.is_empty() {
            info!(train, coach, "No matching diagnostic events, coach skipped");
            train_summary.skipped_coaches.push(SkippedCoach {
                coach: coach.clone(),
                reason: SkipReason::NoDiagnosticEvents,
            });
            continue;
        }

        let (alarms, rows) = correlate_coach(&coach_events, &coach_diagnostics);
        write_coach_sheet(&train_dir, coach, &alarms, &rows)?;
        info!(
            train,
            coach,
            rows = rows.len(),
            alarms = alarms.len(),
            "Coach sheet written"
        );
        train_summary.sheets_written.push(coach.clone());
    }

    Ok(train_summary)
}

/// The set of trains to process: every `*.csv` stem in the maintenance
/// directory, sorted for a deterministic processing order.
fn discover_trains(maintenance_dir: &Path) -> Result<Vec<String>> {
    let mut trains = Vec::new();

    for entry in fs::read_dir(maintenance_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            trains.push(stem.to_string());
        }
    }

    trains.sort();
    Ok(trains)
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

    #[test]
    fn test_discover_trains_lists_csv_stems_sorted() {
        let dir = temp_dir("train_reliability_discover");
        fs::write(dir.join("ETR200.csv"), "x\n").unwrap();
        fs::write(dir.join("ETR100.csv"), "x\n").unwrap();
        fs::write(dir.join("notes.txt"), "x\n").unwrap();

        let trains = discover_trains(&dir).unwrap();
        assert_eq!(trains, vec!["ETR100", "ETR200"]);
    }

    #[test]
    fn test_missing_composition_skips_train_without_failing_run() {
        let base = temp_dir("train_reliability_pipe_nocomp");
        let config = PipelineConfig {
            maintenance_dir: base.join("maintenance"),
            composition_dir: base.join("composizione_treni"),
            diagnostics_dir: base.join("dati_diagnostici"),
            results_dir: base.join("results"),
        };
        fs::create_dir_all(&config.maintenance_dir).unwrap();
        fs::create_dir_all(&config.composition_dir).unwrap();
        fs::create_dir_all(&config.diagnostics_dir).unwrap();
        fs::write(
            config.maintenance_dir.join("ETR100.csv"),
            "Descr. assem. Padre,Sede tecnica,Fine guasto\nTrazione,C1,2023/05/10 09:30:00\n",
        )
        .unwrap();

        let summary = run_first_occurrence(&config).unwrap();
        assert_eq!(summary.trains.len(), 1);
        assert!(matches!(
            summary.trains[0].skip_reason,
            Some(SkipReason::MissingComposition)
        ));
        assert!(config.results_dir.join("summary.json").exists());
    }
}
