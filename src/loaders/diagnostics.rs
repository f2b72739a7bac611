//! Diagnostic alarm log loader.

use anyhow::{Context, Result};
use chrono::DateTime;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

use crate::model::{ALLOWED_ALARM_IDS, DiagnosticEvent, DiagnosticRecord};

/// Loads the diagnostic log for `train`, keeping only alarm activations that
/// pass the fixed context filter and whose alarm id is on the allow-list.
///
/// The raw `ts` field (milliseconds since epoch) is converted to a calendar
/// timestamp; rows with an out-of-range `ts` are skipped with a warning.
pub fn load_diagnostics(dir: &Path, train: &str) -> Result<Vec<DiagnosticEvent>> {
    let path = dir.join(format!("{train}.csv"));
    let file = File::open(&path)
        .with_context(|| format!("diagnostic file {} not found", path.display()))?;

    let mut rdr = csv::Reader::from_reader(file);

    let mut events = Vec::new();
    for result in rdr.deserialize() {
        let record: DiagnosticRecord = result?;
        if !record.passes_fixed_filter() {
            continue;
        }
        if !ALLOWED_ALARM_IDS.contains(&record.id) {
            continue;
        }

        let Some(timestamp) = DateTime::from_timestamp_millis(record.ts) else {
            warn!(train, ts = record.ts, "Out-of-range event timestamp, row skipped");
            continue;
        };

        events.push(DiagnosticEvent {
            source: record.source.trim().to_string(),
            name: record.name.trim().to_string(),
            alarm_id: record.id,
            timestamp: timestamp.naive_utc(),
        });
    }

    debug!(train, events = events.len(), "Diagnostic events loaded");
    Ok(events)
}
