//! Maintenance intervention loader.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

use crate::model::{MaintenanceEvent, MaintenanceRecord, TRACTION_ASSEMBLY};

/// Loads the maintenance interventions for `train`, restricted to the
/// traction subsystem, sorted chronologically by completion timestamp.
///
/// Rows whose completion timestamp does not parse are kept (with an undefined
/// boundary) and sort after all dated rows, matching the source data's
/// NaT-last ordering.
pub fn load_maintenance(dir: &Path, train: &str) -> Result<Vec<MaintenanceEvent>> {
    let path = dir.join(format!("{train}.csv"));
    let file = File::open(&path)
        .with_context(|| format!("maintenance file {} not found", path.display()))?;

    let mut rdr = csv::Reader::from_reader(file);

    let mut events = Vec::new();
    for result in rdr.deserialize() {
        let record: MaintenanceRecord = result?;
        if record.parent_assembly.trim() != TRACTION_ASSEMBLY {
            continue;
        }

        let event = MaintenanceEvent::from_record(&record);
        if event.fault_end.is_none() {
            warn!(
                train,
                coach = %event.coach,
                raw = %event.fault_end_raw,
                "Unparseable completion timestamp, event keeps an undefined boundary"
            );
        }
        events.push(event);
    }

    // Stable sort: undated events keep their file order, after all dated ones.
    events.sort_by_key(|e| (e.fault_end.is_none(), e.fault_end));

    debug!(train, events = events.len(), "Maintenance interventions loaded");
    Ok(events)
}
