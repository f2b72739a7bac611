//! Domain types shared across the analysis pipeline.
//!
//! Maintenance and diagnostic rows are deserialized straight from CSV with
//! their original (Italian) column names, then normalized into the in-memory
//! event types the correlator works on.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Deserialize;

/// Alarm ids relevant to the traction subsystem analysis. Everything else in
/// the diagnostic logs is ignored.
pub const ALLOWED_ALARM_IDS: &[i64] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 11];

/// Parent assembly description the maintenance records are restricted to.
pub const TRACTION_ASSEMBLY: &str = "Trazione";

/// Timestamp format used by the `Fine guasto` and `maintenance_time` columns.
pub const COMPLETION_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// One row of a per-train maintenance CSV, as found in the source file.
/// Extra columns are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceRecord {
    #[serde(rename = "Descr. assem. Padre")]
    pub parent_assembly: String,
    #[serde(rename = "Sede tecnica")]
    pub technical_location: String,
    #[serde(rename = "Fine guasto")]
    pub fault_end: String,
}

/// A maintenance intervention after normalization.
///
/// `fault_end` is `None` when the raw timestamp did not parse; such events
/// keep their place in the list and simply produce empty alarm values.
#[derive(Debug, Clone)]
pub struct MaintenanceEvent {
    pub coach: String,
    pub fault_end_raw: String,
    pub fault_end: Option<NaiveDateTime>,
    /// Start of the calendar day after `fault_end`. Interval edge for the
    /// first-occurrence search.
    pub boundary: Option<NaiveDateTime>,
}

impl MaintenanceEvent {
    pub fn from_record(record: &MaintenanceRecord) -> Self {
        let fault_end =
            NaiveDateTime::parse_from_str(record.fault_end.trim(), COMPLETION_FORMAT).ok();
        let boundary = fault_end.map(maintenance_boundary);

        MaintenanceEvent {
            coach: record.technical_location.trim().to_string(),
            fault_end_raw: record.fault_end.trim().to_string(),
            fault_end,
            boundary,
        }
    }
}

/// Midnight at the start of the day after `fault_end`.
pub fn maintenance_boundary(fault_end: NaiveDateTime) -> NaiveDateTime {
    (fault_end + Duration::days(1)).date().and_time(NaiveTime::MIN)
}

/// One row of a per-train diagnostic log CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticRecord {
    pub source: String,
    pub name: String,
    pub machine_type: String,
    pub alert_type: String,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    pub cod: i64,
    pub id: i64,
    pub id1: Option<String>,
    pub event_type: String,
    pub depot: i64,
}

impl DiagnosticRecord {
    /// Fixed upstream filter: alarm activations reported outside the depot,
    /// for the maintenance-diagnostics machine class, PDM alert class,
    /// status code 5.
    pub fn passes_fixed_filter(&self) -> bool {
        self.depot == 0
            && self.event_type == "ON"
            && self.machine_type == "MD"
            && self.alert_type == "PDM"
            && self.cod == 5
    }
}

/// A filtered diagnostic alarm activation.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    /// Coach that reported the event. Alarms are always reported through the
    /// lead coach, regardless of which coach they concern.
    pub source: String,
    /// Coach the event concerns.
    pub name: String,
    pub alarm_id: i64,
    pub timestamp: NaiveDateTime,
}
