//! Interval correlator: joins a coach's maintenance boundaries with its
//! filtered diagnostic events and computes, per maintenance interval, the
//! hours to the first occurrence of each observed alarm type.
//!
//! Intervals are half-open `[boundary_i, boundary_i+1)`; the lower bound is
//! inclusive, so an alarm firing exactly at a boundary belongs to the interval
//! that starts there. The interval after the last maintenance event is
//! unbounded above, so late alarms are always attributed to the last event.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use crate::model::{DiagnosticEvent, MaintenanceEvent};

/// A coach's filtered diagnostic events, grouped by alarm id with timestamps
/// sorted ascending. Interval queries are answered by binary search instead
/// of rescanning the full event list per row.
#[derive(Debug, Default)]
pub struct CoachDiagnostics {
    by_alarm: BTreeMap<i64, Vec<NaiveDateTime>>,
}

impl CoachDiagnostics {
    /// Selects the events relevant to `coach` out of a train's diagnostic log.
    ///
    /// Alarms are keyed to the lead coach as reporting source: the lead coach
    /// matches events it reported about itself, every other coach matches
    /// events the lead coach reported about it.
    pub fn for_coach(events: &[DiagnosticEvent], coach: &str, lead_coach: &str) -> Self {
        let mut by_alarm: BTreeMap<i64, Vec<NaiveDateTime>> = BTreeMap::new();

        for event in events {
            if event.source != lead_coach || event.name != coach {
                continue;
            }
            by_alarm.entry(event.alarm_id).or_default().push(event.timestamp);
        }

        for timestamps in by_alarm.values_mut() {
            timestamps.sort();
        }

        CoachDiagnostics { by_alarm }
    }

    /// Distinct alarm ids observed for this coach, ascending. Defines the
    /// output columns, fixed before any row is built.
    pub fn observed_alarms(&self) -> Vec<i64> {
        self.by_alarm.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_alarm.is_empty()
    }

    /// Earliest occurrence of `alarm_id` in `[start, end)`, or in
    /// `[start, +inf)` when `end` is `None`.
    fn first_occurrence(
        &self,
        alarm_id: i64,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    ) -> Option<NaiveDateTime> {
        let timestamps = self.by_alarm.get(&alarm_id)?;
        let idx = timestamps.partition_point(|t| *t < start);
        let candidate = *timestamps.get(idx)?;

        match end {
            Some(end) if candidate >= end => None,
            _ => Some(candidate),
        }
    }
}

/// One output row: a maintenance intervention plus, per observed alarm type,
/// the hours from its boundary to the alarm's first occurrence in the
/// intervention's interval.
#[derive(Debug)]
pub struct ResultRow {
    pub fault_end_raw: String,
    pub boundary: Option<NaiveDateTime>,
    /// Parallel to the observed-alarm column list; `None` = no occurrence.
    pub hours_to_first: Vec<Option<f64>>,
}

/// Correlates one coach's sorted maintenance events with its diagnostics.
///
/// Returns the observed alarm ids (the value-column order) and one row per
/// maintenance event, in chronological order. Events with an undefined
/// boundary, and zero-width intervals from two events sharing a boundary,
/// yield "no occurrence" for every alarm.
pub fn correlate_coach(
    events: &[MaintenanceEvent],
    diagnostics: &CoachDiagnostics,
) -> (Vec<i64>, Vec<ResultRow>) {
    let alarms = diagnostics.observed_alarms();
    let mut rows = Vec::with_capacity(events.len());

    for (i, event) in events.iter().enumerate() {
        let Some(start) = event.boundary else {
            rows.push(empty_row(event, alarms.len()));
            continue;
        };

        // Next event's boundary bounds this interval; no next event means
        // the interval is unbounded above. A next event whose boundary is
        // undefined leaves this interval without a usable edge, so it yields
        // no occurrences at all.
        let end = match events.get(i + 1) {
            None => None,
            Some(next) => match next.boundary {
                Some(b) => Some(b),
                None => {
                    rows.push(empty_row(event, alarms.len()));
                    continue;
                }
            },
        };

        let hours_to_first = alarms
            .iter()
            .map(|&alarm| {
                diagnostics
                    .first_occurrence(alarm, start, end)
                    .map(|first| elapsed_hours(start, first))
            })
            .collect();

        rows.push(ResultRow {
            fault_end_raw: event.fault_end_raw.clone(),
            boundary: event.boundary,
            hours_to_first,
        });
    }

    (alarms, rows)
}

fn empty_row(event: &MaintenanceEvent, alarm_count: usize) -> ResultRow {
    ResultRow {
        fault_end_raw: event.fault_end_raw.clone(),
        boundary: event.boundary,
        hours_to_first: vec![None; alarm_count],
    }
}

/// Elapsed hours between two timestamps, rounded to 2 decimal places.
fn elapsed_hours(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let hours = (end - start).num_seconds() as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}
