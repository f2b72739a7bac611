//! Train composition loader.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Loads the ordered coach list for `train`.
///
/// The composition file has a header row of ordinal position labels and a
/// single data row with the coach identifiers; trailing empty cells are
/// ignored. The first coach in the list is the lead coach.
///
/// # Errors
///
/// Returns an error when the file is missing or contains no coach row, so
/// the caller can log and skip the train.
pub fn load_composition(dir: &Path, train: &str) -> Result<Vec<String>> {
    let path = dir.join(format!("{train}.csv"));
    let file = File::open(&path)
        .with_context(|| format!("composition file {} not found", path.display()))?;

    let mut rdr = csv::Reader::from_reader(file);

    let mut coaches = Vec::new();
    if let Some(result) = rdr.records().next() {
        let record = result?;
        coaches = record
            .iter()
            .map(str::trim)
            .take_while(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect();
    }

    if coaches.is_empty() {
        bail!("no composition row for train {train}");
    }

    debug!(train, coaches = coaches.len(), "Composition loaded");
    Ok(coaches)
}
