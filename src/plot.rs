//! Summary chart rendering from precomputed result CSVs.
//!
//! Two input shapes are supported: the CDF export (two preamble lines, then
//! a table with a `Values:` column, one probability per time step) and the
//! importance exports (three preamble lines, then colon-delimited
//! `label: [v1, v2, ...]` rows, one series per line). Charts are rendered to
//! SVG.

use anyhow::{Context, Result, bail};
use plotters::prelude::*;
use std::fs;
use std::path::Path;
use tracing::info;

/// Line colors, cycled across series.
const PALETTE: &[RGBColor] = &[
    RGBColor(230, 0, 0),
    RGBColor(0, 0, 230),
    RGBColor(0, 204, 0),
    RGBColor(255, 191, 0),
    RGBColor(0, 212, 255),
    RGBColor(255, 20, 147),
];

/// One named curve parsed from an importance export.
#[derive(Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

/// Parses the CDF export: skips the two preamble lines, then collects the
/// `Values:` column.
pub fn read_cdf_values(path: &Path) -> Result<Vec<f64>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let table = content.lines().skip(2).collect::<Vec<_>>().join("\n");

    let mut rdr = csv::Reader::from_reader(table.as_bytes());
    let headers = rdr.headers()?.clone();
    let Some(col) = headers.iter().position(|h| h.trim() == "Values:") else {
        bail!("no `Values:` column in {}", path.display());
    };

    let mut values = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let Some(cell) = record.get(col).map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        values.push(cell.parse::<f64>()?);
    }

    Ok(values)
}

/// Parses an importance export: skips the three preamble lines, then reads
/// one `label: [v1, v2, ...]` series per line.
pub fn read_importance_series(path: &Path) -> Result<Vec<Series>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;

    let mut series = Vec::new();
    for line in content.lines().skip(3) {
        if line.trim().is_empty() {
            continue;
        }
        let Some((label, rest)) = line.split_once(':') else {
            bail!("malformed series line {line:?} in {}", path.display());
        };

        let rest = rest.trim().trim_start_matches('[').trim_end_matches(']');
        let values = rest
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("bad value in series {:?}", label.trim()))?;

        series.push(Series {
            label: label.trim().to_string(),
            values,
        });
    }

    Ok(series)
}

/// Renders the CDF as a single line chart; x axis is the step index in hours.
pub fn render_cdf(values: &[f64], out: &Path, label: &str, x_max: Option<f64>) -> Result<()> {
    if values.is_empty() {
        bail!("no CDF values to plot");
    }

    let x_max = x_max.unwrap_or(2000.0);
    let y_max = axis_top(values.iter().copied());

    let root = SVGBackend::new(out, (1000, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart.configure_mesh().x_desc("time (h)").draw()?;

    let color = PALETTE[0];
    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            color.stroke_width(2),
        ))?
        .label(label.to_string())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    info!(path = %out.display(), points = values.len(), "CDF chart written");
    Ok(())
}

/// Renders a set of importance curves; x axis is the step index scaled by
/// `step` (millions of hours in the source data).
pub fn render_importance(
    series: &[Series],
    out: &Path,
    step: f64,
    x_max: Option<f64>,
) -> Result<()> {
    if series.is_empty() {
        bail!("no series to plot");
    }

    let longest = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
    let x_max = x_max.unwrap_or(longest as f64 * step);
    let y_max = axis_top(series.iter().flat_map(|s| s.values.iter().copied()));

    let root = SVGBackend::new(out, (1000, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart.configure_mesh().x_desc("time (10^6 h)").draw()?;

    for (idx, s) in series.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        chart
            .draw_series(LineSeries::new(
                s.values.iter().enumerate().map(|(i, v)| (i as f64 * step, *v)),
                color.stroke_width(2),
            ))?
            .label(s.label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::MiddleRight)
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    info!(path = %out.display(), series = series.len(), "Importance chart written");
    Ok(())
}

/// A headroom-padded upper bound for the y axis.
fn axis_top(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0f64, f64::max);
    if max > 0.0 { max * 1.05 } else { 1.0 }
}
