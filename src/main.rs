//! CLI entry point for the train reliability analysis tools.
//!
//! Provides subcommands for the first-occurrence correlation pipeline, the
//! per-alarm failure-rate estimator, and the summary chart renderers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use train_reliability::lambda::run_lambda_estimation;
use train_reliability::pipeline::{PipelineConfig, run_first_occurrence};
use train_reliability::plot::{
    read_cdf_values, read_importance_series, render_cdf, render_importance,
};

#[derive(Parser)]
#[command(name = "train_reliability")]
#[command(about = "Reliability analysis tools for railway fleet diagnostic data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate maintenance interventions with diagnostic alarms and write
    /// per-coach time-to-first-occurrence sheets
    FirstOccurrence {
        /// Directory with per-train maintenance CSVs
        #[arg(short, long, default_value = "maintenance")]
        maintenance_dir: PathBuf,

        /// Directory with per-train composition CSVs
        #[arg(short, long, default_value = "composizione_treni")]
        composition_dir: PathBuf,

        /// Directory with per-train diagnostic logs
        #[arg(short, long, default_value = "dati_diagnostici")]
        diagnostics_dir: PathBuf,

        /// Directory to write per-train results into
        #[arg(short, long, default_value = "results")]
        results_dir: PathBuf,
    },
    /// Estimate per-alarm failure rates from first-occurrence sheets
    EstimateLambdas {
        /// Directory containing the first-occurrence results
        #[arg(short, long, default_value = "results")]
        results_dir: PathBuf,

        /// Gap-fill empty cells with the inter-maintenance gap before
        /// estimating
        #[arg(short, long, default_value_t = false)]
        preprocess: bool,

        /// CSV file to write the rate summary to
        #[arg(short, long, default_value = "lambdas.csv")]
        output: PathBuf,
    },
    /// Render a failure CDF chart from a solver result CSV
    PlotCdf {
        /// Result CSV with a `Values:` column
        input: PathBuf,

        /// SVG file to write
        #[arg(short, long, default_value = "cdf.svg")]
        output: PathBuf,

        /// Legend label for the curve
        #[arg(short, long, default_value = "AZ_Failure")]
        label: String,

        /// Upper x-axis limit in hours
        #[arg(short, long)]
        x_max: Option<f64>,
    },
    /// Render an importance-measure chart (Birnbaum or Fussell-Vesely export)
    PlotImportance {
        /// Importance CSV with one `label: [values]` series per line
        input: PathBuf,

        /// SVG file to write
        #[arg(short, long, default_value = "importance.svg")]
        output: PathBuf,

        /// Time step between consecutive values, in millions of hours
        #[arg(short, long, default_value_t = 0.005)]
        step: f64,

        /// Upper x-axis limit in millions of hours
        #[arg(short, long)]
        x_max: Option<f64>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/train_reliability.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("train_reliability.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::FirstOccurrence {
            maintenance_dir,
            composition_dir,
            diagnostics_dir,
            results_dir,
        } => {
            let config = PipelineConfig {
                maintenance_dir,
                composition_dir,
                diagnostics_dir,
                results_dir,
            };
            run_first_occurrence(&config)?;
        }
        Commands::EstimateLambdas {
            results_dir,
            preprocess,
            output,
        } => {
            run_lambda_estimation(&results_dir, preprocess, &output)?;
        }
        Commands::PlotCdf {
            input,
            output,
            label,
            x_max,
        } => {
            let values = read_cdf_values(&input)?;
            render_cdf(&values, &output, &label, x_max)?;
        }
        Commands::PlotImportance {
            input,
            output,
            step,
            x_max,
        } => {
            let series = read_importance_series(&input)?;
            render_importance(&series, &output, step, x_max)?;
        }
    }

    Ok(())
}
