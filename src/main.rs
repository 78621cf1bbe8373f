//! CLI entry point for the grid node trend tool.
//!
//! Reads a table of dated observations, writes the change per year of every
//! grid node to a CSV file, and plots one node for a visual check.

use anyhow::Result;
use clap::Parser;
use grid_trend::output::log_head;
use grid_trend::plot::{node_plot_data, render_node_plot};
use grid_trend::trend::filter::MISSING_VALUE;
use grid_trend::trend::pipeline::{RunConfig, TrendConfig, run};
use grid_trend::trend::types::{NodeId, Observation, TargetDate};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grid_trend")]
#[command(about = "Computes the yearly change of a measurement for every grid node", long_about = None)]
struct Cli {
    /// Input CSV: date column first, then Value, Grid_node, Easting, Northing
    #[arg(short, long, default_value = "input.csv")]
    input: PathBuf,

    /// CSV file to write one trend row per grid node to
    #[arg(short, long, default_value = "output.csv")]
    output: PathBuf,

    /// Month of the target date each yearly sample is matched against
    #[arg(long, default_value_t = 8)]
    month: u32,

    /// Day of the target date each yearly sample is matched against
    #[arg(long, default_value_t = 31)]
    day: u32,

    /// Value marking a missing measurement
    #[arg(long, default_value_t = MISSING_VALUE, allow_negative_numbers = true)]
    missing_value: f64,

    /// Field delimiter for input and output files
    #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Grid node to plot
    #[arg(long, default_value_t = 40)]
    plot_node: NodeId,

    /// Plot file; a .svg extension renders SVG, anything else PNG
    #[arg(long, default_value = "node_trend.png")]
    plot_path: PathBuf,

    /// Skip the plot
    #[arg(long, default_value_t = false)]
    no_plot: bool,

    /// Number of result rows to print
    #[arg(long, default_value_t = 5)]
    head: usize,
}

fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("delimiter must be a single ASCII character, got '{raw}'")),
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging()?;

    let cli = Cli::parse();
    let target = TargetDate::new(cli.month, cli.day)?;

    let config = RunConfig {
        input: cli.input,
        output: cli.output,
        delimiter: cli.delimiter,
        trend: TrendConfig {
            target,
            missing_value: cli.missing_value,
        },
    };

    let analysis = run(&config)?;
    log_head(&analysis.summaries, cli.head);

    if cli.no_plot {
        info!("Plot disabled");
    } else if let Err(e) = plot_node(&analysis.observations, cli.plot_node, target, &cli.plot_path)
    {
        error!(error = %e, grid_node = cli.plot_node, "Failed to render node plot");
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grid_trend.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grid_trend.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Draws the yearly samples and fitted line of one node.
#[tracing::instrument(skip(observations, target), fields(path = %path.display()))]
fn plot_node(
    observations: &[Observation],
    grid_node: NodeId,
    target: TargetDate,
    path: &Path,
) -> Result<()> {
    match node_plot_data(observations, grid_node, target)? {
        Some(plot) => {
            render_node_plot(&plot, path)?;
            info!(samples = plot.samples.len(), "Node plot written");
        }
        None => warn!("Grid node not present in the data, no plot drawn"),
    }
    Ok(())
}
