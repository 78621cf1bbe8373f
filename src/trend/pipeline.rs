use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use crate::output::write_summaries;
use crate::parser::load_observations;
use crate::trend::aggregate::aggregate_nodes;
use crate::trend::filter::{MISSING_VALUE, drop_missing};
use crate::trend::types::{NodeSummary, Observation, TargetDate};

/// Parameters of the trend computation itself.
#[derive(Debug, Clone, Copy)]
pub struct TrendConfig {
    pub target: TargetDate,
    pub missing_value: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            target: TargetDate::default(),
            missing_value: MISSING_VALUE,
        }
    }
}

/// A file-to-file run: where to read, where to write, and how to compute.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub delimiter: u8,
    pub trend: TrendConfig,
}

/// Filtered input rows alongside the per-node results computed from them.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub observations: Vec<Observation>,
    pub summaries: Vec<NodeSummary>,
}

/// Drops missing rows and summarizes every node. Touches no files.
pub fn analyze_observations(
    observations: Vec<Observation>,
    config: &TrendConfig,
) -> Result<Analysis> {
    let total = observations.len();
    let observations = drop_missing(observations, config.missing_value);
    info!(
        total,
        kept = observations.len(),
        dropped = total - observations.len(),
        "Missing values removed"
    );

    let summaries = aggregate_nodes(&observations, config.target)?;
    Ok(Analysis {
        observations,
        summaries,
    })
}

/// Loads the input table, computes every node's trend and writes the summary
/// file.
#[tracing::instrument(skip(config), fields(input = %config.input.display(), output = %config.output.display()))]
pub fn run(config: &RunConfig) -> Result<Analysis> {
    let observations = load_observations(&config.input, config.delimiter)?;
    info!(rows = observations.len(), "Input loaded");

    let analysis = analyze_observations(observations, &config.trend)?;
    write_summaries(&config.output, &analysis.summaries, config.delimiter)?;

    info!(nodes = analysis.summaries.len(), "Summary written");
    Ok(analysis)
}
