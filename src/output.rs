//! Output formatting and persistence for node summaries.
//!
//! Writes the summary table as delimited text, reads it back, and previews
//! the first rows in the log.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::trend::types::NodeSummary;

/// Header row of the summary file, in column order.
pub const SUMMARY_HEADER: [&str; 5] = ["Grid_node", "Easting", "Northing", "unit_per_year", "r_value"];

/// Writes `summaries` to `path`, replacing any existing file.
///
/// The header is written even when there are no rows. Undefined trends are
/// written as `NaN`.
pub fn write_summaries(path: &Path, summaries: &[NodeSummary], delimiter: u8) -> Result<()> {
    debug!(path = %path.display(), rows = summaries.len(), "Writing summary CSV");

    let file = File::create(path)
        .with_context(|| format!("failed to create output file '{}'", path.display()))?;

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false) // header is written explicitly so empty tables still get one
        .from_writer(file);

    writer.write_record(SUMMARY_HEADER)?;
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a summary file produced by [`write_summaries`].
pub fn read_summaries(path: &Path, delimiter: u8) -> Result<Vec<NodeSummary>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open summary file '{}'", path.display()))?;
    let mut rdr = ReaderBuilder::new().delimiter(delimiter).from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: NodeSummary = result?;
        rows.push(record);
    }
    Ok(rows)
}

/// Logs the first `n` summaries, one line each.
pub fn log_head(summaries: &[NodeSummary], n: usize) {
    for summary in summaries.iter().take(n) {
        info!(
            grid_node = summary.grid_node,
            easting = summary.easting,
            northing = summary.northing,
            unit_per_year = summary.unit_per_year,
            r_value = summary.r_value,
            "Node trend"
        );
    }
    if summaries.len() > n {
        info!(remaining = summaries.len() - n, "More nodes in output file");
    }
}
