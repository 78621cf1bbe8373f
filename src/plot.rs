//! Diagnostic chart of a single node: yearly samples and the fitted line.

use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use tracing::debug;

use crate::trend::regression::trend_series;
use crate::trend::types::{NodeId, Observation, TargetDate};
use crate::trend::yearly::closest_per_year;

const CHART_SIZE: (u32, u32) = (1280, 720);

/// Points to draw for one node, with timestamps as decimal years.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePlot {
    pub grid_node: NodeId,
    pub samples: Vec<(f64, f64)>,
    /// Empty when the node's samples admit no fit.
    pub fitted: Vec<(f64, f64)>,
}

/// Timestamp as a fractional year, e.g. 2020-07-02 12:00 is 2020.5.
pub fn decimal_year(ts: NaiveDateTime) -> f64 {
    let year = ts.year();
    let days_in_year = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    };
    let day = ts.ordinal0() as f64 + ts.num_seconds_from_midnight() as f64 / 86_400.0;
    year as f64 + day / days_in_year
}

/// Recomputes the yearly samples and fitted series of `grid_node`.
///
/// Returns `None` if the node has no rows in `observations`.
pub fn node_plot_data(
    observations: &[Observation],
    grid_node: NodeId,
    target: TargetDate,
) -> Result<Option<NodePlot>> {
    let rows = observations.iter().filter(|o| o.grid_node == grid_node);
    let samples = closest_per_year(rows, target)?;
    if samples.is_empty() {
        return Ok(None);
    }

    let fitted = trend_series(&samples)
        .into_iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(ts, v)| (decimal_year(ts), v))
        .collect();

    Ok(Some(NodePlot {
        grid_node,
        samples: samples
            .iter()
            .map(|s| (decimal_year(s.observation.timestamp), s.observation.value))
            .collect(),
        fitted,
    }))
}

/// Renders `plot` to `path`: SVG for a `.svg` extension, PNG otherwise.
pub fn render_node_plot(plot: &NodePlot, path: &Path) -> Result<()> {
    debug!(path = %path.display(), grid_node = plot.grid_node, "Rendering node plot");

    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    if is_svg {
        let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
        draw_node_chart(root, plot)
    } else {
        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        draw_node_chart(root, plot)
    }
}

/// Axis range covering every point, padded so nothing sits on the frame.
fn padded_range(values: impl Iterator<Item = f64>, min_pad: f64) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.1).max(min_pad);
    (lo - pad, hi + pad)
}

fn draw_node_chart<DB>(root: DrawingArea<DB, Shift>, plot: &NodePlot) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let all = plot.samples.iter().chain(plot.fitted.iter());
    let (x_lo, x_hi) = padded_range(all.clone().map(|p| p.0), 0.5);
    let (y_lo, y_hi) = padded_range(all.map(|p| p.1), 1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Grid node {}", plot.grid_node), ("sans-serif", 28))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Value")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .draw()?;

    if !plot.fitted.is_empty() {
        chart
            .draw_series(LineSeries::new(plot.fitted.iter().copied(), &BLUE))?
            .label("Linear fit")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], &BLUE));
    }

    chart
        .draw_series(
            plot.samples
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 5, RED.filled())),
        )?
        .label("Yearly sample")
        .legend(|(x, y)| Circle::new((x + 15, y), 5, RED.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
