use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::trend::regression::{Trend, fit_samples};
use crate::trend::types::{NodeId, NodeSummary, Observation, TargetDate};
use crate::trend::yearly::closest_per_year;

/// Groups observations by grid node, ascending by node id. Rows keep their
/// input order inside each group.
pub fn group_by_node(observations: &[Observation]) -> BTreeMap<NodeId, Vec<&Observation>> {
    let mut groups: BTreeMap<NodeId, Vec<&Observation>> = BTreeMap::new();
    for observation in observations {
        groups.entry(observation.grid_node).or_default().push(observation);
    }
    groups
}

/// Summarizes a single node: yearly samples, regression, and the coordinates
/// of its first row.
///
/// Nodes whose samples admit no fit get NaN trend columns.
pub fn summarize_node(
    grid_node: NodeId,
    rows: &[&Observation],
    target: TargetDate,
) -> Result<Option<NodeSummary>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let samples = closest_per_year(rows.iter().copied(), target)?;
    let trend = match fit_samples(&samples) {
        Some(fit) => Trend::from_fit(&fit),
        None => {
            warn!(
                grid_node,
                years = samples.len(),
                "Too few distinct yearly samples for a regression, writing NaN trend"
            );
            Trend::UNDEFINED
        }
    };

    debug!(
        grid_node,
        years = samples.len(),
        unit_per_year = trend.unit_per_year,
        r_value = trend.r_value,
        "Node summarized"
    );

    Ok(Some(NodeSummary {
        grid_node,
        easting: first.easting,
        northing: first.northing,
        unit_per_year: trend.unit_per_year,
        r_value: trend.r_value,
    }))
}

/// Produces one [`NodeSummary`] per distinct node, ascending by node id.
///
/// The first hard error (e.g. a target date missing from some year) aborts the
/// whole batch.
#[tracing::instrument(skip_all, fields(rows = observations.len()))]
pub fn aggregate_nodes(
    observations: &[Observation],
    target: TargetDate,
) -> Result<Vec<NodeSummary>> {
    let groups = group_by_node(observations);
    let mut summaries = Vec::with_capacity(groups.len());

    for (grid_node, rows) in &groups {
        if let Some(summary) = summarize_node(*grid_node, rows, target)? {
            summaries.push(summary);
        }
    }

    let undefined = summaries.iter().filter(|s| s.unit_per_year.is_nan()).count();
    debug!(nodes = summaries.len(), undefined, "Aggregation complete");

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(node: NodeId, y: i32, m: u32, d: u32, value: f64, easting: f64) -> Observation {
        Observation {
            timestamp: NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            value,
            grid_node: node,
            easting,
            northing: easting * 2.0,
        }
    }

    #[test]
    fn test_group_by_node_sorted_and_stable() {
        let rows = vec![
            obs(9, 2015, 1, 1, 1.0, 0.0),
            obs(3, 2015, 1, 1, 2.0, 0.0),
            obs(9, 2016, 1, 1, 3.0, 0.0),
        ];
        let groups = group_by_node(&rows);

        let ids: Vec<NodeId> = groups.keys().copied().collect();
        assert_eq!(ids, vec![3, 9]);
        let values: Vec<f64> = groups[&9].iter().map(|o| o.value).collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[test]
    fn test_aggregate_takes_first_row_coordinates() {
        let rows = vec![
            obs(5, 2016, 8, 31, 2.0, 100.0),
            obs(5, 2015, 8, 31, 1.0, 999.0),
        ];
        let summaries = aggregate_nodes(&rows, TargetDate::default()).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].easting, 100.0);
        assert_eq!(summaries[0].northing, 200.0);
    }

    #[test]
    fn test_aggregate_one_row_per_node() {
        let rows = vec![
            obs(2, 2015, 8, 31, 1.0, 0.0),
            obs(1, 2015, 8, 31, 5.0, 0.0),
            obs(2, 2016, 8, 31, 2.0, 0.0),
            obs(1, 2016, 8, 31, 3.0, 0.0),
            obs(2, 2017, 8, 31, 3.0, 0.0),
        ];
        let summaries = aggregate_nodes(&rows, TargetDate::default()).unwrap();

        let ids: Vec<NodeId> = summaries.iter().map(|s| s.grid_node).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(summaries[0].unit_per_year < 0.0);
        assert!(summaries[1].unit_per_year > 0.0);
        assert!((summaries[1].r_value - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_node_gets_nan_row() {
        let rows = vec![
            obs(1, 2015, 8, 31, 1.0, 0.0),
            obs(1, 2015, 9, 1, 1.0, 0.0),
        ];
        let summaries = aggregate_nodes(&rows, TargetDate::default()).unwrap();

        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].unit_per_year.is_nan());
        assert!(summaries[0].r_value.is_nan());
    }

    #[test]
    fn test_invalid_target_aborts_batch() {
        let rows = vec![
            obs(1, 2016, 2, 1, 1.0, 0.0),
            obs(2, 2017, 2, 1, 1.0, 0.0),
        ];
        let target = TargetDate::new(2, 29).unwrap();
        assert!(aggregate_nodes(&rows, target).is_err());
    }
}
