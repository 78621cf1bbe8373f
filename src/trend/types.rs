//! Data types shared by the trend pipeline.

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Identifier of a grid node, read from the `Grid_node` column.
pub type NodeId = i64;

/// A single row of the input table.
///
/// The first input column is always mapped to `timestamp`, whatever its header
/// says. Any column not listed here is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Observation {
    #[serde(deserialize_with = "crate::parser::deserialize_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Grid_node", deserialize_with = "crate::parser::deserialize_node_id")]
    pub grid_node: NodeId,
    #[serde(rename = "Easting")]
    pub easting: f64,
    #[serde(rename = "Northing")]
    pub northing: f64,
}

/// The observation picked to represent one calendar year of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlySample {
    pub year: i32,
    pub observation: Observation,
    /// Absolute distance between the observation and the target date.
    pub diff: TimeDelta,
}

/// One output row: the per-year trend of a single grid node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    #[serde(rename = "Grid_node")]
    pub grid_node: NodeId,
    #[serde(rename = "Easting")]
    pub easting: f64,
    #[serde(rename = "Northing")]
    pub northing: f64,
    pub unit_per_year: f64,
    pub r_value: f64,
}

/// Calendar day (month, day) that yearly samples are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDate {
    month: u32,
    day: u32,
}

impl TargetDate {
    /// Builds a target date, rejecting pairs that never exist (e.g. 31 April).
    ///
    /// 29 February is accepted; it fails later for non-leap years present in
    /// the data.
    pub fn new(month: u32, day: u32) -> Result<Self> {
        // 2000 is a leap year, so every reachable month/day exists in it.
        NaiveDate::from_ymd_opt(2000, month, day)
            .ok_or_else(|| anyhow!("invalid target date: month {month}, day {day}"))?;
        Ok(Self { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Midnight of the target day in `year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the day does not exist in that year.
    pub fn in_year(&self, year: i32) -> Result<NaiveDateTime> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .map(|date| date.and_time(NaiveTime::MIN))
            .ok_or_else(|| {
                anyhow!(
                    "target date {:02}-{:02} does not exist in year {year}",
                    self.month,
                    self.day
                )
            })
    }
}

impl Default for TargetDate {
    /// 31 August.
    fn default() -> Self {
        Self { month: 8, day: 31 }
    }
}
