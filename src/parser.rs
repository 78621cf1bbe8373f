//! CSV loader for grid node observation tables.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::trend::types::{NodeId, Observation};

/// Header the first column is renamed to before deserializing rows.
const TIMESTAMP_COLUMN: &str = "timestamp";

/// Named columns every input table must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Value", "Grid_node", "Easting", "Northing"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Opens `path` and reads every row as an [`Observation`].
///
/// # Errors
///
/// Fails if the file cannot be opened or any row is malformed.
pub fn load_observations(path: &Path, delimiter: u8) -> Result<Vec<Observation>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open input file '{}'", path.display()))?;
    read_observations(file, delimiter)
        .with_context(|| format!("failed to read observations from '{}'", path.display()))
}

/// Reads observations from any delimited source with a header row.
///
/// The first column holds the timestamp regardless of its header name; the
/// columns in [`REQUIRED_COLUMNS`] are looked up by name. Rows are returned in
/// input order.
pub fn read_observations<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Observation>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(reader);

    let original = rdr.headers()?.clone();
    if original.is_empty() {
        bail!("input has no header row");
    }

    let mut headers = StringRecord::new();
    headers.push_field(TIMESTAMP_COLUMN);
    for field in original.iter().skip(1) {
        headers.push_field(field);
    }

    for required in REQUIRED_COLUMNS {
        if !headers.iter().skip(1).any(|h| h == required) {
            bail!("input is missing required column '{required}'");
        }
    }
    rdr.set_headers(headers);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: Observation = result?;
        rows.push(record);
    }

    debug!(rows = rows.len(), "Observations parsed");
    Ok(rows)
}

/// Parses a date or date-time string. Date-only values mean midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    bail!("unrecognised timestamp '{raw}'")
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Node ids arrive as floats (`40` or `40.0`) and must be integral.
pub(crate) fn deserialize_node_id<'de, D>(deserializer: D) -> Result<NodeId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw.fract() != 0.0 || raw.abs() > i64::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "grid node id {raw} is not an integer"
        )));
    }
    Ok(raw as NodeId)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Value,Grid_node,Easting,Northing
2015-08-30,12.5,40,500000.0,6700000.0
2016-08-31 06:30:00,-9999,40.0,500000.0,6700000.0
";

    #[test]
    fn test_read_observations_parses_rows_in_order() {
        let rows = read_observations(SAMPLE.as_bytes(), b',').unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp.to_string(), "2015-08-30 00:00:00");
        assert_eq!(rows[0].value, 12.5);
        assert_eq!(rows[0].grid_node, 40);
        assert_eq!(rows[1].timestamp.to_string(), "2016-08-31 06:30:00");
        assert_eq!(rows[1].value, -9999.0);
        assert_eq!(rows[1].grid_node, 40);
        assert_eq!(rows[1].northing, 6_700_000.0);
    }

    #[test]
    fn test_first_column_header_may_be_blank() {
        let input = ",Value,Grid_node,Easting,Northing\n2020-01-01,1,7,2,3\n";
        let rows = read_observations(input.as_bytes(), b',').unwrap();
        assert_eq!(rows[0].grid_node, 7);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let input = "Date,Depth,Value,Grid_node,Easting,Northing\n2020-01-01,3.5,1,7,2,3\n";
        let rows = read_observations(input.as_bytes(), b',').unwrap();
        assert_eq!(rows[0].value, 1.0);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let input = "Date;Value;Grid_node;Easting;Northing\n2020-01-01;1;7;2;3\n";
        let rows = read_observations(input.as_bytes(), b';').unwrap();
        assert_eq!(rows[0].easting, 2.0);
    }

    #[test]
    fn test_missing_required_column_fails() {
        let input = "Date,Value,Grid_node,Easting\n2020-01-01,1,7,2\n";
        let err = read_observations(input.as_bytes(), b',').unwrap_err();
        assert!(err.to_string().contains("Northing"));
    }

    #[test]
    fn test_malformed_value_fails() {
        let input = "Date,Value,Grid_node,Easting,Northing\n2020-01-01,abc,7,2,3\n";
        assert!(read_observations(input.as_bytes(), b',').is_err());
    }

    #[test]
    fn test_malformed_date_fails() {
        let input = "Date,Value,Grid_node,Easting,Northing\n31/08/2020,1,7,2,3\n";
        assert!(read_observations(input.as_bytes(), b',').is_err());
    }

    #[test]
    fn test_fractional_node_id_fails() {
        let input = "Date,Value,Grid_node,Easting,Northing\n2020-01-01,1,7.5,2,3\n";
        assert!(read_observations(input.as_bytes(), b',').is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = std::env::temp_dir().join("grid_trend_does_not_exist.csv");
        let err = load_observations(&path, b',').unwrap_err();
        assert!(err.to_string().contains("failed to open input file"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(
            parse_timestamp("2019-08-31T12:00:00").unwrap().to_string(),
            "2019-08-31 12:00:00"
        );
        assert_eq!(
            parse_timestamp("2019-08-31 12:00").unwrap().to_string(),
            "2019-08-31 12:00:00"
        );
        assert!(parse_timestamp("yesterday").is_err());
    }
}
