//! Removal of "no data" rows.

use crate::trend::types::Observation;

/// Sentinel written into the `Value` column when a measurement is missing.
pub const MISSING_VALUE: f64 = -9999.0;

/// Returns `true` if the observation carries the missing-data sentinel.
pub fn is_missing(observation: &Observation, missing_value: f64) -> bool {
    observation.value == missing_value
}

/// Drops every observation whose value equals `missing_value`, keeping the
/// order of the rest.
pub fn drop_missing(observations: Vec<Observation>, missing_value: f64) -> Vec<Observation> {
    observations
        .into_iter()
        .filter(|o| !is_missing(o, missing_value))
        .collect()
}
