//! Selection of one representative observation per calendar year.

use anyhow::Result;
use chrono::Datelike;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::trend::types::{Observation, TargetDate, YearlySample};

/// Picks, for every calendar year present, the observation closest to the
/// target date of that year.
///
/// Ties go to the earlier timestamp, then to the row seen first. Samples are
/// returned in ascending year order; years without rows produce nothing.
///
/// # Errors
///
/// Fails if the target date does not exist in one of the years (29 February
/// outside leap years).
pub fn closest_per_year<'a, I>(observations: I, target: TargetDate) -> Result<Vec<YearlySample>>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut best: BTreeMap<i32, YearlySample> = BTreeMap::new();

    for observation in observations {
        let year = observation.timestamp.year();
        let anchor = target.in_year(year)?;
        let diff = if observation.timestamp >= anchor {
            observation.timestamp - anchor
        } else {
            anchor - observation.timestamp
        };

        match best.entry(year) {
            Entry::Vacant(slot) => {
                slot.insert(YearlySample {
                    year,
                    observation: observation.clone(),
                    diff,
                });
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if (diff, observation.timestamp) < (current.diff, current.observation.timestamp) {
                    slot.insert(YearlySample {
                        year,
                        observation: observation.clone(),
                        diff,
                    });
                }
            }
        }
    }

    Ok(best.into_values().collect())
}
