//! Ordinary least-squares trend of yearly samples against elapsed days.

use chrono::NaiveDateTime;

use crate::trend::types::YearlySample;
use crate::trend::utility::mean;

/// Converts a per-day slope into a per-year one. Leap years are ignored.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Julian day number of 1970-01-01T00:00:00.
const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Continuous Julian day number of a timestamp, fractional days included.
pub fn julian_day(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp_millis() as f64 / MILLIS_PER_DAY + UNIX_EPOCH_JULIAN_DAY
}

/// Result of a least-squares straight line fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient, in `[-1, 1]`.
    pub r_value: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fits a line through `(xs[i], ys[i])`.
///
/// Returns `None` when fewer than two distinct x values exist. `r_value` is 0
/// when either variable has zero variance.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.len() < 2 {
        return None;
    }

    let x_mean = mean(xs);
    let y_mean = mean(ys);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let r_den = (sxx * syy).sqrt();
    let r_value = if r_den == 0.0 {
        0.0
    } else {
        (sxy / r_den).clamp(-1.0, 1.0)
    };

    Some(LinearFit {
        slope,
        intercept,
        r_value,
    })
}

/// Regresses sample values against their Julian day numbers.
pub fn fit_samples(samples: &[YearlySample]) -> Option<LinearFit> {
    let days: Vec<f64> = samples
        .iter()
        .map(|s| julian_day(s.observation.timestamp))
        .collect();
    let values: Vec<f64> = samples.iter().map(|s| s.observation.value).collect();
    linear_fit(&days, &values)
}

/// Change per year and strength of a node's trend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub unit_per_year: f64,
    /// Absolute correlation coefficient.
    pub r_value: f64,
}

impl Trend {
    /// Trend of a node whose samples admit no fit.
    pub const UNDEFINED: Trend = Trend {
        unit_per_year: f64::NAN,
        r_value: f64::NAN,
    };

    pub fn from_fit(fit: &LinearFit) -> Self {
        Trend {
            unit_per_year: fit.slope * DAYS_PER_YEAR,
            r_value: fit.r_value.abs(),
        }
    }

    pub fn is_defined(&self) -> bool {
        !self.unit_per_year.is_nan()
    }
}

/// Summary mode: slope per year and |r|, or [`Trend::UNDEFINED`].
pub fn trend_summary(samples: &[YearlySample]) -> Trend {
    fit_samples(samples)
        .map(|fit| Trend::from_fit(&fit))
        .unwrap_or(Trend::UNDEFINED)
}

/// Series mode: the fitted value at each sample's timestamp.
///
/// Every point is NaN when the samples admit no fit.
pub fn trend_series(samples: &[YearlySample]) -> Vec<(NaiveDateTime, f64)> {
    let fit = fit_samples(samples);
    samples
        .iter()
        .map(|s| {
            let ts = s.observation.timestamp;
            let fitted = fit.map_or(f64::NAN, |f| f.predict(julian_day(ts)));
            (ts, fitted)
        })
        .collect()
}
