//! Signal filtering algorithms for smoothing per-frame measurements.
//!
//! Trainers smooth noisy scalar signals (knee/ankle ratios, joint angles)
//! with a [`SignalFilter`], and raw detector output with a
//! [`landmark::LandmarkSmoother`].

/// Moving average filter for simple smoothing
pub mod moving_average;

/// Median filter for outlier rejection
pub mod median;

/// Exponential filter for responsive smoothing
pub mod exponential;

/// Per-landmark exponential smoothing of detector output
pub mod landmark;

use crate::{Error, Result};

/// Trait for all scalar signal filters
pub trait SignalFilter: Send + Sync {
    /// Feed one sample and return the filtered value
    fn apply(&mut self, value: f64) -> f64;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl SignalFilter for NoFilter {
    fn apply(&mut self, value: f64) -> f64 {
        value
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a signal filter from a spec such as `"moving_average:10"`
///
/// The optional `:param` suffix sets the window size for window filters and
/// alpha for the exponential filter.
pub fn create_filter(spec: &str) -> Result<Box<dyn SignalFilter>> {
    let spec = spec.trim().to_lowercase();
    let (name, param) = match spec.split_once(':') {
        Some((name, param)) => (name, Some(param)),
        None => (spec.as_str(), None),
    };

    match name {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "moving_average" | "movingaverage" => {
            let window = parse_window(param, 5)?;
            Ok(Box::new(moving_average::MovingAverageFilter::new(window)))
        }
        "median" => {
            let window = parse_window(param, 5)?;
            if window % 2 == 0 {
                return Err(Error::FilterError(format!(
                    "Median filter window size must be odd, got {window}"
                )));
            }
            Ok(Box::new(median::MedianFilter::new(window)))
        }
        "exponential" => {
            let alpha = match param {
                Some(p) => p
                    .parse::<f64>()
                    .map_err(|_| Error::FilterError(format!("Invalid alpha: {p}")))?,
                None => 0.5,
            };
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
            }
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {spec}"))),
    }
}

fn parse_window(param: Option<&str>, default: usize) -> Result<usize> {
    let window = match param {
        Some(p) => p
            .parse::<usize>()
            .map_err(|_| Error::FilterError(format!("Invalid window size: {p}")))?,
        None => default,
    };
    if window == 0 {
        return Err(Error::FilterError("Window size must be greater than 0".to_string()));
    }
    Ok(window)
}
