//! Forecast result: point predictions plus prediction intervals.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// An h-step-ahead forecast with symmetric prediction interval bounds.
///
/// Every forecaster in the bank produces intervals, so the bounds are always
/// present and the three vectors share one length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    point: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ForecastResult {
    /// Create a forecast from point predictions and interval bounds.
    pub fn new(point: Vec<f64>, lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if point.len() != lower.len() || point.len() != upper.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "forecast vectors differ in length: point {}, lower {}, upper {}",
                point.len(),
                lower.len(),
                upper.len()
            )));
        }
        Ok(Self {
            point,
            lower,
            upper,
        })
    }

    /// An empty zero-horizon forecast.
    pub fn empty() -> Self {
        Self {
            point: vec![],
            lower: vec![],
            upper: vec![],
        }
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check whether this is a zero-horizon forecast.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Lower interval bounds.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper interval bounds.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Apply a monotone transform to point and bound vectors alike.
    ///
    /// Used to move a forecast from a transformed scale back to the price
    /// scale; monotonicity keeps the bounds ordered.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> ForecastResult {
        Self {
            point: self.point.iter().map(|&v| f(v)).collect(),
            lower: self.lower.iter().map(|&v| f(v)).collect(),
            upper: self.upper.iter().map(|&v| f(v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn forecast_validates_vector_lengths() {
        let result = ForecastResult::new(vec![1.0, 2.0], vec![0.5], vec![1.5, 2.5]);
        assert!(result.is_err());

        let forecast =
            ForecastResult::new(vec![1.0, 2.0], vec![0.5, 1.5], vec![1.5, 2.5]).unwrap();
        assert_eq!(forecast.horizon(), 2);
        assert!(!forecast.is_empty());
    }

    #[test]
    fn empty_forecast_has_zero_horizon() {
        let forecast = ForecastResult::empty();
        assert_eq!(forecast.horizon(), 0);
        assert!(forecast.is_empty());
    }

    #[test]
    fn map_transforms_point_and_bounds() {
        let forecast =
            ForecastResult::new(vec![0.0, 1.0], vec![-1.0, 0.0], vec![1.0, 2.0]).unwrap();
        let exp = forecast.map(f64::exp);

        assert_relative_eq!(exp.point()[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(exp.lower()[0], (-1.0f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(exp.upper()[1], 2.0f64.exp(), epsilon = 1e-12);
        // Monotone map preserves bound ordering
        for i in 0..exp.horizon() {
            assert!(exp.lower()[i] <= exp.point()[i]);
            assert!(exp.point()[i] <= exp.upper()[i]);
        }
    }
}
