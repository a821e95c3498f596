//! Confidence scoring and confidence intervals.

use serde::{Deserialize, Serialize};

use super::trend::TrendFit;

pub const CONFIDENCE_FLOOR: f64 = 0.1;
pub const CONFIDENCE_CEILING: f64 = 1.0;

/// Interval half-widths at zero confidence.
pub const SYSTOLIC_HALF_WIDTH: f64 = 10.0;
pub const DIASTOLIC_HALF_WIDTH: f64 = 7.0;
pub const HAZ_HALF_WIDTH: f64 = 0.5;

/// A closed interval around a predicted value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    #[must_use]
    pub fn around(center: f64, half_width: f64) -> Self {
        let half = half_width.abs();
        Self {
            lower: center - half,
            upper: center + half,
        }
    }

    /// Interval whose width shrinks linearly as confidence grows.
    #[must_use]
    pub fn scaled(center: f64, max_half_width: f64, confidence: f64) -> Self {
        Self::around(center, max_half_width * (1.0 - confidence))
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

fn bounded(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
    } else {
        CONFIDENCE_FLOOR
    }
}

/// Confidence in a blood pressure projection.
///
/// Blends data volume (saturating at 10 readings), slope precision, and
/// mean goodness of fit of the systolic and diastolic trends.
#[must_use]
pub fn bp_confidence(data_points: usize, systolic: &TrendFit, diastolic: &TrendFit) -> f64 {
    let data = (data_points as f64 / 10.0).min(1.0);
    let precision = 1.0 / (1.0 + systolic.std_err.abs() + diastolic.std_err.abs());
    let fit = (systolic.r_squared() + diastolic.r_squared()) / 2.0;

    bounded(0.3 * data + 0.3 * precision + 0.4 * fit)
}

/// Confidence in a HAZ projection. Data volume saturates at 8 measurements.
#[must_use]
pub fn haz_confidence(data_points: usize, haz: &TrendFit) -> f64 {
    let data = (data_points as f64 / 8.0).min(1.0);
    let precision = 1.0 / (1.0 + haz.std_err.abs());

    bounded(0.4 * data + 0.3 * precision + 0.3 * haz.r_squared())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(std_err: f64, r_value: f64) -> TrendFit {
        TrendFit {
            slope: 0.0,
            intercept: 0.0,
            std_err,
            r_value,
            n: 2,
        }
    }

    #[test]
    fn test_bp_confidence_blend() {
        // 0.3 * 0.6 + 0.3 * 1.0 + 0.4 * 0.0
        let c = bp_confidence(6, &fit(0.0, 0.0), &fit(0.0, 0.0));
        assert!((c - 0.48).abs() < 1e-12);

        let perfect = bp_confidence(20, &fit(0.0, 1.0), &fit(0.0, -1.0));
        assert!((perfect - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_haz_confidence_blend() {
        // 0.4 * 0.5 + 0.3 * (1 / 2) + 0.3 * 0.25
        let c = haz_confidence(4, &fit(1.0, 0.5));
        assert!((c - 0.425).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_floor() {
        let c = bp_confidence(0, &fit(1e6, 0.0), &fit(1e6, 0.0));
        assert!((c - CONFIDENCE_FLOOR).abs() < 1e-12);

        let nan = haz_confidence(3, &fit(f64::NAN, 0.0));
        assert!((nan - CONFIDENCE_FLOOR).abs() < 1e-12);
    }

    #[test]
    fn test_interval_scaling() {
        let interval = Interval::scaled(140.0, SYSTOLIC_HALF_WIDTH, 0.5);
        assert!((interval.lower - 135.0).abs() < 1e-12);
        assert!((interval.upper - 145.0).abs() < 1e-12);
        assert!(interval.contains(140.0));
        assert!((interval.width() - 10.0).abs() < 1e-12);

        let certain = Interval::scaled(-2.0, HAZ_HALF_WIDTH, 1.0);
        assert_eq!(certain.width(), 0.0);
    }
}
