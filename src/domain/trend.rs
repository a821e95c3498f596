//! Linear trend extraction.
//!
//! Ordinary least squares of a measurement against elapsed time. Elapsed
//! time is measured from the first observation: days for adults, 30-day
//! months for children.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Days in a month for horizon and velocity conversions.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Errors that make a trend fit infeasible.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrendError {
    #[error("Need at least 2 observations for a trend, got {0}")]
    InsufficientData(usize),

    #[error("Time and value series differ in length ({times} vs {values})")]
    LengthMismatch { times: usize, values: usize },

    #[error("All observations share the same time point")]
    DegenerateTime,

    #[error("Non-finite value in trend input")]
    NonFinite,
}

/// Result of a least-squares line fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    /// Value change per unit of elapsed time
    pub slope: f64,
    pub intercept: f64,
    /// Standard error of the slope
    pub std_err: f64,
    /// Correlation coefficient in [-1, 1]
    pub r_value: f64,
    pub n: usize,
}

impl TrendFit {
    /// Goodness of fit.
    #[must_use]
    pub fn r_squared(&self) -> f64 {
        self.r_value * self.r_value
    }

    /// Value of the fitted line at `t`.
    #[must_use]
    pub fn value_at(&self, t: f64) -> f64 {
        self.intercept + self.slope * t
    }
}

/// Fit `values` against `times` by ordinary least squares.
///
/// # Errors
/// Returns `TrendError` when fewer than two points are given, the inputs are
/// not finite, or every point shares one time value.
pub fn fit_linear(times: &[f64], values: &[f64]) -> Result<TrendFit, TrendError> {
    if times.len() != values.len() {
        return Err(TrendError::LengthMismatch {
            times: times.len(),
            values: values.len(),
        });
    }
    let n = times.len();
    if n < 2 {
        return Err(TrendError::InsufficientData(n));
    }
    if times.iter().chain(values).any(|v| !v.is_finite()) {
        return Err(TrendError::NonFinite);
    }

    let nf = n as f64;
    let mean_x = times.iter().sum::<f64>() / nf;
    let mean_y = values.iter().sum::<f64>() / nf;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in times.iter().zip(values) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 {
        return Err(TrendError::DegenerateTime);
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let r_den = (sxx * syy).sqrt();
    let r_value = if r_den == 0.0 {
        0.0
    } else {
        (sxy / r_den).clamp(-1.0, 1.0)
    };

    let std_err = if n == 2 {
        0.0
    } else {
        let df = (n - 2) as f64;
        ((1.0 - r_value * r_value).max(0.0) * syy / sxx / df).sqrt()
    };

    if !(slope.is_finite() && intercept.is_finite() && std_err.is_finite()) {
        return Err(TrendError::NonFinite);
    }

    Ok(TrendFit {
        slope,
        intercept,
        std_err,
        r_value,
        n,
    })
}

/// Whole days elapsed since the first date.
#[must_use]
pub fn elapsed_days(dates: &[NaiveDate]) -> Vec<f64> {
    match dates.first() {
        Some(start) => dates
            .iter()
            .map(|d| (*d - *start).num_days() as f64)
            .collect(),
        None => Vec::new(),
    }
}

/// Months (30-day units) elapsed since the first date.
#[must_use]
pub fn elapsed_months(dates: &[NaiveDate]) -> Vec<f64> {
    elapsed_days(dates)
        .into_iter()
        .map(|days| days / DAYS_PER_MONTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_line() {
        let fit = fit_linear(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).expect("Should fit");
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_value - 1.0).abs() < 1e-12);
        assert!(fit.std_err.abs() < 1e-12);
    }

    #[test]
    fn test_flat_series_has_zero_correlation() {
        let fit = fit_linear(&[0.0, 30.0, 60.0], &[150.0, 150.0, 150.0]).expect("Should fit");
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_value, 0.0);
        assert_eq!(fit.std_err, 0.0);
    }

    #[test]
    fn test_noisy_fit_standard_error() {
        // x = 0..4, y = [1, 2, 2, 4, 5]: slope 1.0, intercept 0.8
        let fit = fit_linear(&[0.0, 1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 2.0, 4.0, 5.0])
            .expect("Should fit");
        assert!((fit.slope - 1.0).abs() < 1e-12);
        assert!((fit.intercept - 0.8).abs() < 1e-12);
        // Syy = 10.8, Sxx = 10, r² = 100 / 108
        let r2: f64 = 100.0 / 108.0;
        assert!((fit.r_squared() - r2).abs() < 1e-12);
        let expected_se = ((1.0 - r2) * 10.8 / 10.0 / 3.0).sqrt();
        assert!((fit.std_err - expected_se).abs() < 1e-12);
    }

    #[test]
    fn test_two_points_have_zero_std_err() {
        let fit = fit_linear(&[0.0, 10.0], &[5.0, 4.0]).expect("Should fit");
        assert!((fit.slope + 0.1).abs() < 1e-12);
        assert!((fit.r_value + 1.0).abs() < 1e-12);
        assert_eq!(fit.std_err, 0.0);
    }

    #[test]
    fn test_errors() {
        assert_eq!(fit_linear(&[1.0], &[2.0]), Err(TrendError::InsufficientData(1)));
        assert_eq!(fit_linear(&[3.0, 3.0], &[1.0, 2.0]), Err(TrendError::DegenerateTime));
        assert_eq!(fit_linear(&[0.0, 1.0], &[1.0, f64::NAN]), Err(TrendError::NonFinite));
        assert!(matches!(
            fit_linear(&[0.0, 1.0], &[1.0]),
            Err(TrendError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_times_allowed() {
        let fit = fit_linear(&[0.0, 0.0, 10.0], &[1.0, 3.0, 12.0]).expect("Should fit");
        assert!(fit.slope > 0.0);
    }

    #[test]
    fn test_slope_sign_follows_monotonic_series() {
        let times = [0.0, 5.0, 12.0, 40.0, 41.0];
        let rising = [100.0, 101.0, 105.0, 130.0, 131.0];
        let falling: Vec<f64> = rising.iter().map(|v| -v).collect();

        assert!(fit_linear(&times, &rising).expect("Should fit").slope > 0.0);
        assert!(fit_linear(&times, &falling).expect("Should fit").slope < 0.0);
    }

    #[test]
    fn test_elapsed_units() {
        let dates = [
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("Valid date"),
            NaiveDate::from_ymd_opt(2024, 1, 31).expect("Valid date"),
            NaiveDate::from_ymd_opt(2024, 3, 1).expect("Valid date"),
        ];
        assert_eq!(elapsed_days(&dates), vec![0.0, 30.0, 60.0]);
        assert_eq!(elapsed_months(&dates), vec![0.0, 1.0, 2.0]);
        assert!(elapsed_days(&[]).is_empty());
    }
}
