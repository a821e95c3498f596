//! Heuristic fallback predictions.
//!
//! Used when a history has a single observation or the trend fit fails.
//! Results carry fixed, wide intervals and the floor confidence.

use super::adjustment::{clamp_diastolic, clamp_haz, clamp_systolic};
use super::confidence::{Interval, CONFIDENCE_FLOOR};
use super::features::{AdultFeatures, ChildFeatures};
use super::prediction::{BloodPressure, BpPrediction, HazPrediction, PredictionMethod};
use super::recommendation::{bp_heuristic_recommendations, haz_heuristic_recommendations};
use super::record::{AdultObservation, ChildObservation};
use super::risk::{assess_bp_risk, StuntingRisk, StuntingStatus};

pub const HEURISTIC_SYSTOLIC_HALF_WIDTH: f64 = 15.0;
pub const HEURISTIC_DIASTOLIC_HALF_WIDTH: f64 = 10.0;
pub const HEURISTIC_HAZ_HALF_WIDTH: f64 = 0.5;

/// Program benefit is assumed only below this age.
const PROGRAM_BENEFIT_AGE_LIMIT_MONTHS: f64 = 36.0;

/// Heuristic blood pressure projection from the latest reading.
///
/// Treated subjects are assumed to improve slightly regardless of horizon;
/// untreated subjects drift upwards linearly.
#[must_use]
pub fn heuristic_bp(latest: &AdultObservation, features: &AdultFeatures, months_ahead: u32) -> BpPrediction {
    let months = f64::from(months_ahead);

    let (systolic, diastolic) = if features.on_treatment {
        (latest.systolic - 2.0, latest.diastolic - 1.0)
    } else {
        (latest.systolic + 0.5 * months, latest.diastolic + 0.3 * months)
    };
    let systolic = clamp_systolic(systolic);
    let diastolic = clamp_diastolic(diastolic);

    BpPrediction {
        subject_id: latest.subject_id.clone(),
        method: PredictionMethod::Heuristic,
        months_ahead,
        current: BloodPressure {
            systolic: latest.systolic,
            diastolic: latest.diastolic,
        },
        predicted: BloodPressure { systolic, diastolic },
        trend: None,
        adjustments: None,
        confidence: CONFIDENCE_FLOOR,
        systolic_interval: Interval::around(systolic, HEURISTIC_SYSTOLIC_HALF_WIDTH),
        diastolic_interval: Interval::around(diastolic, HEURISTIC_DIASTOLIC_HALF_WIDTH),
        risk: assess_bp_risk(systolic, diastolic, features),
        recommendations: bp_heuristic_recommendations(),
    }
}

/// Heuristic HAZ projection from the latest measurement.
///
/// Young children enrolled in a program are assumed to gain slowly; all
/// others to decline slowly.
#[must_use]
pub fn heuristic_haz(latest: &ChildObservation, features: &ChildFeatures, months_ahead: u32) -> HazPrediction {
    let months = f64::from(months_ahead);

    let drift = if features.on_program && features.age_months < PROGRAM_BENEFIT_AGE_LIMIT_MONTHS {
        0.05
    } else {
        -0.02
    };
    let predicted_haz = clamp_haz(latest.haz + drift * months);

    HazPrediction {
        subject_id: latest.subject_id.clone(),
        method: PredictionMethod::Heuristic,
        months_ahead,
        current_haz: latest.haz,
        current_age_months: features.age_months,
        stunting_status: StuntingStatus::from_haz(latest.haz),
        predicted_haz,
        predicted_age_months: features.age_months + months,
        stunting_risk: StuntingRisk::from_haz(predicted_haz),
        growth: None,
        adjustments: None,
        confidence: CONFIDENCE_FLOOR,
        haz_interval: Interval::around(predicted_haz, HEURISTIC_HAZ_HALF_WIDTH),
        recommendations: haz_heuristic_recommendations(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{AdultContext, ChildContext};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("Valid date")
    }

    #[test]
    fn test_treated_adult_improves_regardless_of_horizon() {
        let latest = AdultObservation::new("P001", date(), 150.0, 95.0).with_context(AdultContext {
            on_treatment: Some(true),
            ..Default::default()
        });
        let features = AdultFeatures::from_latest(&latest);

        for months in [1, 6, 24] {
            let prediction = heuristic_bp(&latest, &features, months);
            assert!((prediction.predicted.systolic - 148.0).abs() < 1e-12);
            assert!((prediction.predicted.diastolic - 94.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_untreated_adult_drifts_up() {
        let latest = AdultObservation::new("P001", date(), 150.0, 95.0);
        let features = AdultFeatures::from_latest(&latest);

        let prediction = heuristic_bp(&latest, &features, 6);
        assert!((prediction.predicted.systolic - 153.0).abs() < 1e-12);
        assert!((prediction.predicted.diastolic - 96.8).abs() < 1e-12);
        assert_eq!(prediction.method, PredictionMethod::Heuristic);
        assert!((prediction.systolic_interval.width() - 30.0).abs() < 1e-12);
        assert!((prediction.diastolic_interval.width() - 20.0).abs() < 1e-12);
        assert_eq!(prediction.confidence, CONFIDENCE_FLOOR);
        assert_eq!(prediction.recommendations.len(), 2);
    }

    #[test]
    fn test_heuristic_bp_is_clamped() {
        let latest = AdultObservation::new("P001", date(), 249.0, 129.0);
        let features = AdultFeatures::from_latest(&latest);

        let prediction = heuristic_bp(&latest, &features, 60);
        assert_eq!(prediction.predicted.systolic, 250.0);
        assert_eq!(prediction.predicted.diastolic, 130.0);
    }

    #[test]
    fn test_young_enrolled_child_gains() {
        let latest = ChildObservation::new("C001", date(), -2.5).with_context(ChildContext {
            age_months: Some(18.0),
            on_program: Some(true),
            ..Default::default()
        });
        let features = ChildFeatures::from_latest(&latest);

        let prediction = heuristic_haz(&latest, &features, 6);
        assert!((prediction.predicted_haz + 2.2).abs() < 1e-12);
        assert!((prediction.predicted_age_months - 24.0).abs() < 1e-12);
        assert_eq!(prediction.stunting_status, StuntingStatus::Stunted);
        assert_eq!(prediction.stunting_risk, StuntingRisk::High);
    }

    #[test]
    fn test_older_enrolled_child_declines() {
        let latest = ChildObservation::new("C001", date(), -1.0).with_context(ChildContext {
            age_months: Some(40.0),
            on_program: Some(true),
            ..Default::default()
        });
        let features = ChildFeatures::from_latest(&latest);

        let prediction = heuristic_haz(&latest, &features, 10);
        assert!((prediction.predicted_haz + 1.2).abs() < 1e-12);
        assert!((prediction.haz_interval.width() - 1.0).abs() < 1e-12);
    }
}
