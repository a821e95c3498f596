//! Clinical and growth adjustments applied to trend projections.
//!
//! All effects are additive to the trend-extrapolated value and the result
//! is clamped to physiological bounds. The coefficients are program policy.

use serde::{Deserialize, Serialize};

use super::features::{flag, AdultFeatures, ChildFeatures};

/// Plausible systolic range in mmHg.
pub const SYSTOLIC_BOUNDS: (f64, f64) = (90.0, 250.0);
/// Plausible diastolic range in mmHg.
pub const DIASTOLIC_BOUNDS: (f64, f64) = (60.0, 130.0);
/// Plausible height-for-age z-score range.
pub const HAZ_BOUNDS: (f64, f64) = (-5.0, 3.0);

/// Reference age for the age effect.
const REFERENCE_AGE: f64 = 50.0;
/// Systolic change per month per year of age above the reference.
const AGE_EFFECT_PER_YEAR_MONTH: f64 = 0.2;
/// Full systolic reduction from adherent treatment.
const MAX_TREATMENT_EFFECT: f64 = 15.0;
/// Months for treatment to reach full effect.
const TREATMENT_RAMP_MONTHS: f64 = 6.0;
const DIABETES_EFFECT_PER_MONTH: f64 = 3.0;
const SMOKING_EFFECT_PER_MONTH: f64 = 2.0;
const DIASTOLIC_AGE_SCALE: f64 = 0.6;
const DIASTOLIC_TREATMENT_SCALE: f64 = 0.7;
const DIASTOLIC_DIABETES_SCALE: f64 = 0.6;

const CATCH_UP_AGE_LIMIT_MONTHS: f64 = 60.0;
const MIN_AGE_FACTOR: f64 = 0.1;
const PROGRAM_EFFECT: f64 = 0.3;
const PROGRAM_RAMP_MONTHS: f64 = 12.0;
const WASH_EFFECT: f64 = 0.1;
const FEEDING_EFFECT: f64 = 0.15;
const HEMOGLOBIN_EFFECT: f64 = 0.1;
const HEMOGLOBIN_THRESHOLD: f64 = 11.0;
const HEMOGLOBIN_SPAN: f64 = 4.0;
/// Growth effects are expressed per six-month horizon.
const GROWTH_EFFECT_HORIZON_MONTHS: f64 = 6.0;

#[must_use]
pub fn clamp_systolic(value: f64) -> f64 {
    value.clamp(SYSTOLIC_BOUNDS.0, SYSTOLIC_BOUNDS.1)
}

#[must_use]
pub fn clamp_diastolic(value: f64) -> f64 {
    value.clamp(DIASTOLIC_BOUNDS.0, DIASTOLIC_BOUNDS.1)
}

#[must_use]
pub fn clamp_haz(value: f64) -> f64 {
    value.clamp(HAZ_BOUNDS.0, HAZ_BOUNDS.1)
}

/// Systolic adjustment terms for an adult; diastolic terms are scaled from these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpAdjustments {
    pub age: f64,
    pub treatment: f64,
    pub diabetes: f64,
    pub smoking: f64,
}

impl BpAdjustments {
    #[must_use]
    pub fn compute(features: &AdultFeatures, months: f64) -> Self {
        let age = (features.age - REFERENCE_AGE) * AGE_EFFECT_PER_YEAR_MONTH * months;

        let treatment = if features.on_treatment && features.adherence > 0.0 {
            let ramp = (features.treatment_months / TREATMENT_RAMP_MONTHS).min(1.0);
            -MAX_TREATMENT_EFFECT * features.adherence * ramp
        } else {
            0.0
        };

        Self {
            age,
            treatment,
            diabetes: DIABETES_EFFECT_PER_MONTH * flag(features.diabetes) * months,
            smoking: SMOKING_EFFECT_PER_MONTH * flag(features.smoking) * months,
        }
    }

    #[must_use]
    pub fn systolic_total(&self) -> f64 {
        self.age + self.treatment + self.diabetes + self.smoking
    }

    /// Smoking does not contribute to the diastolic projection.
    #[must_use]
    pub fn diastolic_total(&self) -> f64 {
        self.age * DIASTOLIC_AGE_SCALE
            + self.treatment * DIASTOLIC_TREATMENT_SCALE
            + self.diabetes * DIASTOLIC_DIABETES_SCALE
    }
}

/// Adjusted and clamped blood pressure projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpProjection {
    pub systolic: f64,
    pub diastolic: f64,
    pub adjustments: BpAdjustments,
}

/// Apply clinical adjustments to trend-extrapolated blood pressure.
#[must_use]
pub fn apply_clinical_adjustments(
    systolic: f64,
    diastolic: f64,
    features: &AdultFeatures,
    months: f64,
) -> BpProjection {
    let adjustments = BpAdjustments::compute(features, months);
    BpProjection {
        systolic: clamp_systolic(systolic + adjustments.systolic_total()),
        diastolic: clamp_diastolic(diastolic + adjustments.diastolic_total()),
        adjustments,
    }
}

/// Growth adjustment terms for a child.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthAdjustments {
    /// Catch-up potential multiplier, shrinking towards 0.1 by 60 months
    pub age_factor: f64,
    pub program: f64,
    pub water_sanitation: f64,
    pub feeding: f64,
    pub hemoglobin: f64,
}

impl GrowthAdjustments {
    #[must_use]
    pub fn compute(features: &ChildFeatures, months: f64) -> Self {
        let horizon = months / GROWTH_EFFECT_HORIZON_MONTHS;
        let age_factor =
            (1.0 - features.age_months / CATCH_UP_AGE_LIMIT_MONTHS).max(MIN_AGE_FACTOR);

        let program = if features.on_program {
            let intensity = (features.program_months / PROGRAM_RAMP_MONTHS).min(1.0);
            PROGRAM_EFFECT * intensity * age_factor * horizon
        } else {
            0.0
        };

        let wash = flag(features.clean_water) + flag(features.sanitation);
        let hb_excess =
            ((features.hemoglobin - HEMOGLOBIN_THRESHOLD) / HEMOGLOBIN_SPAN).max(0.0);

        Self {
            age_factor,
            program,
            water_sanitation: WASH_EFFECT * wash * horizon,
            feeding: FEEDING_EFFECT * flag(features.complementary_feeding) * horizon,
            hemoglobin: HEMOGLOBIN_EFFECT * hb_excess * horizon,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.program + self.water_sanitation + self.feeding + self.hemoglobin
    }
}

/// Adjusted and clamped HAZ projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazProjection {
    pub haz: f64,
    pub adjustments: GrowthAdjustments,
}

/// Apply growth adjustments to a trend-extrapolated HAZ.
#[must_use]
pub fn apply_growth_adjustments(haz: f64, features: &ChildFeatures, months: f64) -> HazProjection {
    let adjustments = GrowthAdjustments::compute(features, months);
    HazProjection {
        haz: clamp_haz(haz + adjustments.total()),
        adjustments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{AdultContext, AdultObservation, ChildContext, ChildObservation};
    use chrono::NaiveDate;

    fn adult(context: AdultContext) -> AdultFeatures {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("Valid date");
        AdultFeatures::from_latest(&AdultObservation::new("P001", date, 150.0, 90.0).with_context(context))
    }

    fn child(context: ChildContext) -> ChildFeatures {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("Valid date");
        ChildFeatures::from_latest(&ChildObservation::new("C001", date, -2.0).with_context(context))
    }

    #[test]
    fn test_reference_adult_is_unadjusted() {
        let projection = apply_clinical_adjustments(150.0, 90.0, &adult(AdultContext::default()), 6.0);
        assert!((projection.systolic - 150.0).abs() < 1e-12);
        assert!((projection.diastolic - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_full_treatment_effect() {
        let features = adult(AdultContext {
            on_treatment: Some(true),
            adherence: Some(1.0),
            treatment_months: Some(6.0),
            ..Default::default()
        });
        let projection = apply_clinical_adjustments(150.0, 90.0, &features, 6.0);
        assert!((projection.adjustments.treatment + 15.0).abs() < 1e-12);
        assert!((projection.systolic - 135.0).abs() < 1e-12);
        assert!((projection.diastolic - 79.5).abs() < 1e-12);
    }

    #[test]
    fn test_treatment_ramp_and_adherence_scale() {
        let features = adult(AdultContext {
            on_treatment: Some(true),
            adherence: Some(0.5),
            treatment_months: Some(3.0),
            ..Default::default()
        });
        let adj = BpAdjustments::compute(&features, 6.0);
        assert!((adj.treatment + 3.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_adherence_has_no_treatment_effect() {
        let features = adult(AdultContext {
            on_treatment: Some(true),
            adherence: Some(0.0),
            treatment_months: Some(12.0),
            ..Default::default()
        });
        assert_eq!(BpAdjustments::compute(&features, 6.0).treatment, 0.0);
    }

    #[test]
    fn test_age_diabetes_smoking_effects() {
        let features = adult(AdultContext {
            age: Some(60.0),
            diabetes: Some(true),
            smoking: Some(true),
            ..Default::default()
        });
        let adj = BpAdjustments::compute(&features, 2.0);
        assert!((adj.age - 4.0).abs() < 1e-12);
        assert!((adj.diabetes - 6.0).abs() < 1e-12);
        assert!((adj.smoking - 4.0).abs() < 1e-12);
        assert!((adj.systolic_total() - 14.0).abs() < 1e-12);
        // 4 * 0.6 + 6 * 0.6, smoking excluded
        assert!((adj.diastolic_total() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_bp_clamping() {
        let features = adult(AdultContext {
            age: Some(90.0),
            diabetes: Some(true),
            smoking: Some(true),
            ..Default::default()
        });
        let high = apply_clinical_adjustments(240.0, 125.0, &features, 24.0);
        assert_eq!(high.systolic, 250.0);
        assert_eq!(high.diastolic, 130.0);

        let low = apply_clinical_adjustments(40.0, 20.0, &adult(AdultContext::default()), 1.0);
        assert_eq!(low.systolic, 90.0);
        assert_eq!(low.diastolic, 60.0);
    }

    #[test]
    fn test_program_effect_with_age_factor() {
        let features = child(ChildContext {
            age_months: Some(12.0),
            on_program: Some(true),
            program_months: Some(12.0),
            hemoglobin: Some(11.0),
            ..Default::default()
        });
        let adj = GrowthAdjustments::compute(&features, 6.0);
        assert!((adj.age_factor - 0.8).abs() < 1e-12);
        assert!((adj.program - 0.24).abs() < 1e-12);
        assert_eq!(adj.hemoglobin, 0.0);
    }

    #[test]
    fn test_age_factor_floor() {
        let features = child(ChildContext {
            age_months: Some(72.0),
            ..Default::default()
        });
        let adj = GrowthAdjustments::compute(&features, 6.0);
        assert!((adj.age_factor - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_environment_and_nutrition_effects() {
        let features = child(ChildContext {
            clean_water: Some(true),
            sanitation: Some(true),
            complementary_feeding: Some(true),
            hemoglobin: Some(15.0),
            ..Default::default()
        });
        let adj = GrowthAdjustments::compute(&features, 12.0);
        assert!((adj.water_sanitation - 0.4).abs() < 1e-12);
        assert!((adj.feeding - 0.3).abs() < 1e-12);
        assert!((adj.hemoglobin - 0.2).abs() < 1e-12);
        assert_eq!(adj.program, 0.0);
    }

    #[test]
    fn test_haz_clamping() {
        let features = child(ChildContext::default());
        assert_eq!(apply_growth_adjustments(-7.0, &features, 1.0).haz, -5.0);
        assert_eq!(apply_growth_adjustments(4.0, &features, 1.0).haz, 3.0);
    }
}
