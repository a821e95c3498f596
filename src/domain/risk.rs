//! Risk classification for predicted outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::features::{AdultFeatures, ChildFeatures};

/// Cardiovascular risk tier from a predicted blood pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BpRiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl BpRiskLevel {
    #[must_use]
    pub fn from_pressures(systolic: f64, diastolic: f64) -> Self {
        if systolic >= 180.0 || diastolic >= 110.0 {
            Self::VeryHigh
        } else if systolic >= 160.0 || diastolic >= 100.0 {
            Self::High
        } else if systolic >= 140.0 || diastolic >= 90.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Score before comorbidity increments.
    #[must_use]
    pub fn base_score(&self) -> f64 {
        match self {
            Self::VeryHigh => 0.9,
            Self::High => 0.7,
            Self::Moderate => 0.5,
            Self::Low => 0.2,
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - Routine follow-up",
            Self::Moderate => "Moderate risk - Treatment review recommended",
            Self::High => "High risk - Prompt clinical review advised",
            Self::VeryHigh => "Very high risk - Urgent evaluation required",
        }
    }
}

impl fmt::Display for BpRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
            Self::VeryHigh => write!(f, "VERY HIGH"),
        }
    }
}

/// Blood pressure category (WHO/JNC staging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BpCategory {
    Optimal,
    Normal,
    HighNormal,
    Stage1Hypertension,
    Stage2Hypertension,
    Stage3Hypertension,
}

impl BpCategory {
    #[must_use]
    pub fn from_pressures(systolic: f64, diastolic: f64) -> Self {
        if systolic >= 180.0 || diastolic >= 110.0 {
            Self::Stage3Hypertension
        } else if systolic >= 160.0 || diastolic >= 100.0 {
            Self::Stage2Hypertension
        } else if systolic >= 140.0 || diastolic >= 90.0 {
            Self::Stage1Hypertension
        } else if systolic >= 130.0 || diastolic >= 85.0 {
            Self::HighNormal
        } else if systolic >= 120.0 || diastolic >= 80.0 {
            Self::Normal
        } else {
            Self::Optimal
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Optimal => "Optimal",
            Self::Normal => "Normal",
            Self::HighNormal => "High normal",
            Self::Stage1Hypertension => "Stage 1 hypertension",
            Self::Stage2Hypertension => "Stage 2 hypertension",
            Self::Stage3Hypertension => "Stage 3 hypertension (severe)",
        }
    }
}

/// Risk assessment attached to a blood pressure prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpRiskAssessment {
    pub level: BpRiskLevel,
    /// Tier score plus comorbidity increments, capped at 1.0
    pub score: f64,
    pub category: BpCategory,
}

/// Assess cardiovascular risk from a predicted blood pressure.
#[must_use]
pub fn assess_bp_risk(systolic: f64, diastolic: f64, features: &AdultFeatures) -> BpRiskAssessment {
    let level = BpRiskLevel::from_pressures(systolic, diastolic);

    let mut score = level.base_score();
    if features.diabetes {
        score += 0.2;
    }
    if features.smoking {
        score += 0.15;
    }
    if features.age > 65.0 {
        score += 0.1;
    }

    BpRiskAssessment {
        level,
        score: score.min(1.0),
        category: BpCategory::from_pressures(systolic, diastolic),
    }
}

/// Stunting status of a measured HAZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StuntingStatus {
    Normal,
    Stunted,
}

impl StuntingStatus {
    #[must_use]
    pub fn from_haz(haz: f64) -> Self {
        if haz < -2.0 {
            Self::Stunted
        } else {
            Self::Normal
        }
    }
}

/// Stunting risk of a predicted HAZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StuntingRisk {
    Low,
    Medium,
    High,
}

impl StuntingRisk {
    #[must_use]
    pub fn from_haz(haz: f64) -> Self {
        if haz < -2.0 {
            Self::High
        } else if haz < -1.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for StuntingRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Growth pattern from HAZ velocity (z-score change per month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPattern {
    CatchUpGrowth,
    NormalGrowth,
    GrowthFaltering,
    PoorGrowth,
}

impl GrowthPattern {
    #[must_use]
    pub fn from_velocity(velocity_per_month: f64) -> Self {
        if velocity_per_month > 0.1 {
            Self::CatchUpGrowth
        } else if velocity_per_month > 0.0 {
            Self::NormalGrowth
        } else if velocity_per_month > -0.1 {
            Self::GrowthFaltering
        } else {
            Self::PoorGrowth
        }
    }
}

/// Potential for catch-up growth given age and baseline HAZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchUpPotential {
    High,
    Moderate,
    Low,
}

impl CatchUpPotential {
    #[must_use]
    pub fn assess(features: &ChildFeatures) -> Self {
        let age = features.age_months;
        let baseline = features.baseline_haz;

        if age < 24.0 {
            if baseline > -3.0 {
                Self::High
            } else if baseline > -4.0 {
                Self::Moderate
            } else {
                Self::Low
            }
        } else if age < 36.0 && baseline > -2.5 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{AdultContext, AdultObservation, ChildContext, ChildObservation};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("Valid date")
    }

    #[test]
    fn test_bp_risk_tiers() {
        assert_eq!(BpRiskLevel::from_pressures(185.0, 95.0), BpRiskLevel::VeryHigh);
        assert_eq!(BpRiskLevel::from_pressures(130.0, 112.0), BpRiskLevel::VeryHigh);
        assert_eq!(BpRiskLevel::from_pressures(160.0, 80.0), BpRiskLevel::High);
        assert_eq!(BpRiskLevel::from_pressures(139.0, 90.0), BpRiskLevel::Moderate);
        assert_eq!(BpRiskLevel::from_pressures(139.9, 89.9), BpRiskLevel::Low);
    }

    #[test]
    fn test_bp_risk_score_increments_and_cap() {
        let features = AdultFeatures::from_latest(
            &AdultObservation::new("P001", date(), 150.0, 90.0).with_context(AdultContext {
                age: Some(70.0),
                diabetes: Some(true),
                smoking: Some(true),
                ..Default::default()
            }),
        );

        let moderate = assess_bp_risk(145.0, 85.0, &features);
        assert_eq!(moderate.level, BpRiskLevel::Moderate);
        assert!((moderate.score - 0.95).abs() < 1e-12);

        let very_high = assess_bp_risk(190.0, 100.0, &features);
        assert_eq!(very_high.score, 1.0);
        assert_eq!(very_high.category, BpCategory::Stage3Hypertension);
    }

    #[test]
    fn test_age_increment_is_strictly_above_65() {
        let features = AdultFeatures::from_latest(
            &AdultObservation::new("P001", date(), 120.0, 70.0).with_context(AdultContext {
                age: Some(65.0),
                ..Default::default()
            }),
        );
        assert!((assess_bp_risk(120.0, 70.0, &features).score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_bp_categories() {
        assert_eq!(BpCategory::from_pressures(115.0, 75.0), BpCategory::Optimal);
        assert_eq!(BpCategory::from_pressures(120.0, 75.0), BpCategory::Normal);
        assert_eq!(BpCategory::from_pressures(125.0, 86.0), BpCategory::HighNormal);
        assert_eq!(BpCategory::from_pressures(142.0, 80.0), BpCategory::Stage1Hypertension);
        assert_eq!(BpCategory::from_pressures(150.0, 101.0), BpCategory::Stage2Hypertension);
    }

    #[test]
    fn test_stunting_classification() {
        assert_eq!(StuntingStatus::from_haz(-2.1), StuntingStatus::Stunted);
        assert_eq!(StuntingStatus::from_haz(-2.0), StuntingStatus::Normal);
        assert_eq!(StuntingRisk::from_haz(-2.5), StuntingRisk::High);
        assert_eq!(StuntingRisk::from_haz(-1.5), StuntingRisk::Medium);
        assert_eq!(StuntingRisk::from_haz(0.3), StuntingRisk::Low);
    }

    #[test]
    fn test_growth_pattern() {
        assert_eq!(GrowthPattern::from_velocity(0.2), GrowthPattern::CatchUpGrowth);
        assert_eq!(GrowthPattern::from_velocity(0.05), GrowthPattern::NormalGrowth);
        assert_eq!(GrowthPattern::from_velocity(0.0), GrowthPattern::GrowthFaltering);
        assert_eq!(GrowthPattern::from_velocity(-0.2), GrowthPattern::PoorGrowth);
    }

    #[test]
    fn test_catch_up_potential() {
        let assess = |age: f64, haz: f64| {
            CatchUpPotential::assess(&ChildFeatures::from_latest(
                &ChildObservation::new("C001", date(), haz).with_context(ChildContext {
                    age_months: Some(age),
                    ..Default::default()
                }),
            ))
        };

        assert_eq!(assess(12.0, -2.5), CatchUpPotential::High);
        assert_eq!(assess(12.0, -3.5), CatchUpPotential::Moderate);
        assert_eq!(assess(12.0, -4.5), CatchUpPotential::Low);
        assert_eq!(assess(30.0, -2.0), CatchUpPotential::Moderate);
        assert_eq!(assess(30.0, -3.0), CatchUpPotential::Low);
        assert_eq!(assess(48.0, -1.0), CatchUpPotential::Low);
    }
}
