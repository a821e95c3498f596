//! Prediction result types.
//!
//! Predictions are constructed fresh per request and never persisted here.

use serde::{Deserialize, Serialize};

use super::adjustment::{BpAdjustments, GrowthAdjustments};
use super::confidence::Interval;
use super::record::SubjectKind;
use super::risk::{
    BpRiskAssessment, CatchUpPotential, GrowthPattern, StuntingRisk, StuntingStatus,
};

/// How a prediction was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    /// Least-squares trend plus clinical adjustments
    Trend,
    /// Fixed rule used when the history is too sparse or degenerate
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

/// Fitted blood pressure trends, per month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpTrendSummary {
    pub systolic_per_month: f64,
    pub diastolic_per_month: f64,
    pub systolic_r_squared: f64,
    pub diastolic_r_squared: f64,
}

/// Blood pressure projection for an adult.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpPrediction {
    pub subject_id: String,
    pub method: PredictionMethod,
    pub months_ahead: u32,
    pub current: BloodPressure,
    pub predicted: BloodPressure,
    /// Present for trend-based predictions only
    pub trend: Option<BpTrendSummary>,
    pub adjustments: Option<BpAdjustments>,
    pub confidence: f64,
    pub systolic_interval: Interval,
    pub diastolic_interval: Interval,
    pub risk: BpRiskAssessment,
    pub recommendations: Vec<String>,
}

/// Growth analysis of a child's HAZ trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthAnalysis {
    /// HAZ change per month
    pub velocity_per_month: f64,
    pub r_squared: f64,
    pub pattern: GrowthPattern,
    pub catch_up_potential: CatchUpPotential,
}

/// HAZ projection for a child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazPrediction {
    pub subject_id: String,
    pub method: PredictionMethod,
    pub months_ahead: u32,
    pub current_haz: f64,
    pub current_age_months: f64,
    pub stunting_status: StuntingStatus,
    pub predicted_haz: f64,
    pub predicted_age_months: f64,
    pub stunting_risk: StuntingRisk,
    /// Present for trend-based predictions only
    pub growth: Option<GrowthAnalysis>,
    pub adjustments: Option<GrowthAdjustments>,
    pub confidence: f64,
    pub haz_interval: Interval,
    pub recommendations: Vec<String>,
}

/// Outcome prediction for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prediction {
    Adult(BpPrediction),
    Child(HazPrediction),
}

impl Prediction {
    #[must_use]
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Adult(_) => SubjectKind::Adult,
            Self::Child(_) => SubjectKind::Child,
        }
    }

    #[must_use]
    pub fn subject_id(&self) -> &str {
        match self {
            Self::Adult(p) => &p.subject_id,
            Self::Child(p) => &p.subject_id,
        }
    }

    #[must_use]
    pub fn method(&self) -> PredictionMethod {
        match self {
            Self::Adult(p) => p.method,
            Self::Child(p) => p.method,
        }
    }

    #[must_use]
    pub fn is_heuristic(&self) -> bool {
        self.method() == PredictionMethod::Heuristic
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Adult(p) => p.confidence,
            Self::Child(p) => p.confidence,
        }
    }

    #[must_use]
    pub fn recommendations(&self) -> &[String] {
        match self {
            Self::Adult(p) => &p.recommendations,
            Self::Child(p) => &p.recommendations,
        }
    }
}
