//! Domain layer: Core types and algorithms.
//!
//! Everything here is pure: no I/O, no shared state. Data arrives by
//! parameter and results are plain serializable values.

pub mod adjustment;
pub mod confidence;
pub mod features;
pub mod heuristic;
pub mod population;
pub mod prediction;
mod predictor;
pub mod recommendation;
pub mod record;
pub mod risk;
pub mod trend;

pub use adjustment::{BpAdjustments, GrowthAdjustments};
pub use confidence::Interval;
pub use features::{AdultFeatures, ChildFeatures};
pub use population::{
    EarlyWarning, PopulationRiskSummary, RankedRiskFactor, RiskAlert, RiskFactor, RiskTier,
    ScoringFailure, SubjectRiskScore, Urgency,
};
pub use prediction::{
    BloodPressure, BpPrediction, BpTrendSummary, GrowthAnalysis, HazPrediction, Prediction,
    PredictionMethod,
};
pub use predictor::OutcomePredictor;
pub use record::{
    AdultContext, AdultObservation, ChildContext, ChildObservation, Observation,
    PopulationSnapshot, Sex, SubjectHistory, SubjectKind,
};
pub use risk::{
    BpCategory, BpRiskAssessment, BpRiskLevel, CatchUpPotential, GrowthPattern, StuntingRisk,
    StuntingStatus,
};
pub use trend::{TrendError, TrendFit};
