//! Outcome predictor: trend projection with clinical adjustment, falling back
//! to heuristics when the history cannot support a trend.

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::adjustment::{apply_clinical_adjustments, apply_growth_adjustments};
use super::confidence::{
    bp_confidence, haz_confidence, Interval, DIASTOLIC_HALF_WIDTH, HAZ_HALF_WIDTH,
    SYSTOLIC_HALF_WIDTH,
};
use super::features::{AdultFeatures, ChildFeatures};
use super::heuristic::{heuristic_bp, heuristic_haz};
use super::population::{score_adult_population, score_child_population, PopulationRiskSummary};
use super::prediction::{
    BloodPressure, BpPrediction, BpTrendSummary, GrowthAnalysis, HazPrediction, Prediction,
    PredictionMethod,
};
use super::recommendation::{bp_recommendations, haz_recommendations};
use super::record::{
    sorted_by_date, AdultObservation, ChildObservation, PopulationSnapshot, SubjectHistory,
    SubjectKind,
};
use super::risk::{assess_bp_risk, CatchUpPotential, GrowthPattern, StuntingRisk, StuntingStatus};
use super::trend::{elapsed_days, elapsed_months, fit_linear, TrendError, DAYS_PER_MONTH};
use crate::config::{is_valid_threshold, PredictorConfig};
use crate::{HealthTwinError, Result};

/// Predicts individual outcomes and scores populations.
///
/// Holds no data; every call works on the history passed in, so identical
/// input always yields identical output.
#[derive(Debug, Clone, Default)]
pub struct OutcomePredictor {
    config: PredictorConfig,
}

impl OutcomePredictor {
    /// Predictor configured from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PredictorConfig::from_env_or_default())
    }

    #[must_use]
    pub fn with_config(config: PredictorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Predict the outcome of one subject `months_ahead` months past its
    /// latest observation.
    ///
    /// # Errors
    /// - `KindMismatch` if the history is not of the requested kind
    /// - `EmptyHistory` if no usable observation remains
    pub fn predict_outcome(
        &self,
        history: &SubjectHistory,
        kind: SubjectKind,
        months_ahead: u32,
    ) -> Result<Prediction> {
        if history.kind() != kind {
            return Err(HealthTwinError::KindMismatch {
                requested: kind,
                actual: history.kind(),
            });
        }

        match history {
            SubjectHistory::Adult(obs) => {
                Ok(Prediction::Adult(self.predict_bp_progression(obs, months_ahead)?))
            }
            SubjectHistory::Child(obs) => {
                Ok(Prediction::Child(self.predict_haz_progression(obs, months_ahead)?))
            }
        }
    }

    /// Blood pressure projection for an adult.
    ///
    /// # Errors
    /// Returns `EmptyHistory` if no valid observation is given.
    pub fn predict_bp_progression(
        &self,
        history: &[AdultObservation],
        months_ahead: u32,
    ) -> Result<BpPrediction> {
        let valid: Vec<AdultObservation> = history
            .iter()
            .filter(|o| o.validate().is_ok())
            .cloned()
            .collect();
        if valid.len() < history.len() {
            warn!("Skipped {} invalid adult observations", history.len() - valid.len());
        }

        let sorted = sorted_by_date(&valid);
        let features = AdultFeatures::extract(&sorted).ok_or(HealthTwinError::EmptyHistory)?;
        let latest = sorted.last().ok_or(HealthTwinError::EmptyHistory)?;

        if sorted.len() < 2 {
            debug!(subject_id = %latest.subject_id, "Single observation, using heuristic");
            return Ok(heuristic_bp(latest, &features, months_ahead));
        }

        match trend_bp(&sorted, latest, &features, months_ahead) {
            Ok(prediction) => {
                debug!(
                    subject_id = %latest.subject_id,
                    confidence = prediction.confidence,
                    "BP trend prediction complete"
                );
                Ok(prediction)
            }
            Err(e) => {
                warn!(subject_id = %latest.subject_id, error = %e, "BP trend failed, using heuristic");
                Ok(heuristic_bp(latest, &features, months_ahead))
            }
        }
    }

    /// Height-for-age projection for a child.
    ///
    /// # Errors
    /// Returns `EmptyHistory` if no valid observation is given.
    pub fn predict_haz_progression(
        &self,
        history: &[ChildObservation],
        months_ahead: u32,
    ) -> Result<HazPrediction> {
        let valid: Vec<ChildObservation> = history
            .iter()
            .filter(|o| o.validate().is_ok())
            .cloned()
            .collect();
        if valid.len() < history.len() {
            warn!("Skipped {} invalid child observations", history.len() - valid.len());
        }

        let sorted = sorted_by_date(&valid);
        let features = ChildFeatures::extract(&sorted).ok_or(HealthTwinError::EmptyHistory)?;
        let latest = sorted.last().ok_or(HealthTwinError::EmptyHistory)?;

        if sorted.len() < 2 {
            debug!(subject_id = %latest.subject_id, "Single observation, using heuristic");
            return Ok(heuristic_haz(latest, &features, months_ahead));
        }

        match trend_haz(&sorted, latest, &features, months_ahead) {
            Ok(prediction) => {
                debug!(
                    subject_id = %latest.subject_id,
                    confidence = prediction.confidence,
                    "HAZ trend prediction complete"
                );
                Ok(prediction)
            }
            Err(e) => {
                warn!(subject_id = %latest.subject_id, error = %e, "HAZ trend failed, using heuristic");
                Ok(heuristic_haz(latest, &features, months_ahead))
            }
        }
    }

    /// Score a population snapshot with the configured threshold.
    ///
    /// # Errors
    /// Returns `KindMismatch` if the snapshot is not of the requested kind.
    pub fn score_population_risk(
        &self,
        snapshot: &PopulationSnapshot,
        kind: SubjectKind,
    ) -> Result<PopulationRiskSummary> {
        score_snapshot(snapshot, kind, &self.config)
    }

    /// Score a population snapshot with a caller-supplied high-risk threshold.
    ///
    /// # Errors
    /// - `Validation` if the threshold is outside [0, 1]
    /// - `KindMismatch` if the snapshot is not of the requested kind
    pub fn score_population_risk_with_threshold(
        &self,
        snapshot: &PopulationSnapshot,
        kind: SubjectKind,
        threshold: f64,
    ) -> Result<PopulationRiskSummary> {
        if !is_valid_threshold(threshold) {
            return Err(HealthTwinError::Validation(format!(
                "Risk threshold must be within [0, 1], got {threshold}"
            )));
        }
        score_snapshot(snapshot, kind, &self.config.with_risk_threshold(threshold))
    }
}

fn score_snapshot(
    snapshot: &PopulationSnapshot,
    kind: SubjectKind,
    config: &PredictorConfig,
) -> Result<PopulationRiskSummary> {
    if snapshot.kind() != kind {
        return Err(HealthTwinError::KindMismatch {
            requested: kind,
            actual: snapshot.kind(),
        });
    }

    let summary = match snapshot {
        PopulationSnapshot::Adults(records) => score_adult_population(records, config),
        PopulationSnapshot::Children(records) => score_child_population(records, config),
    };

    debug!(
        kind = %kind,
        subjects = summary.total_subjects,
        high_risk = summary.high_risk_count,
        failures = summary.failures.len(),
        "Population scored"
    );
    Ok(summary)
}

fn trend_bp(
    history: &[AdultObservation],
    latest: &AdultObservation,
    features: &AdultFeatures,
    months_ahead: u32,
) -> std::result::Result<BpPrediction, TrendError> {
    let dates: Vec<NaiveDate> = history.iter().map(|o| o.date).collect();
    let days = elapsed_days(&dates);
    let systolic: Vec<f64> = history.iter().map(|o| o.systolic).collect();
    let diastolic: Vec<f64> = history.iter().map(|o| o.diastolic).collect();

    let systolic_fit = fit_linear(&days, &systolic)?;
    let diastolic_fit = fit_linear(&days, &diastolic)?;

    let months = f64::from(months_ahead);
    let horizon_days = months * DAYS_PER_MONTH;
    let projection = apply_clinical_adjustments(
        latest.systolic + systolic_fit.slope * horizon_days,
        latest.diastolic + diastolic_fit.slope * horizon_days,
        features,
        months,
    );
    if !(projection.systolic.is_finite() && projection.diastolic.is_finite()) {
        return Err(TrendError::NonFinite);
    }

    let confidence = bp_confidence(history.len(), &systolic_fit, &diastolic_fit);

    Ok(BpPrediction {
        subject_id: latest.subject_id.clone(),
        method: PredictionMethod::Trend,
        months_ahead,
        current: BloodPressure {
            systolic: latest.systolic,
            diastolic: latest.diastolic,
        },
        predicted: BloodPressure {
            systolic: projection.systolic,
            diastolic: projection.diastolic,
        },
        trend: Some(BpTrendSummary {
            systolic_per_month: systolic_fit.slope * DAYS_PER_MONTH,
            diastolic_per_month: diastolic_fit.slope * DAYS_PER_MONTH,
            systolic_r_squared: systolic_fit.r_squared(),
            diastolic_r_squared: diastolic_fit.r_squared(),
        }),
        adjustments: Some(projection.adjustments),
        confidence,
        systolic_interval: Interval::scaled(projection.systolic, SYSTOLIC_HALF_WIDTH, confidence),
        diastolic_interval: Interval::scaled(projection.diastolic, DIASTOLIC_HALF_WIDTH, confidence),
        risk: assess_bp_risk(projection.systolic, projection.diastolic, features),
        recommendations: bp_recommendations(projection.systolic, features),
    })
}

fn trend_haz(
    history: &[ChildObservation],
    latest: &ChildObservation,
    features: &ChildFeatures,
    months_ahead: u32,
) -> std::result::Result<HazPrediction, TrendError> {
    let dates: Vec<NaiveDate> = history.iter().map(|o| o.date).collect();
    let months_elapsed = elapsed_months(&dates);
    let haz: Vec<f64> = history.iter().map(|o| o.haz).collect();

    let fit = fit_linear(&months_elapsed, &haz)?;

    let months = f64::from(months_ahead);
    let projection = apply_growth_adjustments(latest.haz + fit.slope * months, features, months);
    if !projection.haz.is_finite() {
        return Err(TrendError::NonFinite);
    }

    let confidence = haz_confidence(history.len(), &fit);

    Ok(HazPrediction {
        subject_id: latest.subject_id.clone(),
        method: PredictionMethod::Trend,
        months_ahead,
        current_haz: latest.haz,
        current_age_months: features.age_months,
        stunting_status: StuntingStatus::from_haz(latest.haz),
        predicted_haz: projection.haz,
        predicted_age_months: features.age_months + months,
        stunting_risk: StuntingRisk::from_haz(projection.haz),
        growth: Some(GrowthAnalysis {
            velocity_per_month: fit.slope,
            r_squared: fit.r_squared(),
            pattern: GrowthPattern::from_velocity(fit.slope),
            catch_up_potential: CatchUpPotential::assess(features),
        }),
        adjustments: Some(projection.adjustments),
        confidence,
        haz_interval: Interval::scaled(projection.haz, HAZ_HALF_WIDTH, confidence),
        recommendations: haz_recommendations(projection.haz, features),
    })
}
