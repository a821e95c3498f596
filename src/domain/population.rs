//! Population risk stratification and early-warning detection.
//!
//! Each subject is scored independently from its latest observation, so the
//! per-subject pass runs in parallel. A malformed subject is reported as a
//! failure and never aborts the batch.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::features::{AdultFeatures, ChildFeatures};
use super::recommendation::ADHERENCE_SUPPORT_THRESHOLD;
use super::record::{AdultObservation, ChildObservation, Observation, SubjectKind};
use crate::config::PredictorConfig;

/// Rise in recent mean systolic (mmHg) that raises an early warning.
pub const SYSTOLIC_WARNING_RISE: f64 = 5.0;
/// Fall in recent mean HAZ that raises an early warning.
pub const HAZ_WARNING_DROP: f64 = 0.2;

/// A scored risk factor. Declaration order is the tie-break order when ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    /// Systolic ≥ 160 mmHg
    SevereHypertension,
    /// Systolic ≥ 140 mmHg
    Hypertension,
    /// Age ≥ 65 years
    AdvancedAge,
    Diabetes,
    Smoking,
    /// On treatment with adherence below 0.8
    PoorAdherence,
    /// HAZ < -3
    SevereStunting,
    /// HAZ < -2
    ModerateStunting,
    /// Age under 24 months
    EarlyChildhood,
    /// Hemoglobin < 10 g/dL
    SevereAnemia,
    /// Hemoglobin < 11 g/dL
    Anemia,
    NoCleanWater,
    PoorSanitation,
}

impl RiskFactor {
    /// Contribution to a subject's risk score.
    #[must_use]
    pub fn weight(&self) -> f64 {
        match self {
            Self::SevereHypertension => 0.4,
            Self::Hypertension => 0.2,
            Self::AdvancedAge => 0.2,
            Self::Diabetes => 0.3,
            Self::Smoking => 0.2,
            Self::PoorAdherence => 0.2,
            Self::SevereStunting => 0.5,
            Self::ModerateStunting => 0.3,
            Self::EarlyChildhood => 0.2,
            Self::SevereAnemia => 0.3,
            Self::Anemia => 0.2,
            Self::NoCleanWater => 0.1,
            Self::PoorSanitation => 0.1,
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::SevereHypertension => "Severe hypertension",
            Self::Hypertension => "Hypertension",
            Self::AdvancedAge => "Advanced age",
            Self::Diabetes => "Diabetes",
            Self::Smoking => "Smoking",
            Self::PoorAdherence => "Poor treatment adherence",
            Self::SevereStunting => "Severe stunting",
            Self::ModerateStunting => "Moderate stunting",
            Self::EarlyChildhood => "Critical age window (under 24 months)",
            Self::SevereAnemia => "Severe anemia",
            Self::Anemia => "Anemia",
            Self::NoCleanWater => "No access to clean water",
            Self::PoorSanitation => "Poor sanitation",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Risk factors present in an adult's latest reading.
#[must_use]
pub fn adult_risk_factors(latest: &AdultObservation, features: &AdultFeatures) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    if latest.systolic >= 160.0 {
        factors.push(RiskFactor::SevereHypertension);
    } else if latest.systolic >= 140.0 {
        factors.push(RiskFactor::Hypertension);
    }
    if features.age >= 65.0 {
        factors.push(RiskFactor::AdvancedAge);
    }
    if features.diabetes {
        factors.push(RiskFactor::Diabetes);
    }
    if features.smoking {
        factors.push(RiskFactor::Smoking);
    }
    if features.on_treatment && features.adherence < ADHERENCE_SUPPORT_THRESHOLD {
        factors.push(RiskFactor::PoorAdherence);
    }

    factors
}

/// Risk factors present in a child's latest measurement.
#[must_use]
pub fn child_risk_factors(latest: &ChildObservation, features: &ChildFeatures) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    if latest.haz < -3.0 {
        factors.push(RiskFactor::SevereStunting);
    } else if latest.haz < -2.0 {
        factors.push(RiskFactor::ModerateStunting);
    }
    if features.age_months < 24.0 {
        factors.push(RiskFactor::EarlyChildhood);
    }
    if features.hemoglobin < 10.0 {
        factors.push(RiskFactor::SevereAnemia);
    } else if features.hemoglobin < 11.0 {
        factors.push(RiskFactor::Anemia);
    }
    if !features.clean_water {
        factors.push(RiskFactor::NoCleanWater);
    }
    if !features.sanitation {
        factors.push(RiskFactor::PoorSanitation);
    }

    factors
}

/// Sum of factor weights, capped at 1.0.
#[must_use]
pub fn risk_score(factors: &[RiskFactor]) -> f64 {
    factors.iter().map(RiskFactor::weight).sum::<f64>().min(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    #[must_use]
    pub fn from_score(score: f64, config: &PredictorConfig) -> Self {
        if score >= config.risk_threshold {
            Self::High
        } else if score >= config.moderate_threshold {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Medium,
    High,
}

/// Risk score of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRiskScore {
    pub subject_id: String,
    /// Date of the scored observation
    pub observed_on: NaiveDate,
    /// Systolic for adults, HAZ for children
    pub latest_value: f64,
    pub score: f64,
    pub tier: RiskTier,
    pub factors: Vec<RiskFactor>,
}

/// A high-risk subject requiring follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub subject_id: String,
    pub score: f64,
    pub urgency: Urgency,
    pub factors: Vec<RiskFactor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedRiskFactor {
    pub factor: RiskFactor,
    /// Number of subjects carrying the factor
    pub subjects: usize,
}

/// Population-level deterioration in the recent window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyWarning {
    pub metric: String,
    pub window_days: i64,
    pub recent_mean: f64,
    pub overall_mean: f64,
    /// Recent mean minus overall mean
    pub change: f64,
    pub message: String,
}

/// A subject that could not be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringFailure {
    pub subject_id: String,
    pub reason: String,
}

/// Aggregated risk picture of a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRiskSummary {
    pub kind: SubjectKind,
    pub threshold: f64,
    pub total_subjects: usize,
    pub high_risk_count: usize,
    pub moderate_risk_count: usize,
    pub low_risk_count: usize,
    /// Mean subject score (0 for an empty population)
    pub composite_risk_score: f64,
    /// Factors ranked by the number of subjects carrying them
    pub dominant_risk_factors: Vec<RankedRiskFactor>,
    /// High-risk subjects, highest score first
    pub high_risk_alerts: Vec<RiskAlert>,
    /// Every scored subject, ordered by subject ID
    pub subject_scores: Vec<SubjectRiskScore>,
    pub early_warnings: Vec<EarlyWarning>,
    pub failures: Vec<ScoringFailure>,
}

/// Score an adult population snapshot.
#[must_use]
pub fn score_adult_population(records: &[AdultObservation], config: &PredictorConfig) -> PopulationRiskSummary {
    let latest = latest_per_subject(records);

    let outcomes: Vec<Result<SubjectRiskScore, ScoringFailure>> = latest
        .par_iter()
        .map(|obs| -> Result<SubjectRiskScore, ScoringFailure> {
            obs.validate().map_err(|errors| failure(*obs, errors))?;
            let features = AdultFeatures::from_latest(obs);
            Ok(subject_score(*obs, adult_risk_factors(obs, &features), config))
        })
        .collect();

    let warnings = window_means(records, config.early_warning_days)
        .and_then(|(recent, overall)| systolic_warning(recent, overall, config.early_warning_days))
        .into_iter()
        .collect();

    summarize(SubjectKind::Adult, outcomes, warnings, config)
}

/// Score a child population snapshot.
#[must_use]
pub fn score_child_population(records: &[ChildObservation], config: &PredictorConfig) -> PopulationRiskSummary {
    let latest = latest_per_subject(records);

    let outcomes: Vec<Result<SubjectRiskScore, ScoringFailure>> = latest
        .par_iter()
        .map(|obs| -> Result<SubjectRiskScore, ScoringFailure> {
            obs.validate().map_err(|errors| failure(*obs, errors))?;
            let features = ChildFeatures::from_latest(obs);
            Ok(subject_score(*obs, child_risk_factors(obs, &features), config))
        })
        .collect();

    let warnings = window_means(records, config.early_warning_days)
        .and_then(|(recent, overall)| haz_warning(recent, overall, config.early_warning_days))
        .into_iter()
        .collect();

    summarize(SubjectKind::Child, outcomes, warnings, config)
}

/// Latest observation of every subject, ordered by subject ID.
///
/// Same-day observations resolve to the one recorded last.
fn latest_per_subject<T: Observation>(records: &[T]) -> Vec<&T> {
    let mut latest: BTreeMap<&str, &T> = BTreeMap::new();
    for record in records {
        latest
            .entry(record.subject_id())
            .and_modify(|current| {
                if record.date() >= current.date() {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    latest.into_values().collect()
}

fn failure<T: Observation>(obs: &T, errors: Vec<String>) -> ScoringFailure {
    ScoringFailure {
        subject_id: obs.subject_id().to_string(),
        reason: errors.join("; "),
    }
}

fn subject_score<T: Observation>(obs: &T, factors: Vec<RiskFactor>, config: &PredictorConfig) -> SubjectRiskScore {
    let score = risk_score(&factors);
    SubjectRiskScore {
        subject_id: obs.subject_id().to_string(),
        observed_on: obs.date(),
        latest_value: obs.target_value(),
        score,
        tier: RiskTier::from_score(score, config),
        factors,
    }
}

fn summarize(
    kind: SubjectKind,
    outcomes: Vec<Result<SubjectRiskScore, ScoringFailure>>,
    early_warnings: Vec<EarlyWarning>,
    config: &PredictorConfig,
) -> PopulationRiskSummary {
    let mut subject_scores = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(score) => subject_scores.push(score),
            Err(f) => failures.push(f),
        }
    }

    let count_tier = |tier: RiskTier| subject_scores.iter().filter(|s| s.tier == tier).count();
    let high_risk_count = count_tier(RiskTier::High);
    let moderate_risk_count = count_tier(RiskTier::Moderate);
    let low_risk_count = count_tier(RiskTier::Low);

    let composite_risk_score = if subject_scores.is_empty() {
        0.0
    } else {
        subject_scores.iter().map(|s| s.score).sum::<f64>() / subject_scores.len() as f64
    };

    let mut factor_counts: BTreeMap<RiskFactor, usize> = BTreeMap::new();
    for factor in subject_scores.iter().flat_map(|s| &s.factors) {
        *factor_counts.entry(*factor).or_insert(0) += 1;
    }
    let mut dominant_risk_factors: Vec<RankedRiskFactor> = factor_counts
        .into_iter()
        .map(|(factor, subjects)| RankedRiskFactor { factor, subjects })
        .collect();
    dominant_risk_factors.sort_by(|a, b| b.subjects.cmp(&a.subjects));

    let mut high_risk_alerts: Vec<RiskAlert> = subject_scores
        .iter()
        .filter(|s| s.tier == RiskTier::High)
        .map(|s| RiskAlert {
            subject_id: s.subject_id.clone(),
            score: s.score,
            urgency: if s.score >= config.urgent_threshold {
                Urgency::High
            } else {
                Urgency::Medium
            },
            factors: s.factors.clone(),
        })
        .collect();
    high_risk_alerts.sort_by(|a, b| b.score.total_cmp(&a.score));

    PopulationRiskSummary {
        kind,
        threshold: config.risk_threshold,
        total_subjects: subject_scores.len() + failures.len(),
        high_risk_count,
        moderate_risk_count,
        low_risk_count,
        composite_risk_score,
        dominant_risk_factors,
        high_risk_alerts,
        subject_scores,
        early_warnings,
        failures,
    }
}

/// Mean target value over the recent window and over all time.
///
/// The window covers `window_days` calendar days ending at the latest
/// observation date in the snapshot, that date included. A window reaching
/// past the calendar range covers every record. Non-finite values are
/// ignored. Returns `None` without usable data.
fn window_means<T: Observation>(records: &[T], window_days: i64) -> Option<(f64, f64)> {
    let valid: Vec<&T> = records.iter().filter(|r| r.target_value().is_finite()).collect();
    let end = valid.iter().map(|r| r.date()).max()?;

    // Exclusive lower bound; `None` means unbounded.
    let start = Duration::try_days(window_days).and_then(|span| end.checked_sub_signed(span));

    let overall = mean(valid.iter().map(|r| r.target_value()))?;
    let recent = mean(
        valid
            .iter()
            .filter(|r| start.map_or(true, |start| r.date() > start))
            .map(|r| r.target_value()),
    )?;

    Some((recent, overall))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn systolic_warning(recent: f64, overall: f64, window_days: i64) -> Option<EarlyWarning> {
    let change = recent - overall;
    (change > SYSTOLIC_WARNING_RISE).then(|| EarlyWarning {
        metric: "systolic".to_string(),
        window_days,
        recent_mean: recent,
        overall_mean: overall,
        change,
        message: format!(
            "Mean systolic pressure rose {change:.1} mmHg over the last {window_days} days ({recent:.1} vs {overall:.1})"
        ),
    })
}

fn haz_warning(recent: f64, overall: f64, window_days: i64) -> Option<EarlyWarning> {
    let change = recent - overall;
    (-change > HAZ_WARNING_DROP).then(|| EarlyWarning {
        metric: "haz".to_string(),
        window_days,
        recent_mean: recent,
        overall_mean: overall,
        change,
        message: format!(
            "Mean HAZ fell {:.2} over the last {window_days} days ({recent:.2} vs {overall:.2})",
            -change
        ),
    })
}
