//! Population service: Risk stratification over a whole program.

use std::sync::Arc;

use crate::domain::{OutcomePredictor, PopulationRiskSummary, SubjectKind};
use crate::ports::RecordSource;
use crate::{HealthTwinError, Result};

/// Service for population risk scoring.
pub struct PopulationService<S>
where
    S: RecordSource,
{
    predictor: OutcomePredictor,
    source: Arc<S>,
}

impl<S> PopulationService<S>
where
    S: RecordSource,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new population service.
    pub fn new(predictor: OutcomePredictor, source: Arc<S>) -> Self {
        Self { predictor, source }
    }

    /// Score every subject of the given kind.
    ///
    /// # Arguments
    /// * `threshold` - High-risk threshold; the configured one when `None`
    ///
    /// # Errors
    /// Returns error if the threshold is invalid or the source fails.
    pub fn score(&self, kind: SubjectKind, threshold: Option<f64>) -> Result<PopulationRiskSummary> {
        let snapshot = self
            .source
            .population(kind)
            .map_err(|e| HealthTwinError::Storage(e.into()))?;

        let summary = match threshold {
            Some(t) => self
                .predictor
                .score_population_risk_with_threshold(&snapshot, kind, t)?,
            None => self.predictor.score_population_risk(&snapshot, kind)?,
        };

        tracing::info!(
            "Scored {} {} subjects: {} high, {} moderate, {} low risk (composite {:.2})",
            summary.total_subjects,
            kind,
            summary.high_risk_count,
            summary.moderate_risk_count,
            summary.low_risk_count,
            summary.composite_risk_score
        );
        if !summary.failures.is_empty() {
            tracing::warn!("{} subjects could not be scored", summary.failures.len());
        }
        for warning in &summary.early_warnings {
            tracing::warn!("Early warning: {}", warning.message);
        }

        Ok(summary)
    }
}
