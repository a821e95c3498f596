//! Prediction service: Individual outcome forecasts.
//!
//! Loads a subject's history through the record source and runs the
//! outcome predictor over it.

use std::sync::Arc;

use crate::domain::{OutcomePredictor, Prediction, SubjectKind};
use crate::ports::RecordSource;
use crate::{HealthTwinError, Result};

/// Service for per-subject outcome prediction.
pub struct PredictionService<S>
where
    S: RecordSource,
{
    predictor: OutcomePredictor,
    source: Arc<S>,
}

impl<S> PredictionService<S>
where
    S: RecordSource,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new prediction service.
    pub fn new(predictor: OutcomePredictor, source: Arc<S>) -> Self {
        Self { predictor, source }
    }

    /// Predict the outcome of one subject.
    ///
    /// `months_ahead` falls back to the configured default horizon.
    ///
    /// # Errors
    /// Returns error if the subject has no records or the source fails.
    pub fn predict(
        &self,
        subject_id: &str,
        kind: SubjectKind,
        months_ahead: Option<u32>,
    ) -> Result<Prediction> {
        let months_ahead = months_ahead.unwrap_or(self.predictor.config().default_months_ahead);

        let history = self
            .source
            .history(subject_id, kind)
            .map_err(|e| HealthTwinError::Storage(e.into()))?;

        if history.is_empty() {
            return Err(HealthTwinError::SubjectNotFound(subject_id.to_string()));
        }

        let prediction = self.predictor.predict_outcome(&history, kind, months_ahead)?;

        tracing::info!(
            subject_id = %subject_id,
            kind = %kind,
            method = ?prediction.method(),
            "Predicted outcome {} months ahead from {} observations (confidence {:.2})",
            months_ahead,
            history.len(),
            prediction.confidence()
        );

        Ok(prediction)
    }
}
