//! Record source port: Trait for reading observation records.
//!
//! This trait abstracts where histories and population snapshots come from
//! (SQLite, memory) so the predictor only ever sees plain values.

use crate::domain::{
    AdultObservation, ChildObservation, PopulationSnapshot, SubjectHistory, SubjectKind,
};

/// Trait for read access to observation records.
pub trait RecordSource: Send + Sync {
    /// Error type for record access.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load every blood pressure reading of one adult.
    ///
    /// An unknown subject yields an empty list.
    ///
    /// # Errors
    /// Returns error if the backend read fails.
    fn adult_history(&self, subject_id: &str) -> Result<Vec<AdultObservation>, Self::Error>;

    /// Load every growth measurement of one child.
    ///
    /// An unknown subject yields an empty list.
    ///
    /// # Errors
    /// Returns error if the backend read fails.
    fn child_history(&self, subject_id: &str) -> Result<Vec<ChildObservation>, Self::Error>;

    /// Load all adult readings.
    ///
    /// # Errors
    /// Returns error if the backend read fails.
    fn adult_population(&self) -> Result<Vec<AdultObservation>, Self::Error>;

    /// Load all child measurements.
    ///
    /// # Errors
    /// Returns error if the backend read fails.
    fn child_population(&self) -> Result<Vec<ChildObservation>, Self::Error>;

    /// Load the history of one subject of the given kind.
    ///
    /// # Errors
    /// Returns error if the backend read fails.
    fn history(&self, subject_id: &str, kind: SubjectKind) -> Result<SubjectHistory, Self::Error> {
        Ok(match kind {
            SubjectKind::Adult => SubjectHistory::Adult(self.adult_history(subject_id)?),
            SubjectKind::Child => SubjectHistory::Child(self.child_history(subject_id)?),
        })
    }

    /// Load every record of the given kind.
    ///
    /// # Errors
    /// Returns error if the backend read fails.
    fn population(&self, kind: SubjectKind) -> Result<PopulationSnapshot, Self::Error> {
        Ok(match kind {
            SubjectKind::Adult => PopulationSnapshot::Adults(self.adult_population()?),
            SubjectKind::Child => PopulationSnapshot::Children(self.child_population()?),
        })
    }
}
