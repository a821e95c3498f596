//! In-memory adapter: Implementation of RecordSource over owned vectors.
//!
//! Used by tests and by callers that already hold their records.

use crate::adapters::StorageError;
use crate::domain::{AdultObservation, ChildObservation};
use crate::ports::RecordSource;

/// Record source backed by plain vectors.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    adults: Vec<AdultObservation>,
    children: Vec<ChildObservation>,
}

impl MemoryRecordSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_adults(mut self, records: impl IntoIterator<Item = AdultObservation>) -> Self {
        self.adults.extend(records);
        self
    }

    #[must_use]
    pub fn with_children(mut self, records: impl IntoIterator<Item = ChildObservation>) -> Self {
        self.children.extend(records);
        self
    }

    pub fn push_adult(&mut self, record: AdultObservation) {
        self.adults.push(record);
    }

    pub fn push_child(&mut self, record: ChildObservation) {
        self.children.push(record);
    }
}

impl RecordSource for MemoryRecordSource {
    type Error = StorageError;

    fn adult_history(&self, subject_id: &str) -> Result<Vec<AdultObservation>, Self::Error> {
        Ok(self
            .adults
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect())
    }

    fn child_history(&self, subject_id: &str) -> Result<Vec<ChildObservation>, Self::Error> {
        Ok(self
            .children
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect())
    }

    fn adult_population(&self) -> Result<Vec<AdultObservation>, Self::Error> {
        Ok(self.adults.clone())
    }

    fn child_population(&self) -> Result<Vec<ChildObservation>, Self::Error> {
        Ok(self.children.clone())
    }
}
