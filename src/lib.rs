//! # HealthTwin
//!
//! Outcome prediction and population risk scoring for health program monitoring.
//!
//! This crate provides:
//! - Blood pressure progression forecasts for adults in a hypertension program
//! - Height-for-age (HAZ) trajectory forecasts for children in a stunting program
//! - Population risk stratification with early-warning detection
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types and algorithms (records, trend fitting, risk scoring)
//! - `ports`: Trait definitions for the data-access collaborator
//! - `adapters`: Concrete implementations (in-memory, SQLite, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Predictor configuration with environment overrides

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use config::PredictorConfig;
pub use domain::{
    OutcomePredictor, PopulationRiskSummary, PopulationSnapshot, Prediction, SubjectHistory,
    SubjectKind,
};

/// Result type for HealthTwin operations
pub type Result<T> = std::result::Result<T, HealthTwinError>;

/// Main error type for HealthTwin
#[derive(Debug, thiserror::Error)]
pub enum HealthTwinError {
    #[error("Unknown subject kind: {0} (expected adult or child)")]
    UnknownSubjectKind(String),

    #[error("Subject kind mismatch: requested {requested}, records are {actual}")]
    KindMismatch {
        requested: SubjectKind,
        actual: SubjectKind,
    },

    #[error("Subject history is empty")]
    EmptyHistory,

    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),
}
