//! Application layer: Use cases and services.
//!
//! This module wires the outcome predictor to a record source to implement
//! the two use cases: predicting one subject and scoring a population.

mod population;
mod prediction;

pub use population::PopulationService;
pub use prediction::PredictionService;
