//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the predictor and wherever observation records live.

mod records;

pub use records::RecordSource;
