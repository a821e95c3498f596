//! Adapters layer: Concrete implementations of ports.
//!
//! - `memory`: in-process record source
//! - `sqlite`: SQLite record source
//! - `sanitize`: PII filtering for logs

pub mod memory;
pub mod sanitize;
pub mod sqlite;

pub use memory::MemoryRecordSource;
pub use sqlite::{SqliteRecordSource, StorageError};
