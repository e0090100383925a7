//! sheetsmith_engine - addressing, cell records and formula syntax checks.

pub mod chart;
pub mod engine;
pub mod error;

pub use error::{EngineError, Result};
