//! Batch orchestrator.
//!
//! Drives one run: for each source, consult the mapping store, optimize,
//! publish, optionally describe, record. Items are independent; a bounded
//! worker pool processes them concurrently and one item's failure never
//! aborts the batch. Only configuration/authentication errors halt the run.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::BatchRunner;
pub use types::{BatchReport, ItemFailure, ItemOutcome, ItemState, OrchestratorError};
