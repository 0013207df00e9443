//! Live ticker board
//!
//! Wires the per-instrument stream workers, the aggregator and the console
//! renderer together and owns process-level policy.

pub mod app;
pub mod logging;

pub use app::{Board, BoardError, BoardSummary};
pub use logging::init_tracing;
