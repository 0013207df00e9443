//! Live ticker ingestion and aggregation
//!
//! Features:
//! - One WebSocket stream worker per tracked instrument
//! - Fan-in over a single bounded update channel
//! - Shared state behind one coarse lock
//! - Render trigger after every applied update

pub mod aggregator;
pub mod feeds;
pub mod state;

pub use aggregator::{Aggregator, AggregatorStats, RenderSink};
pub use feeds::{decode_frame, BoardUpdate, StreamWorker, WorkerExit, WorkerFailure};
pub use state::{BoardState, BoardStateStats, SharedState};
