//! Aggregator - the single consumer of the update channel

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::feeds::BoardUpdate;
use crate::state::SharedState;

/// Redraw target invoked after every applied update
pub trait RenderSink: Send {
    fn render(&mut self, state: &SharedState) -> std::io::Result<()>;
}

/// Applies updates to shared state and triggers a render for each one
pub struct Aggregator<R> {
    state: Arc<SharedState>,
    updates_rx: mpsc::Receiver<BoardUpdate>,
    renderer: R,
    stats: AggregatorStats,
}

impl<R: RenderSink> Aggregator<R> {
    pub fn new(
        state: Arc<SharedState>,
        updates_rx: mpsc::Receiver<BoardUpdate>,
        renderer: R,
    ) -> Self {
        Self {
            state,
            updates_rx,
            renderer,
            stats: AggregatorStats::default(),
        }
    }

    /// Run until shutdown or until every sender is gone
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> AggregatorStats {
        info!("Starting aggregator");
        self.render();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    info!("Aggregator received shutdown");
                    break;
                }
                update = self.updates_rx.recv() => match update {
                    Some(update) => {
                        self.apply(update);
                        self.render();
                    }
                    None => {
                        info!("All update senders have closed");
                        break;
                    }
                },
            }
        }

        info!(
            "Aggregator stopped: {} updates applied, {} renders",
            self.stats.applied, self.stats.renders
        );
        self.stats
    }

    fn apply(&mut self, update: BoardUpdate) {
        match update {
            BoardUpdate::Ticker(snapshot) => {
                debug!(
                    instrument = %snapshot.instrument,
                    event_time = ?snapshot.event_time(),
                    last = %snapshot.last_price,
                    "Applying ticker update"
                );

                // Lock is held only inside apply
                self.state.apply(snapshot);
                self.stats.applied += 1;
            }
            BoardUpdate::Unavailable { instrument, reason } => {
                debug!(instrument = %instrument, "Marking unavailable");
                self.state.mark_unavailable(instrument, reason);
                self.stats.marked_unavailable += 1;
            }
        }
    }

    fn render(&mut self) {
        match self.renderer.render(&self.state) {
            Ok(()) => self.stats.renders += 1,
            Err(e) => {
                self.stats.render_errors += 1;
                warn!("Render failed: {}", e);
            }
        }
    }
}

/// Aggregator statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    pub applied: u64,
    pub marked_unavailable: u64,
    pub renders: u64,
    pub render_errors: u64,
}
