//! Board runtime: spawns workers and the aggregator, applies failure policy

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use tickerboard_core::{BoardConfig, FeedError, Instrument};
use tickerboard_feed::{
    Aggregator, AggregatorStats, BoardUpdate, RenderSink, SharedState, StreamWorker, WorkerExit,
    WorkerFailure,
};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// How the run ended
#[derive(Debug)]
pub struct BoardSummary {
    pub aggregator: AggregatorStats,
    pub workers: Vec<(Instrument, WorkerExit)>,
}

pub struct Board {
    config: BoardConfig,
    state: Arc<SharedState>,
}

impl Board {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            config,
            state: Arc::new(SharedState::new()),
        }
    }

    /// Get shared state reference
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Run until `shutdown_signal` resolves, or until a connect failure
    /// when `fail_fast` is set. All tasks are stopped and joined either way.
    pub async fn run<R, F>(self, renderer: R, shutdown_signal: F) -> Result<BoardSummary, BoardError>
    where
        R: RenderSink + 'static,
        F: Future<Output = ()>,
    {
        let (updates_tx, updates_rx) = mpsc::channel(self.config.stream.channel_capacity);
        let (failures_tx, mut failures_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let workers: Vec<(Instrument, JoinHandle<WorkerExit>)> = Instrument::ALL
            .iter()
            .map(|&instrument| {
                let worker = StreamWorker::new(
                    instrument,
                    self.config.stream.clone(),
                    updates_tx.clone(),
                    failures_tx.clone(),
                );
                (instrument, tokio::spawn(worker.run(shutdown_rx.clone())))
            })
            .collect();
        // The supervisor keeps its own update sender so unavailable markers
        // reach the aggregator and the aggregator outlives every worker.
        drop(failures_tx);
        info!("Started {} stream workers", workers.len());

        let aggregator = Aggregator::new(Arc::clone(&self.state), updates_rx, renderer);
        let aggregator_handle = tokio::spawn(aggregator.run(shutdown_rx));

        tokio::pin!(shutdown_signal);
        let outcome = loop {
            tokio::select! {
                _ = &mut shutdown_signal => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                Some(failure) = failures_rx.recv() => {
                    if let Err(e) = self.handle_failure(failure, &updates_tx).await {
                        break Err(e);
                    }
                }
            }
        };

        let _ = shutdown_tx.send(true);
        drop(updates_tx);

        let aggregator_stats = aggregator_handle.await?;
        let (instruments, handles): (Vec<_>, Vec<_>) = workers.into_iter().unzip();
        let mut exits = Vec::with_capacity(instruments.len());
        for (instrument, result) in instruments.into_iter().zip(join_all(handles).await) {
            exits.push((instrument, result?));
        }

        outcome?;
        info!("Board stopped after {} updates", aggregator_stats.applied);

        Ok(BoardSummary {
            aggregator: aggregator_stats,
            workers: exits,
        })
    }

    async fn handle_failure(
        &self,
        failure: WorkerFailure,
        updates_tx: &mpsc::Sender<BoardUpdate>,
    ) -> Result<(), BoardError> {
        let instrument = failure.instrument;

        match failure.error {
            e @ FeedError::ConnectionFailed { .. } if self.config.fail_fast => {
                error!("Cannot start {} stream, stopping: {}", instrument, e);
                Err(e.into())
            }
            e @ FeedError::ConnectionFailed { .. } => {
                warn!("Marking {} unavailable: {}", instrument, e);
                let update = BoardUpdate::Unavailable {
                    instrument,
                    reason: e.to_string(),
                };
                if updates_tx.send(update).await.is_err() {
                    debug!("Aggregator gone, dropping unavailable marker for {}", instrument);
                }
                Ok(())
            }
            // Already logged by the worker
            e => {
                debug!("Stream for {} ended: {}", instrument, e);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;
    use tickerboard_core::{RenderConfig, StreamConfig};
    use std::sync::Mutex;
    use tickerboard_render::{render_table, ConsoleRenderer};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    const BTC_FRAME: &str = r#"{"e":"24hrTicker","E":1700000000000,"s":"BTCUSDT","p":"120.10","P":"0.20","w":"61000.00","x":"61114.40","c":"61234.50","Q":"0.01","b":"61234.00","B":"1.5","a":"61235.00","A":"2.0","C":1700000000000}"#;

    fn config(url_template: String, fail_fast: bool) -> BoardConfig {
        BoardConfig {
            stream: StreamConfig {
                url_template,
                connect_attempts: 1,
                base_delay_ms: 10,
                max_delay_ms: 10,
                channel_capacity: 8,
            },
            fail_fast,
            ..Default::default()
        }
    }

    fn quiet_renderer() -> ConsoleRenderer<Vec<u8>> {
        ConsoleRenderer::new(Vec::new(), &RenderConfig { clear_screen: false })
    }

    async fn closed_port_template() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("ws://{}/ws/{{symbol}}@ticker", addr)
    }

    /// Keeps every rendered table as plain text
    #[derive(Clone, Default)]
    struct CapturedFrames(Arc<Mutex<Vec<String>>>);

    impl CapturedFrames {
        fn unavailable_rows(&self) -> Vec<usize> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|table| table.lines().filter(|l| l.ends_with("| unavailable")).count())
                .collect()
        }
    }

    impl RenderSink for CapturedFrames {
        fn render(&mut self, state: &SharedState) -> std::io::Result<()> {
            let table = render_table(&mut state.lock(), &Instrument::ALL);
            self.0.lock().unwrap().push(table);
            Ok(())
        }
    }

    async fn wait_until(state: Arc<SharedState>, done: impl Fn(&SharedState) -> bool) {
        while !done(&state) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_fail_fast_stops_on_connect_failure() {
        let board = Board::new(config(closed_port_template().await, true));

        let result = board.run(quiet_renderer(), std::future::pending()).await;

        assert!(matches!(
            result,
            Err(BoardError::Feed(FeedError::ConnectionFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_connect_failures_mark_rows_unavailable() {
        let board = Board::new(config(closed_port_template().await, false));
        let state = board.state();
        let signal = wait_until(Arc::clone(&state), |s| {
            s.stats().unavailable_count == Instrument::ALL.len()
        });

        let summary = board.run(quiet_renderer(), signal).await.unwrap();

        assert_eq!(summary.workers.len(), Instrument::ALL.len());
        assert!(summary
            .workers
            .iter()
            .all(|(_, exit)| *exit == WorkerExit::ConnectFailed));
        assert_eq!(state.stats().unavailable_count, Instrument::ALL.len());
    }

    #[tokio::test]
    async fn test_unavailable_rows_are_rendered_and_board_keeps_running() {
        let board = Board::new(config(closed_port_template().await, false));
        let frames = CapturedFrames::default();
        let watched = frames.clone();
        let signal = async move {
            while watched.unavailable_rows().last() != Some(&Instrument::ALL.len()) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };

        let summary = tokio::time::timeout(Duration::from_secs(10), board.run(frames.clone(), signal))
            .await
            .expect("board should render every row unavailable")
            .unwrap();

        // The aggregator redrew once per marker and stopped only on shutdown
        assert_eq!(summary.aggregator.marked_unavailable, Instrument::ALL.len() as u64);
        assert_eq!(summary.aggregator.renders, 1 + Instrument::ALL.len() as u64);

        let counts = frames.unavailable_rows();
        assert_eq!(counts.first(), Some(&0));
        assert_eq!(counts.last(), Some(&Instrument::ALL.len()));

        let frames = frames.0.lock().unwrap();
        let last = frames.last().unwrap();
        assert!(last.contains("BTCUSDT    | unavailable"));
        assert!(last.contains("ADAUSDT    | unavailable"));
    }

    #[tokio::test]
    async fn test_read_failure_is_not_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let dropped = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&dropped);
        let server = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                // Handshake, then vanish without a close frame
                if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                    drop(ws);
                }
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        });

        let board = Board::new(config(format!("ws://{}/ws/{{symbol}}@ticker", addr), true));
        let state = board.state();
        let signal = async move {
            while dropped.load(std::sync::atomic::Ordering::SeqCst) < Instrument::ALL.len() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        };

        let summary = board.run(quiet_renderer(), signal).await.unwrap();
        server.abort();

        assert!(summary.workers.iter().all(|(_, exit)| *exit != WorkerExit::ConnectFailed));
        assert_eq!(summary.aggregator.marked_unavailable, 0);
        assert_eq!(state.stats().unavailable_count, 0);
    }

    #[tokio::test]
    async fn test_updates_flow_to_state_and_stop_on_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    if ws.send(Message::Text(BTC_FRAME.to_string())).await.is_err() {
                        return;
                    }
                    while let Some(Ok(_)) = ws.next().await {}
                });
            }
        });

        let board = Board::new(config(format!("ws://{}/ws/{{symbol}}@ticker", addr), true));
        let state = board.state();
        let signal = wait_until(Arc::clone(&state), |s| {
            s.stats().update_count == Instrument::ALL.len() as u64
        });

        let summary = board.run(quiet_renderer(), signal).await.unwrap();
        server.abort();

        assert_eq!(summary.aggregator.applied, Instrument::ALL.len() as u64);
        assert!(summary
            .workers
            .iter()
            .all(|(_, exit)| *exit == WorkerExit::Cancelled));
        assert_eq!(
            state.snapshot(Instrument::BtcUsdt).unwrap().last_price,
            "61234.50"
        );
        assert_eq!(state.stats().instrument_count, 1);
    }
}
