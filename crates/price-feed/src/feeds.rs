//! Per-instrument WebSocket ticker streams

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use tickerboard_core::{
    FeedError, FeedResult, Instrument, StreamConfig, TickerEvent, TickerSnapshot,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A worker-scoped failure, reported to the supervisor
#[derive(Debug)]
pub struct WorkerFailure {
    pub instrument: Instrument,
    pub error: FeedError,
}

/// Message carried by the update channel
#[derive(Debug, Clone, PartialEq)]
pub enum BoardUpdate {
    Ticker(TickerSnapshot),
    /// Worker gave up connecting; the row is shown as unavailable
    Unavailable { instrument: Instrument, reason: String },
}

impl BoardUpdate {
    pub fn instrument(&self) -> Instrument {
        match self {
            BoardUpdate::Ticker(snapshot) => snapshot.instrument,
            BoardUpdate::Unavailable { instrument, .. } => *instrument,
        }
    }
}

impl From<TickerSnapshot> for BoardUpdate {
    fn from(snapshot: TickerSnapshot) -> Self {
        BoardUpdate::Ticker(snapshot)
    }
}

/// Why a worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    ConnectFailed,
    ReadFailed,
    Disconnected,
    ChannelClosed,
    Cancelled,
}

/// Decode one text frame into a normalized snapshot
pub fn decode_frame(text: &str) -> FeedResult<TickerSnapshot> {
    let event: TickerEvent = serde_json::from_str(text)?;
    TickerSnapshot::try_from(event)
}

/// Owns one upstream connection for one instrument
pub struct StreamWorker {
    instrument: Instrument,
    config: StreamConfig,
    updates_tx: mpsc::Sender<BoardUpdate>,
    failures_tx: mpsc::UnboundedSender<WorkerFailure>,
}

impl StreamWorker {
    pub fn new(
        instrument: Instrument,
        config: StreamConfig,
        updates_tx: mpsc::Sender<BoardUpdate>,
        failures_tx: mpsc::UnboundedSender<WorkerFailure>,
    ) -> Self {
        Self {
            instrument,
            config,
            updates_tx,
            failures_tx,
        }
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> WorkerExit {
        if *shutdown.borrow() {
            return WorkerExit::Cancelled;
        }

        let ws_stream = match self.connect(&mut shutdown).await {
            Ok(Some(ws)) => ws,
            Ok(None) => return WorkerExit::Cancelled,
            Err(e) => {
                error!("{}", e);
                self.report(e);
                return WorkerExit::ConnectFailed;
            }
        };

        let exit = self.listen(ws_stream, &mut shutdown).await;
        info!(instrument = %self.instrument, exit = ?exit, "Stream worker stopped");
        exit
    }

    /// Connect with exponential backoff. `Ok(None)` means shutdown won the race.
    async fn connect(&self, shutdown: &mut watch::Receiver<bool>) -> FeedResult<Option<WsStream>> {
        let url = self.config.endpoint_for(self.instrument);
        let max_attempts = self.config.connect_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!("Connecting to {} at {} (attempt {}/{})", self.instrument, url, attempt, max_attempts);

            let result = tokio::select! {
                result = connect_async(url.as_str()) => result,
                _ = shutdown.changed() => return Ok(None),
            };

            match result {
                Ok((ws_stream, _)) => {
                    info!("Connected to {}", self.instrument);
                    return Ok(Some(ws_stream));
                }
                Err(e) if attempt >= max_attempts => {
                    return Err(FeedError::ConnectionFailed {
                        instrument: self.instrument,
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = self.config.backoff_delay(attempt);
                    warn!(
                        "Connecting {} failed: {}. Retrying in {:?} (attempt {}/{})",
                        self.instrument, e, delay, attempt, max_attempts
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shutdown.changed() => return Ok(None),
                    }
                }
            }
        }
    }

    async fn listen(&self, ws_stream: WsStream, shutdown: &mut watch::Receiver<bool>) -> WorkerExit {
        let (mut write, mut read) = ws_stream.split();

        loop {
            let msg = tokio::select! {
                msg = read.next() => msg,
                _ = shutdown.changed() => {
                    let _ = write.send(Message::Close(None)).await;
                    return WorkerExit::Cancelled;
                }
            };

            match msg {
                Some(Ok(Message::Text(text))) => match decode_frame(&text) {
                    Ok(snapshot) => {
                        debug!(instrument = %snapshot.instrument, last = %snapshot.last_price, "Decoded ticker");
                        // Blocks while the channel is full
                        if self.updates_tx.send(snapshot.into()).await.is_err() {
                            debug!("Updates channel closed");
                            return WorkerExit::ChannelClosed;
                        }
                    }
                    Err(e) => {
                        warn!("Skipping frame from {}: {}", self.instrument, e);
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = write.send(Message::Pong(data)).await {
                        return self.read_failed(e.to_string());
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    info!("WebSocket for {} closed by server", self.instrument);
                    return WorkerExit::Disconnected;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return self.read_failed(e.to_string());
                }
                None => return WorkerExit::Disconnected,
            }
        }
    }

    fn read_failed(&self, reason: String) -> WorkerExit {
        let e = FeedError::ReadFailed {
            instrument: self.instrument,
            reason,
        };
        error!("{}", e);
        self.report(e);
        WorkerExit::ReadFailed
    }

    fn report(&self, error: FeedError) {
        let failure = WorkerFailure {
            instrument: self.instrument,
            error,
        };
        if self.failures_tx.send(failure).is_err() {
            debug!("Failure channel closed");
        }
    }
}
