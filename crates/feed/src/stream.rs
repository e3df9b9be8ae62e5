use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use common::{CandleUpdate, Error, Result};

use crate::message::decode_message;

/// Market-data WebSocket client.
///
/// Connects to the feed, decodes `candle_update` frames and forwards each
/// per-symbol candle on an mpsc channel. Reconnects with exponential backoff
/// until the receiving side goes away.
pub struct FeedStream {
    url: String,
    update_tx: mpsc::Sender<CandleUpdate>,
}

/// How a single connection ended without an error.
enum Closed {
    /// The server closed the socket.
    Server,
    /// Nobody is listening for updates any more.
    Receiver,
}

impl FeedStream {
    pub fn new(url: impl Into<String>, update_tx: mpsc::Sender<CandleUpdate>) -> Self {
        Self {
            url: url.into(),
            update_tx,
        }
    }

    /// Run the stream loop, reconnecting on failure. Returns once the update
    /// receiver has been dropped. Call this inside a `tokio::spawn`.
    pub async fn run(self) {
        let mut backoff = Backoff::default();

        loop {
            info!(url = %self.url, "Connecting to market data feed");
            match self.connect_once().await {
                Ok(Closed::Receiver) => {
                    info!(url = %self.url, "Update receiver dropped, stopping feed");
                    return;
                }
                Ok(Closed::Server) => {
                    info!(url = %self.url, "Feed closed cleanly");
                    backoff.reset();
                    tokio::time::sleep(Backoff::INITIAL).await;
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(url = %self.url, error = %e, backoff = ?delay, "Feed error, reconnecting");
                    tokio::time::sleep(delay).await;
                }
            }

            if self.update_tx.is_closed() {
                info!(url = %self.url, "Update receiver dropped, stopping feed");
                return;
            }
        }
    }

    async fn connect_once(&self) -> Result<Closed> {
        let url = Url::parse(&self.url).map_err(|e| Error::WebSocket(e.to_string()))?;

        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        info!(url = %self.url, "Connected to market data feed");

        let (_, mut read) = ws_stream.split();

        while let Some(msg) = read.next().await {
            let msg = msg.map_err(|e| Error::WebSocket(e.to_string()))?;

            let Message::Text(text) = msg else {
                continue;
            };

            let entries = match decode_message(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "Failed to decode feed message");
                    continue;
                }
            };

            for entry in entries {
                match entry {
                    Ok(update) => {
                        debug!(symbol = %update.symbol, timestamp = update.candle.timestamp(), "Candle received");
                        if self.update_tx.send(update).await.is_err() {
                            return Ok(Closed::Receiver);
                        }
                    }
                    Err(e) => warn!(error = %e, "Dropping malformed candle update"),
                }
            }
        }

        Ok(Closed::Server)
    }
}

/// Reconnect delay that doubles after every failure, capped at
/// [`Backoff::MAX`].
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
}

impl Backoff {
    pub const INITIAL: Duration = Duration::from_secs(1);
    pub const MAX: Duration = Duration::from_secs(60);

    /// Delay to wait now; the following call returns twice as much.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(Self::MAX);
        delay
    }

    pub fn reset(&mut self) {
        self.current = Self::INITIAL;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self { current: Self::INITIAL }
    }
}
