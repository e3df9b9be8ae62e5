use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use common::{CandleUpdate, Error, HistoryStore, Result, TradeSignal};
use policy::PolicyEngine;

/// Live decision loop: keeps a bounded candle history per symbol and asks
/// the policy for a signal after every accepted candle.
pub struct SignalSession {
    history: HistoryStore,
    policy: PolicyEngine,
}

impl SignalSession {
    /// `capacity` must hold at least the policy's largest lookback, otherwise
    /// some strategies could never fire.
    pub fn new(policy: PolicyEngine, capacity: usize) -> Result<Self> {
        let needed = policy.max_lookback();
        if capacity < needed {
            return Err(Error::Config(format!(
                "history capacity {capacity} is smaller than the largest strategy lookback {needed}"
            )));
        }
        Ok(Self {
            history: HistoryStore::new(capacity)?,
            policy,
        })
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    /// Record `update` and evaluate the symbol's history.
    ///
    /// Candles that do not advance the symbol's clock are dropped and never
    /// produce a signal.
    pub fn on_update(&mut self, update: CandleUpdate) -> Option<TradeSignal> {
        let CandleUpdate { symbol, candle } = update;
        let timestamp = candle.timestamp();

        if !self.history.append(&symbol, candle) {
            warn!(symbol = %symbol, timestamp, "Dropping stale candle");
            return None;
        }

        let series = self.history.series(&symbol)?;
        debug!(symbol = %symbol, candles = series.len(), "Evaluating history");

        let window = series.snapshot();
        let signal = self.policy.decide_for(&symbol, &window)?;
        info!(
            symbol = %symbol,
            strategy = %signal.strategy_name,
            position = %signal.position,
            entry = signal.entry_price,
            stop = signal.stop_loss,
            target = signal.take_profit,
            size = signal.position_size,
            "Trade signal"
        );
        Some(signal)
    }

    /// Consume updates until the feed ends or the signal receiver is dropped.
    pub async fn run(mut self, mut update_rx: mpsc::Receiver<CandleUpdate>, signal_tx: mpsc::Sender<TradeSignal>) {
        info!(
            strategies = ?self.policy.registry().names(),
            capacity = self.history.capacity(),
            "Signal session started"
        );

        while let Some(update) = update_rx.recv().await {
            let Some(signal) = self.on_update(update) else {
                continue;
            };
            if signal_tx.send(signal).await.is_err() {
                info!("Signal receiver dropped, stopping session");
                return;
            }
        }

        info!(symbols = self.history.len(), "Feed ended, stopping session");
    }
}
