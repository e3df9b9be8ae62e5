use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One OHLCV bar. Fields are private so the price invariants checked in
/// [`Candle::new`] hold for every value in circulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    /// Bar timestamp in epoch milliseconds.
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl Candle {
    /// Build a candle, rejecting non-finite prices and bars whose high/low do
    /// not bracket the open and close.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Result<Self> {
        if ![open, high, low, close].iter().all(|p| p.is_finite()) {
            return Err(Error::Data(format!(
                "candle at {timestamp} has a non-finite price (o={open} h={high} l={low} c={close})"
            )));
        }
        if high < open.max(close) {
            return Err(Error::Data(format!(
                "candle at {timestamp}: high {high} is below max(open, close) {}",
                open.max(close)
            )));
        }
        if low > open.min(close) {
            return Err(Error::Data(format!(
                "candle at {timestamp}: low {low} is above min(open, close) {}",
                open.min(close)
            )));
        }
        Ok(Self { timestamp, open, high, low, close, volume })
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> u64 {
        self.volume
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Raw OHLCV fields as they arrive from a feed or file, before validation.
#[derive(Debug, Clone, Copy, Deserialize)]
struct RawCandle {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl<'de> Deserialize<'de> for Candle {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawCandle::deserialize(deserializer)?;
        Candle::new(raw.timestamp, raw.open, raw.high, raw.low, raw.close, raw.volume)
            .map_err(serde::de::Error::custom)
    }
}

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Long,
    Short,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Long => write!(f, "LONG"),
            Position::Short => write!(f, "SHORT"),
        }
    }
}

/// Price levels proposed by a strategy, before the policy sizes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSetup {
    pub position: Position,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl TradeSetup {
    pub fn long(entry_price: f64, stop_loss: f64, take_profit: f64) -> Self {
        Self { position: Position::Long, entry_price, stop_loss, take_profit }
    }

    pub fn short(entry_price: f64, stop_loss: f64, take_profit: f64) -> Self {
        Self { position: Position::Short, entry_price, stop_loss, take_profit }
    }

    /// Price distance between entry and stop.
    pub fn risk_per_unit(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }
}

/// A sized, attributed signal emitted by the policy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub strategy_name: String,
    pub position: Position,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
}

impl TradeSignal {
    pub fn from_setup(setup: TradeSetup, strategy_name: impl Into<String>, position_size: f64) -> Self {
        Self {
            symbol: None,
            strategy_name: strategy_name.into(),
            position: setup.position,
            entry_price: setup.entry_price,
            stop_loss: setup.stop_loss,
            take_profit: setup.take_profit,
            position_size,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }
}

impl std::fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SCALP SIGNAL [{}] for {}: {} | Entry: {} | Stop: {} | Take Profit: {} | Position Size: {}",
            self.strategy_name,
            self.symbol.as_deref().unwrap_or("-"),
            self.position,
            self.entry_price,
            self.stop_loss,
            self.take_profit,
            self.position_size,
        )
    }
}

/// One per-symbol bar delivered by a live feed.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleUpdate {
    pub symbol: String,
    pub candle: Candle,
}
