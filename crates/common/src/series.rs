use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::{Candle, Error, Result};

/// Bounded, strictly time-ordered candle history for one symbol.
///
/// Holds at most `capacity` candles; appending past capacity evicts the
/// oldest. Timestamps are strictly increasing front to back.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleSeries {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config("candle series capacity must be at least 1".into()));
        }
        Ok(Self {
            candles: VecDeque::new(),
            capacity,
        })
    }

    /// Append a candle. Returns `false` (and stores nothing) if the candle
    /// does not advance past the last stored timestamp.
    pub fn append(&mut self, candle: Candle) -> bool {
        if let Some(last) = self.candles.back() {
            if candle.timestamp() <= last.timestamp() {
                debug!(
                    timestamp = candle.timestamp(),
                    last = last.timestamp(),
                    "Dropping stale candle"
                );
                return false;
            }
        }
        if self.candles.len() == self.capacity {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
        true
    }

    /// The last `n` candles, oldest first.
    pub fn window(&self, n: usize) -> Result<Vec<Candle>> {
        let available = self.candles.len();
        if n > available {
            return Err(Error::InsufficientHistory { needed: n, available });
        }
        Ok(self.candles.iter().skip(available - n).copied().collect())
    }

    /// Every stored candle, oldest first.
    pub fn snapshot(&self) -> Vec<Candle> {
        self.candles.iter().copied().collect()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }
}

/// Per-symbol candle histories, all sharing one capacity.
///
/// Owned by a single writer; readers get copies via [`CandleSeries::snapshot`].
#[derive(Debug, Clone)]
pub struct HistoryStore {
    series: HashMap<String, CandleSeries>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Result<Self> {
        // Validate once up front so lazily created series cannot fail.
        CandleSeries::new(capacity)?;
        Ok(Self {
            series: HashMap::new(),
            capacity,
        })
    }

    /// Append a candle to `symbol`'s series, creating the series on first use.
    pub fn append(&mut self, symbol: &str, candle: Candle) -> bool {
        let capacity = self.capacity;
        self.series
            .entry(symbol.to_string())
            .or_insert_with(|| CandleSeries {
                candles: VecDeque::new(),
                capacity,
            })
            .append(candle)
    }

    pub fn series(&self, symbol: &str) -> Option<&CandleSeries> {
        self.series.get(symbol)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
