use common::{Candle, TradeSetup};

use super::{resistance, tail};
use crate::Strategy;

/// Range -> breakout -> retest -> confirmation.
///
/// The breakout candle closes above the range high, the retest candle dips to
/// (or through) that level but closes above it, and the confirmation candle
/// closes green. Enters long at the confirmation close with the stop at the
/// old resistance and a target `reward_ratio` times the risk away.
#[derive(Debug, Clone)]
pub struct SecondChanceScalp {
    name: String,
    /// Candles in the range before the three-candle pattern.
    pub range: usize,
    pub reward_ratio: f64,
}

impl SecondChanceScalp {
    pub const NAME: &'static str = "Second Chance Scalp";
    pub const DEFAULT_RANGE: usize = 20;
    pub const DEFAULT_REWARD_RATIO: f64 = 2.0;
    const PATTERN_LEN: usize = 3;

    pub fn new(name: impl Into<String>, range: usize, reward_ratio: f64) -> Self {
        Self {
            name: name.into(),
            range: range.max(1),
            reward_ratio,
        }
    }
}

impl Default for SecondChanceScalp {
    fn default() -> Self {
        Self::new(Self::NAME, Self::DEFAULT_RANGE, Self::DEFAULT_REWARD_RATIO)
    }
}

impl Strategy for SecondChanceScalp {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.range + Self::PATTERN_LEN
    }

    fn analyze(&self, window: &[Candle]) -> Option<TradeSetup> {
        let window = tail(window, self.lookback())?;
        let (range, pattern) = window.split_at(self.range);
        let (breakout, retest, confirmation) = (&pattern[0], &pattern[1], &pattern[2]);

        let level = resistance(range);

        if breakout.close() <= level {
            return None;
        }
        let retest_held = retest.low() <= level && retest.close() > level;
        if !retest_held {
            return None;
        }
        if !confirmation.is_bullish() {
            return None;
        }

        let entry = confirmation.close();
        Some(TradeSetup::long(entry, level, entry + (entry - level) * self.reward_ratio))
    }
}
