use common::{Candle, TradeSetup};

use super::{resistance, support, tail};
use crate::Strategy;

/// Bearish failed breakout: a close above the range high immediately followed
/// by a close back below it. Shorts the failure with the stop above the
/// breakout candle's high and the range low as target.
///
/// Only the bearish case is traded.
#[derive(Debug, Clone)]
pub struct FailedBreakout {
    name: String,
    pub lookback: usize,
}

impl FailedBreakout {
    pub const NAME: &'static str = "Failed Breakout";
    pub const DEFAULT_LOOKBACK: usize = 20;

    pub fn new(name: impl Into<String>, lookback: usize) -> Self {
        Self {
            name: name.into(),
            lookback: lookback.max(3),
        }
    }
}

impl Default for FailedBreakout {
    fn default() -> Self {
        Self::new(Self::NAME, Self::DEFAULT_LOOKBACK)
    }
}

impl Strategy for FailedBreakout {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn analyze(&self, window: &[Candle]) -> Option<TradeSetup> {
        let window = tail(window, self.lookback)?;
        let (range, pattern) = window.split_at(window.len() - 2);
        let (breakout, failure) = (&pattern[0], &pattern[1]);

        let high = resistance(range);
        if breakout.close() <= high {
            return None;
        }
        if failure.close() >= high {
            return None;
        }

        Some(TradeSetup::short(failure.close(), breakout.high(), support(range)))
    }
}
