use common::{Candle, TradeSetup};

use super::{average_volume, resistance, support, tail};
use crate::Strategy;

/// Range breakout confirmed by a volume surge.
///
/// The range is every candle of the lookback except the last. A close above
/// the range high (or below the range low) on volume above
/// `volume_multiplier` × the range's average volume enters in the breakout
/// direction, stops at the broken level and targets one range-height beyond
/// the entry.
#[derive(Debug, Clone)]
pub struct RangeBreak {
    name: String,
    pub lookback: usize,
    pub volume_multiplier: f64,
}

impl RangeBreak {
    pub const NAME: &'static str = "Range Break";
    pub const DEFAULT_LOOKBACK: usize = 20;
    pub const DEFAULT_VOLUME_MULTIPLIER: f64 = 1.5;

    pub fn new(name: impl Into<String>, lookback: usize, volume_multiplier: f64) -> Self {
        Self {
            name: name.into(),
            lookback: lookback.max(2),
            volume_multiplier,
        }
    }
}

impl Default for RangeBreak {
    fn default() -> Self {
        Self::new(Self::NAME, Self::DEFAULT_LOOKBACK, Self::DEFAULT_VOLUME_MULTIPLIER)
    }
}

impl Strategy for RangeBreak {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn analyze(&self, window: &[Candle]) -> Option<TradeSetup> {
        let window = tail(window, self.lookback)?;
        let (last, range) = window.split_last()?;

        let high = resistance(range);
        let low = support(range);
        let height = high - low;

        let volume_surge = last.volume() as f64 > average_volume(range) * self.volume_multiplier;
        if !volume_surge {
            return None;
        }

        let entry = last.close();
        if entry > high {
            Some(TradeSetup::long(entry, high, entry + height))
        } else if entry < low {
            Some(TradeSetup::short(entry, low, entry - height))
        } else {
            None
        }
    }
}
