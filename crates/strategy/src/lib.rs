pub mod config;
pub mod patterns;
pub mod registry;

pub use config::{StrategyConfig, StrategyFileConfig};
pub use patterns::{FailedBreakout, RangeBreak, SecondChanceScalp};
pub use registry::StrategyRegistry;

use common::{Candle, TradeSetup};

/// All strategy implementations must satisfy this trait.
///
/// A strategy is a pure function of the window it is given: same window, same
/// answer, and the window is never modified.
pub trait Strategy: Send + Sync {
    /// Human-readable name, stamped onto every signal this strategy produces.
    fn name(&self) -> &str;

    /// Minimum number of candles `analyze` needs. The strategy evaluates the
    /// last `lookback()` candles of whatever window it receives.
    fn lookback(&self) -> usize;

    /// Evaluate the window (oldest first) and optionally propose a trade.
    ///
    /// Returns `None` when there is no pattern, including when the window is
    /// shorter than `lookback()`.
    fn analyze(&self, window: &[Candle]) -> Option<TradeSetup>;
}
