use tracing::debug;

use common::{Candle, TradeSignal};
use strategy::StrategyRegistry;

use crate::RiskConfig;

/// Turns a candle window into at most one sized trade signal.
///
/// Strategies are consulted in registry order and the first actionable setup
/// wins; later strategies are not evaluated. A setup whose stop equals its
/// entry cannot be sized and is passed over in favour of the next strategy.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    registry: StrategyRegistry,
    risk: RiskConfig,
}

impl PolicyEngine {
    pub fn new(registry: StrategyRegistry, risk: RiskConfig) -> Self {
        Self { registry, risk }
    }

    /// Reference registry with the reference sizing (100 000 account, 1% risk).
    pub fn reference() -> Self {
        Self::new(StrategyRegistry::reference(), RiskConfig::default())
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Largest strategy lookback, i.e. the history needed before every
    /// strategy can fire.
    pub fn max_lookback(&self) -> usize {
        self.registry.max_lookback()
    }

    /// Evaluate `window` (oldest first) and return the first sized signal.
    pub fn decide(&self, window: &[Candle]) -> Option<TradeSignal> {
        for strategy in self.registry.iter() {
            let Some(setup) = strategy.analyze(window) else {
                continue;
            };

            match self.risk.position_size(&setup) {
                Some(size) => {
                    debug!(
                        strategy = %strategy.name(),
                        position = %setup.position,
                        entry = setup.entry_price,
                        stop = setup.stop_loss,
                        size = size,
                        "Strategy fired"
                    );
                    return Some(TradeSignal::from_setup(setup, strategy.name(), size));
                }
                None => {
                    debug!(
                        strategy = %strategy.name(),
                        entry = setup.entry_price,
                        stop = setup.stop_loss,
                        "Skipping setup with no risk distance"
                    );
                }
            }
        }
        None
    }

    /// Like [`decide`](Self::decide), stamping `symbol` on the signal.
    pub fn decide_for(&self, symbol: &str, window: &[Candle]) -> Option<TradeSignal> {
        self.decide(window).map(|signal| signal.with_symbol(symbol))
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Position, TradeSetup};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use strategy::Strategy;

    /// Always proposes the same setup and counts how often it was asked.
    struct Fixed {
        name: &'static str,
        setup: Option<TradeSetup>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(name: &'static str, setup: Option<TradeSetup>) -> Arc<Self> {
            Arc::new(Self { name, setup, calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Strategy for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn lookback(&self) -> usize {
            1
        }

        fn analyze(&self, _window: &[Candle]) -> Option<TradeSetup> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.setup
        }
    }

    fn engine(strategies: Vec<Arc<dyn Strategy>>) -> PolicyEngine {
        PolicyEngine::new(StrategyRegistry::new(strategies), RiskConfig::default())
    }

    fn window() -> Vec<Candle> {
        vec![Candle::new(0, 100.0, 101.0, 99.0, 100.0, 10).unwrap()]
    }

    #[test]
    fn sizes_first_signal() {
        let first = Fixed::new("first", Some(TradeSetup::long(101.0, 100.0, 103.0)));
        let signal = engine(vec![first as Arc<dyn Strategy>]).decide(&window()).expect("signal expected");
        assert_eq!(signal.position_size, 1000.0);
        assert_eq!(signal.strategy_name, "first");
        assert!(signal.symbol.is_none());
    }

    #[test]
    fn earlier_strategy_wins_and_later_is_never_consulted() {
        let first = Fixed::new("first", Some(TradeSetup::long(101.0, 100.0, 103.0)));
        let second = Fixed::new("second", Some(TradeSetup::short(99.0, 101.0, 95.0)));
        let policy = engine(vec![first.clone() as Arc<dyn Strategy>, second.clone()]);

        let signal = policy.decide(&window()).expect("signal expected");
        assert_eq!(signal.strategy_name, "first");
        assert_eq!(signal.position, Position::Long);
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[test]
    fn zero_risk_setup_falls_through_to_next_strategy() {
        let degenerate = Fixed::new("degenerate", Some(TradeSetup::long(100.0, 100.0, 103.0)));
        let fallback = Fixed::new("fallback", Some(TradeSetup::short(99.0, 101.0, 95.0)));
        let signal = engine(vec![degenerate as Arc<dyn Strategy>, fallback])
            .decide(&window())
            .expect("signal expected");
        assert_eq!(signal.strategy_name, "fallback");
        assert_eq!(signal.position_size, 500.0);
    }

    #[test]
    fn no_strategy_fires_means_no_signal() {
        let quiet = Fixed::new("quiet", None);
        let degenerate = Fixed::new("degenerate", Some(TradeSetup::short(100.0, 100.0, 90.0)));
        assert!(engine(vec![quiet as Arc<dyn Strategy>, degenerate]).decide(&window()).is_none());
    }

    #[test]
    fn decide_for_stamps_symbol() {
        let first = Fixed::new("first", Some(TradeSetup::long(101.0, 100.0, 103.0)));
        let signal = engine(vec![first as Arc<dyn Strategy>]).decide_for("NIFTY", &window()).unwrap();
        assert_eq!(signal.symbol.as_deref(), Some("NIFTY"));
    }

    #[test]
    fn empty_window_yields_nothing_from_reference_policy() {
        assert!(PolicyEngine::reference().decide(&[]).is_none());
    }
}
