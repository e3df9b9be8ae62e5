use common::{Candle, TradeSetup};
use policy::{PolicyEngine, RiskConfig};
use proptest::prelude::*;

fn candle(ts: i64, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Candle {
    Candle::new(ts, open, high, low, close, volume).unwrap()
}

proptest! {
    /// Sizing on randomized prices never panics and always risks exactly the
    /// configured amount.
    #[test]
    fn sizing_risks_exactly_the_configured_amount(
        entry in 0.0001f64..1_000_000.0f64,
        offset in 0.0001f64..10_000.0f64,
        account in 1_000.0f64..10_000_000.0f64,
        fraction in 0.001f64..0.1f64,
        long in any::<bool>(),
    ) {
        let risk = RiskConfig::new(account, fraction).unwrap();
        let setup = if long {
            TradeSetup::long(entry, entry - offset, entry + offset)
        } else {
            TradeSetup::short(entry, entry + offset, entry - offset)
        };
        if let Some(size) = risk.position_size(&setup) {
            let risked = size * setup.risk_per_unit();
            prop_assert!((risked - risk.risk_amount()).abs() <= risk.risk_amount() * 1e-9);
        }
    }

    /// The reference policy on arbitrary well-formed candles must never panic,
    /// and any signal it returns is sized and attributed.
    #[test]
    fn reference_policy_never_panics(
        bars in proptest::collection::vec(
            (1.0f64..1_000.0, 0.0f64..5.0, 0.0f64..5.0, -5.0f64..5.0, 0u64..100_000),
            0..40,
        ),
    ) {
        let window: Vec<Candle> = bars
            .iter()
            .enumerate()
            .map(|(i, &(open, up, down, delta, volume))| {
                let close = (open + delta).max(0.5);
                let high = open.max(close) + up;
                let low = open.min(close) - down;
                candle(i as i64, open, high, low, close, volume)
            })
            .collect();

        if let Some(signal) = PolicyEngine::reference().decide(&window) {
            prop_assert!(signal.position_size.is_finite() && signal.position_size > 0.0);
            prop_assert!(!signal.strategy_name.is_empty());
        }
    }
}
