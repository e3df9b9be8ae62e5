use serde::Serialize;
use tracing::{debug, info, warn};

use common::Candle;
use policy::{PolicyEngine, RiskConfig};
use strategy::StrategyRegistry;

use crate::report::PerformanceReport;
use crate::trade::{step, ClosedTrade, TradeState};

/// Replays one symbol's history through a [`PolicyEngine`], one candle at a
/// time, holding at most one simulated trade.
///
/// Each step sees only the candles up to and including the current one. The
/// first step is at index `warmup`, so the first decision already has
/// `warmup + 1` candles of history.
#[derive(Debug, Clone)]
pub struct Backtester<'a> {
    policy: &'a PolicyEngine,
    warmup: usize,
}

impl<'a> Backtester<'a> {
    /// Backtester whose warm-up is the policy's largest strategy lookback.
    pub fn new(policy: &'a PolicyEngine) -> Self {
        Self {
            policy,
            warmup: policy.max_lookback(),
        }
    }

    pub fn with_warmup(policy: &'a PolicyEngine, warmup: usize) -> Self {
        Self { policy, warmup }
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    /// Run the replay and return the closed-trade log in closing order.
    ///
    /// A trade still open after the last candle is closed at that candle's
    /// close. Histories no longer than the warm-up produce an empty log.
    pub fn run(&self, candles: &[Candle]) -> Vec<ClosedTrade> {
        let mut trades = Vec::new();

        if candles.len() <= self.warmup {
            warn!(
                candles = candles.len(),
                required = self.warmup + 1,
                "Not enough historical data to run backtest"
            );
            return trades;
        }

        let mut state = TradeState::Idle;
        for i in self.warmup..candles.len() {
            let was_open = matches!(state, TradeState::Open(_));
            let (next, closed) = step(state, &candles[..=i], self.policy);
            let exited = closed.is_some();
            if let Some(trade) = closed {
                debug!(
                    strategy = %trade.strategy_name,
                    reason = %trade.exit_reason,
                    exit = trade.exit_price,
                    pnl = trade.pnl(),
                    "Trade closed"
                );
                trades.push(trade);
            }
            if let TradeState::Open(opened) = &next {
                if !was_open || exited {
                    debug!(
                        strategy = %opened.strategy_name,
                        position = %opened.position,
                        entry = opened.entry_price,
                        stop = opened.stop_loss,
                        target = opened.take_profit,
                        "Trade opened"
                    );
                }
            }
            state = next;
        }

        if let (TradeState::Open(trade), Some(last)) = (state, candles.last()) {
            let closed = trade.liquidate(last);
            debug!(strategy = %closed.strategy_name, exit = closed.exit_price, "Open trade liquidated at end of data");
            trades.push(closed);
        }

        trades
    }

    /// Run the replay and summarise it under `label`.
    pub fn report(&self, label: &str, candles: &[Candle]) -> BacktestRun {
        let trades = self.run(candles);
        let report = PerformanceReport::from_trades(label, &trades);
        info!(
            run = %label,
            trades = report.total_trades,
            net_pnl = report.net_pnl,
            "Backtest complete"
        );
        BacktestRun { report, trades }
    }
}

/// One labelled replay: the closed-trade log and its summary.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestRun {
    pub report: PerformanceReport,
    pub trades: Vec<ClosedTrade>,
}

/// Replay `candles` once per registered strategy (each strategy on its own)
/// and once for the full priority policy.
///
/// Every run uses the same warm-up, the registry's largest lookback, so the
/// per-strategy runs and the combined run start deciding on the same candle.
pub fn run_backtests(candles: &[Candle], registry: &StrategyRegistry, risk: RiskConfig) -> Vec<BacktestRun> {
    let warmup = registry.max_lookback();
    let mut runs = Vec::with_capacity(registry.len() + 1);

    for single in registry.split() {
        let label = single.names().join(", ");
        info!(strategy = %label, "Running backtest");
        let policy = PolicyEngine::new(single, risk);
        runs.push(Backtester::with_warmup(&policy, warmup).report(&label, candles));
    }

    if registry.len() > 1 {
        let label = "Policy Engine".to_string();
        info!(strategies = ?registry.names(), "Running backtest for full policy");
        let policy = PolicyEngine::new(registry.clone(), risk);
        runs.push(Backtester::with_warmup(&policy, warmup).report(&label, candles));
    }

    runs
}
