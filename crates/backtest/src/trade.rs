use serde::{Deserialize, Serialize};

use common::{Candle, Position, TradeSignal};
use policy::PolicyEngine;

/// Why a simulated trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    /// Still open when the history ran out; closed at the final close.
    EndOfData,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop-loss"),
            ExitReason::TakeProfit => write!(f, "take-profit"),
            ExitReason::EndOfData => write!(f, "end-of-data"),
        }
    }
}

/// A simulated position waiting for its stop or target.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub strategy_name: String,
    pub position: Position,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
    /// Timestamp of the candle whose close produced the entry.
    pub opened_at: i64,
}

/// A finished trade. Never modified once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub strategy_name: String,
    pub position: Position,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub exit_price: f64,
    pub position_size: f64,
    pub opened_at: i64,
    pub closed_at: i64,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    /// Per-unit price PnL; position size and costs are not applied.
    pub fn pnl(&self) -> f64 {
        match self.position {
            Position::Long => self.exit_price - self.entry_price,
            Position::Short => self.entry_price - self.exit_price,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl() > 0.0
    }
}

impl OpenTrade {
    pub fn from_signal(signal: &TradeSignal, opened_at: i64) -> Self {
        Self {
            strategy_name: signal.strategy_name.clone(),
            position: signal.position,
            entry_price: signal.entry_price,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            position_size: signal.position_size,
            opened_at,
        }
    }

    /// Check `candle` for a stop or target fill. The stop is checked first,
    /// so a candle spanning both levels exits at the stop.
    pub fn check_exit(&self, candle: &Candle) -> Option<ClosedTrade> {
        let (stop_hit, target_hit) = match self.position {
            Position::Long => (candle.low() <= self.stop_loss, candle.high() >= self.take_profit),
            Position::Short => (candle.high() >= self.stop_loss, candle.low() <= self.take_profit),
        };

        if stop_hit {
            Some(self.close(self.stop_loss, candle.timestamp(), ExitReason::StopLoss))
        } else if target_hit {
            Some(self.close(self.take_profit, candle.timestamp(), ExitReason::TakeProfit))
        } else {
            None
        }
    }

    /// Force-close at `candle`'s close.
    pub fn liquidate(self, candle: &Candle) -> ClosedTrade {
        self.close(candle.close(), candle.timestamp(), ExitReason::EndOfData)
    }

    fn close(&self, exit_price: f64, closed_at: i64, exit_reason: ExitReason) -> ClosedTrade {
        ClosedTrade {
            strategy_name: self.strategy_name.clone(),
            position: self.position,
            entry_price: self.entry_price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            exit_price,
            position_size: self.position_size,
            opened_at: self.opened_at,
            closed_at,
            exit_reason,
        }
    }
}

/// Replay state: flat, or holding exactly one trade.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TradeState {
    #[default]
    Idle,
    Open(OpenTrade),
}

/// Advance the replay by one candle.
///
/// `window` is the history up to and including the current candle (its last
/// element). An open trade is first checked against the current candle; if
/// the book is flat afterwards, the policy may open a new trade on the same
/// candle. A trade opened here is only checked for exits from the next step.
///
/// Returns the next state and the trade closed during this step, if any.
pub fn step(state: TradeState, window: &[Candle], policy: &PolicyEngine) -> (TradeState, Option<ClosedTrade>) {
    let Some(current) = window.last() else {
        return (state, None);
    };

    let (state, closed) = match state {
        TradeState::Open(trade) => match trade.check_exit(current) {
            Some(closed) => (TradeState::Idle, Some(closed)),
            None => (TradeState::Open(trade), None),
        },
        TradeState::Idle => (TradeState::Idle, None),
    };

    let state = match state {
        TradeState::Idle => match policy.decide(window) {
            Some(signal) => TradeState::Open(OpenTrade::from_signal(&signal, current.timestamp())),
            None => TradeState::Idle,
        },
        open => open,
    };

    (state, closed)
}
