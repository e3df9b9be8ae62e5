use serde::Serialize;

use crate::trade::ClosedTrade;

/// Summary statistics over a closed-trade log.
///
/// PnL is per unit of price (`exit - entry` for longs, `entry - exit` for
/// shorts); position size and costs are not applied. A trade is a winner when
/// its PnL is strictly positive, every other trade counts as a loser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub strategy_name: String,
    pub total_trades: usize,
    pub winners: usize,
    pub losers: usize,
    pub net_pnl: f64,
    pub gross_profit: f64,
    /// Sum of negative PnLs, so never positive.
    pub gross_loss: f64,
    /// `gross_profit / |gross_loss|`; infinite when there are trades but no
    /// losses, `None` when there are no trades.
    pub profit_factor: Option<f64>,
    /// Percentage of winning trades; `None` when there are no trades.
    pub win_rate: Option<f64>,
    pub average_win: f64,
    pub average_loss: f64,
    pub max_consecutive_losses: usize,
    /// Deepest fall of cumulative PnL below its running peak (starting from
    /// zero), as a non-positive number.
    pub max_drawdown: f64,
}

impl PerformanceReport {
    pub fn from_trades(strategy_name: impl Into<String>, trades: &[ClosedTrade]) -> Self {
        let pnls: Vec<f64> = trades.iter().map(ClosedTrade::pnl).collect();

        let total_trades = pnls.len();
        let winners = pnls.iter().filter(|&&p| p > 0.0).count();
        let losers = total_trades - winners;

        let net_pnl: f64 = pnls.iter().sum();
        let gross_profit: f64 = pnls.iter().filter(|&&p| p > 0.0).sum();
        let gross_loss: f64 = pnls.iter().filter(|&&p| p < 0.0).sum();

        let (profit_factor, win_rate) = if total_trades == 0 {
            (None, None)
        } else {
            let pf = if gross_loss != 0.0 {
                gross_profit / gross_loss.abs()
            } else {
                f64::INFINITY
            };
            (Some(pf), Some(winners as f64 / total_trades as f64 * 100.0))
        };

        let average_win = if winners > 0 { gross_profit / winners as f64 } else { 0.0 };
        let average_loss = if losers > 0 { gross_loss / losers as f64 } else { 0.0 };

        Self {
            strategy_name: strategy_name.into(),
            total_trades,
            winners,
            losers,
            net_pnl,
            gross_profit,
            gross_loss,
            profit_factor,
            win_rate,
            average_win,
            average_loss,
            max_consecutive_losses: max_consecutive_losses(&pnls),
            max_drawdown: max_drawdown(&pnls),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_trades == 0
    }
}

fn max_consecutive_losses(pnls: &[f64]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for &pnl in pnls {
        if pnl > 0.0 {
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

fn max_drawdown(pnls: &[f64]) -> f64 {
    let mut equity = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for &pnl in pnls {
        equity += pnl;
        peak = peak.max(equity);
        max_dd = max_dd.min(equity - peak);
    }
    max_dd
}

impl std::fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- Backtest Performance Report ---")?;
        writeln!(f, "Strategy: {}", self.strategy_name)?;
        writeln!(f, "------------------------------------")?;

        let (Some(profit_factor), Some(win_rate)) = (self.profit_factor, self.win_rate) else {
            return writeln!(f, "No trades were executed.");
        };

        writeln!(f, "Total Trades: {}", self.total_trades)?;
        writeln!(f, "Net PnL: {:.2}", self.net_pnl)?;
        writeln!(f, "Profit Factor: {profit_factor:.2}")?;
        writeln!(f, "Win Rate: {win_rate:.2}%")?;
        writeln!(f, "Average Win: {:.2}", self.average_win)?;
        writeln!(f, "Average Loss: {:.2}", self.average_loss)?;
        writeln!(f, "Max Consecutive Losses: {}", self.max_consecutive_losses)?;
        writeln!(f, "Max Drawdown: {:.2}", self.max_drawdown)?;
        write!(f, "------------------------------------")
    }
}
