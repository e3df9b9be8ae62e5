use serde::{Deserialize, Serialize};

use common::{Error, Result, TradeSetup};

/// Fixed-fractional sizing parameters: every trade risks
/// `account_size * max_risk_fraction` between entry and stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Account equity in quote currency.
    pub account_size: f64,
    /// Fraction of equity lost if the stop is hit (e.g. 0.01 = 1%).
    pub max_risk_fraction: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            account_size: 100_000.0,
            max_risk_fraction: 0.01,
        }
    }
}

impl RiskConfig {
    pub fn new(account_size: f64, max_risk_fraction: f64) -> Result<Self> {
        if !(account_size.is_finite() && account_size > 0.0) {
            return Err(Error::Config(format!("account size must be positive, got {account_size}")));
        }
        if !(max_risk_fraction > 0.0 && max_risk_fraction <= 1.0) {
            return Err(Error::Config(format!(
                "max risk fraction must be in (0, 1], got {max_risk_fraction}"
            )));
        }
        Ok(Self { account_size, max_risk_fraction })
    }

    /// Amount of equity put at risk per trade.
    pub fn risk_amount(&self) -> f64 {
        self.account_size * self.max_risk_fraction
    }

    /// Units to trade so that a stop-out loses exactly `risk_amount()`.
    ///
    /// `None` when entry and stop coincide (or the distance is not a finite
    /// positive number); such setups are not actionable.
    pub fn position_size(&self, setup: &TradeSetup) -> Option<f64> {
        let risk_per_unit = setup.risk_per_unit();
        if risk_per_unit.is_finite() && risk_per_unit > 0.0 {
            Some(self.risk_amount() / risk_per_unit)
        } else {
            None
        }
    }
}
