use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use common::{Error, Result};

use crate::config::{StrategyConfig, StrategyFileConfig};
use crate::patterns::{FailedBreakout, RangeBreak, SecondChanceScalp};
use crate::Strategy;

/// Ordered list of active strategies. Registration order is priority order:
/// when several strategies fire on the same window, the earliest wins.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new(strategies: Vec<Arc<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// The reference priority list: Range Break, Second Chance Scalp, Failed
    /// Breakout, all with default parameters.
    pub fn reference() -> Self {
        let strategies: Vec<Arc<dyn Strategy>> = vec![
            Arc::new(RangeBreak::default()),
            Arc::new(SecondChanceScalp::default()),
            Arc::new(FailedBreakout::default()),
        ];
        Self::new(strategies)
    }

    /// Build the registry from config, failing on unknown strategy types or
    /// invalid parameters.
    pub fn from_config(file_cfg: &StrategyFileConfig) -> Result<Self> {
        if file_cfg.strategies.is_empty() {
            return Err(Error::Config("strategy config registers no strategies".into()));
        }

        let mut strategies: Vec<Arc<dyn Strategy>> = Vec::with_capacity(file_cfg.strategies.len());
        for cfg in &file_cfg.strategies {
            let strategy = build_strategy(cfg)?;
            info!(
                name = %strategy.name(),
                lookback = strategy.lookback(),
                priority = strategies.len(),
                "Registered strategy"
            );
            strategies.push(strategy);
        }

        Ok(Self { strategies })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Strategy>> {
        self.strategies.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Largest lookback of any registered strategy; 0 when empty.
    pub fn max_lookback(&self) -> usize {
        self.strategies.iter().map(|s| s.lookback()).max().unwrap_or(0)
    }

    /// One single-strategy registry per registered strategy, in order.
    pub fn split(&self) -> Vec<StrategyRegistry> {
        self.strategies
            .iter()
            .map(|s| StrategyRegistry::new(vec![Arc::clone(s)]))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::reference()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ─── Strategy builders ────────────────────────────────────────────────────────

fn build_strategy(cfg: &StrategyConfig) -> Result<Arc<dyn Strategy>> {
    let params = &cfg.params;
    match cfg.strategy_type.as_str() {
        "range_break" => {
            let lookback = param_usize(params, "lookback", RangeBreak::DEFAULT_LOOKBACK)?;
            let multiplier =
                param_f64(params, "volume_multiplier", RangeBreak::DEFAULT_VOLUME_MULTIPLIER)?;
            require(lookback >= 2, "range_break lookback must be at least 2")?;
            require(multiplier > 0.0, "range_break volume_multiplier must be positive")?;
            let name = display_name(cfg, RangeBreak::NAME);
            Ok(Arc::new(RangeBreak::new(name, lookback, multiplier)))
        }
        "failed_breakout" => {
            let lookback = param_usize(params, "lookback", FailedBreakout::DEFAULT_LOOKBACK)?;
            require(lookback >= 3, "failed_breakout lookback must be at least 3")?;
            let name = display_name(cfg, FailedBreakout::NAME);
            Ok(Arc::new(FailedBreakout::new(name, lookback)))
        }
        "second_chance_scalp" => {
            let range = param_usize(params, "range", SecondChanceScalp::DEFAULT_RANGE)?;
            let reward =
                param_f64(params, "reward_ratio", SecondChanceScalp::DEFAULT_REWARD_RATIO)?;
            require(range >= 1, "second_chance_scalp range must be at least 1")?;
            require(reward > 0.0, "second_chance_scalp reward_ratio must be positive")?;
            let name = display_name(cfg, SecondChanceScalp::NAME);
            Ok(Arc::new(SecondChanceScalp::new(name, range, reward)))
        }
        other => Err(Error::Config(format!("unknown strategy type '{other}'"))),
    }
}

fn display_name(cfg: &StrategyConfig, default: &str) -> String {
    cfg.name.clone().unwrap_or_else(|| default.to_string())
}

fn require(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Config(message.to_string()))
    }
}

fn param_f64(params: &HashMap<String, toml::Value>, key: &str, default: f64) -> Result<f64> {
    match params.get(key) {
        None => Ok(default),
        Some(toml::Value::Float(v)) if v.is_finite() => Ok(*v),
        Some(toml::Value::Integer(v)) => Ok(*v as f64),
        Some(other) => Err(Error::Config(format!("parameter '{key}' must be a number, got {other}"))),
    }
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str, default: usize) -> Result<usize> {
    match params.get(key) {
        None => Ok(default),
        Some(toml::Value::Integer(v)) => usize::try_from(*v).map_err(|_| {
            Error::Config(format!("parameter '{key}' must be a non-negative integer, got {v}"))
        }),
        Some(other) => Err(Error::Config(format!("parameter '{key}' must be an integer, got {other}"))),
    }
}
