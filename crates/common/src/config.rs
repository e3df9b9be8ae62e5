use std::str::FromStr;

use crate::{Error, Result};

/// Whether the process streams live candles or replays a history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Live,
    Backtest,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Live => write!(f, "live"),
            RunMode::Backtest => write!(f, "backtest"),
        }
    }
}

impl FromStr for RunMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(RunMode::Live),
            "backtest" => Ok(RunMode::Backtest),
            other => Err(Error::Config(format!(
                "RUN_MODE must be 'live' or 'backtest', got: '{other}'"
            ))),
        }
    }
}

/// All configuration loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub run_mode: RunMode,

    // Live feed
    pub feed_url: String,
    pub history_capacity: usize,

    // Backtest
    pub backtest_data_path: String,

    // Position sizing
    pub account_size: f64,
    pub max_risk_fraction: f64,

    /// Strategy registry file; the reference registry is used when unset.
    pub strategy_config_path: Option<String>,
}

impl Config {
    pub const DEFAULT_FEED_URL: &'static str = "ws://localhost:8765";
    pub const DEFAULT_HISTORY_CAPACITY: usize = 50;
    pub const MAX_HISTORY_CAPACITY: usize = 100_000;
    pub const DEFAULT_BACKTEST_DATA_PATH: &'static str = "nifty_1min_data.csv";
    pub const DEFAULT_ACCOUNT_SIZE: f64 = 100_000.0;
    pub const DEFAULT_MAX_RISK_FRACTION: f64 = 0.01;

    /// Load configuration from environment variables, reading `.env` first
    /// if one is present.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is normal outside development.
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(Error::Config(format!("failed to read .env: {e}")));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let run_mode = lookup("RUN_MODE")
            .ok_or_else(|| Error::Config("Required environment variable 'RUN_MODE' is not set".into()))?
            .parse()?;

        let history_capacity = parse_or(&lookup, "HISTORY_CAPACITY", Self::DEFAULT_HISTORY_CAPACITY)?;
        if !(1..=Self::MAX_HISTORY_CAPACITY).contains(&history_capacity) {
            return Err(Error::Config(format!(
                "HISTORY_CAPACITY must be between 1 and {}, got {history_capacity}",
                Self::MAX_HISTORY_CAPACITY
            )));
        }

        let account_size = parse_or(&lookup, "ACCOUNT_SIZE", Self::DEFAULT_ACCOUNT_SIZE)?;
        if !(account_size.is_finite() && account_size > 0.0) {
            return Err(Error::Config(format!("ACCOUNT_SIZE must be positive, got {account_size}")));
        }

        let max_risk_fraction = parse_or(&lookup, "MAX_RISK_FRACTION", Self::DEFAULT_MAX_RISK_FRACTION)?;
        if !(max_risk_fraction > 0.0 && max_risk_fraction <= 1.0) {
            return Err(Error::Config(format!(
                "MAX_RISK_FRACTION must be in (0, 1], got {max_risk_fraction}"
            )));
        }

        Ok(Config {
            run_mode,
            feed_url: lookup("FEED_URL").unwrap_or_else(|| Self::DEFAULT_FEED_URL.to_string()),
            history_capacity,
            backtest_data_path: lookup("BACKTEST_DATA_PATH")
                .unwrap_or_else(|| Self::DEFAULT_BACKTEST_DATA_PATH.to_string()),
            account_size,
            max_risk_fraction,
            strategy_config_path: lookup("STRATEGY_CONFIG_PATH").filter(|p| !p.trim().is_empty()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{key} has invalid value '{raw}': {e}"))),
    }
}
