use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use common::{Error, Result};

/// Top-level strategy config file (TOML). Entries are registered in file
/// order, which is also their priority order.
///
/// Example `config/strategies.toml`:
/// ```toml
/// [[strategy]]
/// type = "range_break"
/// name = "Range Break"
///
/// [strategy.params]
/// lookback = 20
/// volume_multiplier = 1.5
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(rename = "strategy")]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Strategy type identifier: "range_break", "failed_breakout" or
    /// "second_chance_scalp".
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Name shown in logs and reports. Defaults to the strategy's display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Pattern-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

impl StrategyFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read strategy config at '{path}': {e}"))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Failed to parse strategy config at '{path}': {e}")))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_entries_in_file_order() {
        let cfg = StrategyFileConfig::parse(
            r#"
            [[strategy]]
            type = "failed_breakout"

            [[strategy]]
            type = "range_break"
            name = "RB fast"
            [strategy.params]
            lookback = 10
            volume_multiplier = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.strategies.len(), 2);
        assert_eq!(cfg.strategies[0].strategy_type, "failed_breakout");
        assert!(cfg.strategies[0].name.is_none());
        assert_eq!(cfg.strategies[1].name.as_deref(), Some("RB fast"));
        assert_eq!(
            cfg.strategies[1].params.get("lookback").and_then(|v| v.as_integer()),
            Some(10)
        );
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[strategy]]\ntype = \"second_chance_scalp\"").unwrap();
        let cfg = StrategyFileConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.strategies[0].strategy_type, "second_chance_scalp");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = StrategyFileConfig::load("/nonexistent/strategies.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(StrategyFileConfig::parse("[[strategy]\ntype=").is_err());
    }
}
