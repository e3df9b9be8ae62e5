use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use backtest::{load_csv, run_backtests};
use common::{CandleUpdate, Config, RunMode, TradeSignal};
use feed::{FeedStream, SignalSession};
use policy::{PolicyEngine, RiskConfig};
use strategy::{StrategyFileConfig, StrategyRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid configuration")?;
    info!(mode = %cfg.run_mode, "Scalper starting");

    // ── Strategy registry ─────────────────────────────────────────────────────
    let registry = match &cfg.strategy_config_path {
        Some(path) => {
            let file = StrategyFileConfig::load(path)?;
            StrategyRegistry::from_config(&file)?
        }
        None => {
            info!("No STRATEGY_CONFIG_PATH set, using the built-in strategy set");
            StrategyRegistry::reference()
        }
    };
    info!(strategies = ?registry.names(), max_lookback = registry.max_lookback(), "Strategies registered");

    let risk = RiskConfig::new(cfg.account_size, cfg.max_risk_fraction)?;

    match cfg.run_mode {
        RunMode::Backtest => backtest(&cfg, &registry, risk),
        RunMode::Live => live(&cfg, registry, risk).await,
    }
}

fn backtest(cfg: &Config, registry: &StrategyRegistry, risk: RiskConfig) -> anyhow::Result<()> {
    let candles = load_csv(&cfg.backtest_data_path)
        .with_context(|| format!("failed to load historical data from '{}'", cfg.backtest_data_path))?;

    for run in run_backtests(&candles, registry, risk) {
        info!("\n{}", run.report);
    }
    Ok(())
}

async fn live(cfg: &Config, registry: StrategyRegistry, risk: RiskConfig) -> anyhow::Result<()> {
    let session = SignalSession::new(PolicyEngine::new(registry, risk), cfg.history_capacity)?;

    // ── Channels ──────────────────────────────────────────────────────────────
    let (update_tx, update_rx) = mpsc::channel::<CandleUpdate>(1024);
    let (signal_tx, mut signal_rx) = mpsc::channel::<TradeSignal>(128);

    // ── Spawn tasks ───────────────────────────────────────────────────────────
    tokio::spawn(FeedStream::new(cfg.feed_url.clone(), update_tx).run());
    let session_task = tokio::spawn(session.run(update_rx, signal_tx));

    // ── Signal sink ───────────────────────────────────────────────────────────
    let sink = tokio::spawn(async move {
        while let Some(signal) = signal_rx.recv().await {
            info!("{signal}");
            match serde_json::to_string(&signal) {
                Ok(json) => info!(target: "signals", event = %json, "Signal emitted"),
                Err(e) => warn!(error = %e, "Failed to serialise signal"),
            }
        }
    });

    info!(url = %cfg.feed_url, "All subsystems started. Waiting for shutdown signal.");
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for shutdown signal")?;
            info!("Shutdown signal received. Exiting.");
        }
        res = session_task => {
            if let Err(e) = res {
                error!(error = %e, "Signal session task failed");
            }
            warn!("Signal session stopped. Exiting.");
        }
    }

    sink.abort();
    Ok(())
}
