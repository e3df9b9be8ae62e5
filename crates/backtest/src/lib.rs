pub mod backtester;
pub mod loader;
pub mod report;
pub mod trade;

pub use backtester::{run_backtests, BacktestRun, Backtester};
pub use loader::{load_csv, parse_csv};
pub use report::PerformanceReport;
pub use trade::{step, ClosedTrade, ExitReason, OpenTrade, TradeState};
