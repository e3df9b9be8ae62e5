pub mod config;
pub mod error;
pub mod series;
pub mod types;

pub use config::{Config, RunMode};
pub use error::{Error, Result};
pub use series::{CandleSeries, HistoryStore};
pub use types::*;
