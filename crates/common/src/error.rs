use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed market data rejected at the ingestion boundary.
    #[error("Data error: {0}")]
    Data(String),

    #[error("Insufficient history: need {needed} candles, have {available}")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
