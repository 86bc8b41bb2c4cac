//! Candle sources and report sinks for the pair screener.

pub mod json_loader;
pub mod sink;
pub mod sqlite_loader;

use sa_core::ScreenError;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid interval: {0}")]
    InvalidInterval(String),
}

impl From<DataError> for ScreenError {
    fn from(e: DataError) -> Self {
        ScreenError::Source(e.to_string())
    }
}
