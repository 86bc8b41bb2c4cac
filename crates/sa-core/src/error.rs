use std::path::PathBuf;

/// Run-level failures. Anything that reaches this type aborts the whole screen;
/// per-pair problems are tallied as [`crate::reject::RejectReason`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("no settings entry for account '{0}'")]
    MissingAccount(String),

    #[error("invalid config for account '{account}': {reason}")]
    InvalidConfig { account: String, reason: String },

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("worker for chunk {chunk} failed: {message}")]
    WorkerFailed { chunk: usize, message: String },

    #[error("failed to build worker pool: {0}")]
    Pool(String),

    #[error("candle source error: {0}")]
    Source(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ScreenError>;
