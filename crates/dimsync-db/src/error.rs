use thiserror::Error;

/// Failure modes the orchestrator and the HTTP trigger surface need to tell apart.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("forbidden: bad sync token")]
    Forbidden,

    #[error("cannot compute fact measures: {0}")]
    Measure(String),
}
