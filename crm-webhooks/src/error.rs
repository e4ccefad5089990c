//! Error types shared by the store, the payload parser and the ingestion path.

use thiserror::Error;

/// Failure talking to the SQLite store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode column value: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A webhook body that cannot be turned into an event
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),
}

/// Anything that stops a webhook from being fully recorded
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
