use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Why a quote could not be obtained from the provider.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("building provider request: {0}")]
    RequestBuild(#[source] reqwest::Error),
    #[error("calling provider: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("provider did not answer within {0:?}")]
    DeadlineExceeded(Duration),
    #[error("unexpected provider status: {0}")]
    UnexpectedStatus(StatusCode),
    #[error("decoding provider payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("key {0} is missing from provider payload")]
    MissingKey(String),
    #[error("request cancelled before the provider answered")]
    Cancelled,
}

/// Persistence failures. Never fatal to the request that triggered them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("insert abandoned after {0:?}")]
    DeadlineExceeded(Duration),
    #[error("store task: {0}")]
    Task(#[from] tokio::task::JoinError),
}
