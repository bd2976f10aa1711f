//! Error types for the remote source and the repositories.

use thiserror::Error;

use crate::cache::StoreError;

/// Failure of a call to the remote API.
#[derive(Debug, Error)]
pub enum RemoteError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} returned HTTP {status}")]
  Status { status: u16, url: String },

  #[error("failed to decode response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("invalid request url: {0}")]
  Url(#[from] url::ParseError),
}

/// Errors surfaced by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
  #[error("character {0} not found locally or remotely")]
  NotFound(i64),

  #[error("location {0} not found")]
  LocationNotFound(i64),

  #[error("remote source unavailable: {0}")]
  RemoteUnavailable(#[from] RemoteError),

  #[error("local store failure: {0}")]
  Store(#[from] StoreError),

  #[error("invalid precondition: {0}")]
  InvalidPrecondition(String),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;
