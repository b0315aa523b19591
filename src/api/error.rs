//! Classified failures for remote calls.
//!
//! The fallback policy keys on this classification alone, never on raw
//! status codes, so repositories stay independent of the transport.

use std::collections::BTreeMap;
use thiserror::Error;

/// A remote call failure, classified.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Transport-level failure: connect, TLS, timeout, interrupted body.
  #[error("network failure: {0}")]
  Network(String),

  /// The backend answered 404. For single-record reads this is an
  /// authoritative absence rather than a failure.
  #[error("not found")]
  NotFound,

  /// The backend answered 401.
  #[error("unauthenticated: the backend rejected the session token")]
  Unauthorized,

  /// The backend answered 403.
  #[error("forbidden: the session is not allowed to do this")]
  Forbidden,

  /// The backend answered 422 with per-field messages.
  #[error("validation failed on {} field(s)", .errors.len())]
  Validation { errors: BTreeMap<String, Vec<String>> },

  /// Any other non-2xx answer, or a 2xx body that could not be decoded.
  #[error("unexpected server response (HTTP {status}): {message}")]
  Server { status: u16, message: String },
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    ApiError::Network(err.to_string())
  }
}
