//! Error types for `podium-core`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The machine-checkable category of a failure, shared by every crate in the
/// workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// Malformed, missing or forbidden input, detected before store access.
  Validation,
  /// A uniqueness or integrity constraint rejected the write.
  Conflict,
  /// A referenced entity does not exist.
  NotFound,
  /// Connection, pool or transaction failure, or any unclassified store
  /// error.
  Storage,
}

/// Implemented by every error that crosses the store boundary.
pub trait Classify {
  fn kind(&self) -> ErrorKind;

  /// Whether the caller may retry the same call with backoff. Validation and
  /// conflict failures never are.
  fn is_retryable(&self) -> bool { false }
}

/// Input validation failures. All of them classify as
/// [`ErrorKind::Validation`].
#[derive(Debug, Error)]
pub enum Error {
  #[error("missing required field `{0}`")]
  MissingField(&'static str),

  #[error("`{column}` is not a {kind} column")]
  UnknownColumn { kind: &'static str, column: String },

  #[error("`{column}` expects {expected}, got {found}")]
  InvalidValue {
    column:   String,
    expected: &'static str,
    found:    String,
  },

  #[error("unknown tracking kind: {0:?}")]
  UnknownTrackingKind(String),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind { ErrorKind::Validation }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
