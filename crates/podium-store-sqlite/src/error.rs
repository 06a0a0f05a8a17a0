//! Error type for `podium-store-sqlite`.

use std::time::Duration;

use podium_core::{Classify, ErrorKind};
use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] podium_core::Error),

  /// A unique or foreign-key constraint rejected the write.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("athlete not found: {0}")]
  AthleteNotFound(uuid::Uuid),

  /// Any statement of a composite write failed; the transaction was rolled
  /// back.
  #[error("encounter not recorded, transaction rolled back: {0}")]
  EncounterRolledBack(#[source] tokio_rusqlite::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("no pooled connection available after {0:?}")]
  PoolTimeout(Duration),

  #[error("connection pool is closed")]
  PoolClosed,

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("invalid stored value: {0}")]
  Corrupt(String),
}

impl From<tokio_rusqlite::Error> for Error {
  /// Unique and foreign-key violations become [`Error::Conflict`]; everything
  /// else stays a database error.
  fn from(err: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, msg)) = &err
      && failure.code == ErrorCode::ConstraintViolation
    {
      let reason = match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
          Some("duplicate value for a unique field")
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some("referenced record does not exist"),
        _ => None,
      };
      if let Some(reason) = reason {
        let detail = msg.as_deref().unwrap_or("constraint failed");
        return Error::Conflict(format!("{reason} ({detail})"));
      }
    }
    Error::Database(err)
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Validation(_) => ErrorKind::Validation,
      Error::Conflict(_) => ErrorKind::Conflict,
      Error::AthleteNotFound(_) => ErrorKind::NotFound,
      Error::EncounterRolledBack(_)
      | Error::Database(_)
      | Error::PoolTimeout(_)
      | Error::PoolClosed
      | Error::Uuid(_)
      | Error::DateParse(_)
      | Error::Corrupt(_) => ErrorKind::Storage,
    }
  }

  fn is_retryable(&self) -> bool {
    matches!(
      self,
      Error::PoolTimeout(_) | Error::Database(tokio_rusqlite::Error::ConnectionClosed)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  fn failure(extended_code: i32) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      ffi::Error::new(extended_code),
      Some("UNIQUE constraint failed: athletes.document_number".into()),
    ))
  }

  #[test]
  fn unique_violation_is_a_conflict() {
    let err = Error::from(failure(ffi::SQLITE_CONSTRAINT_UNIQUE));
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(!err.is_retryable());
  }

  #[test]
  fn check_violation_stays_a_storage_error() {
    let err = Error::from(failure(ffi::SQLITE_CONSTRAINT_CHECK));
    assert!(matches!(err, Error::Database(_)));
    assert_eq!(err.kind(), ErrorKind::Storage);
  }

  #[test]
  fn pool_timeout_is_retryable_storage() {
    let err = Error::PoolTimeout(Duration::from_millis(10));
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(err.is_retryable());
  }
}
