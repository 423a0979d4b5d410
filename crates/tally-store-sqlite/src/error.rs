//! Error type for `tally-store-sqlite`.

use tally_core::AsDomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain-level failure (not-found, duplicate engagement, validation).
  #[error(transparent)]
  Core(#[from] tally_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown engagement kind: {0:?}")]
  UnknownKind(String),
}

impl AsDomainError for Error {
  fn domain(&self) -> Option<&tally_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
