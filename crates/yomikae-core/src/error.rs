//! Error types for `yomikae-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("JLPT level must be between 1 and 5, got {0}")]
  InvalidJlptLevel(i64),

  #[error("unknown severity: {0:?}")]
  UnknownSeverity(String),

  #[error("unknown category: {0:?}")]
  UnknownCategory(String),

  #[error("unknown affected system: {0:?}")]
  UnknownAffectedSystem(String),

  #[error("{0} must not be empty")]
  EmptyKey(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
