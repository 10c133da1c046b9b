//! Error types for the yomikae-import reconciler.
//!
//! These cover whole-payload failures only. A single malformed record is
//! reported as an [`ImportError`](crate::ImportError) alongside the records
//! that did normalise.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("payload is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unrecognised payload layout: {0}")]
  UnrecognizedShape(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
