//! Error type for `admissions-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] admissions_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for admissions_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(core) => core,
      other => admissions_core::Error::Storage(Box::new(other)),
    }
  }
}
