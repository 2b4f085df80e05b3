//! Error type for `gems-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] gems_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),

  #[error("location not found: {0}")]
  LocationNotFound(uuid::Uuid),

  #[error("collection not found: {0}")]
  CollectionNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
