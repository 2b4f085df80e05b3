//! Error types for `gems-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::points::Award;

/// A boxed error from a persistence backend.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
  InvalidCoordinate { latitude: f64, longitude: f64 },

  #[error("invalid radius: {0} km")]
  InvalidRadius(f64),

  #[error("invalid rating: {0} (expected 1-5)")]
  InvalidRating(u8),

  #[error("unrecognized action: {0:?}")]
  UnrecognizedAction(String),

  #[error("unknown badge: {0:?}")]
  UnknownBadge(String),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  /// The award was computed but could not be written back. The computed
  /// result is carried so the caller can surface or retry it.
  #[error("failed to persist award for user {}: {source}", award.user.user_id)]
  PersistenceFailure {
    award:  Box<Award>,
    #[source]
    source: StoreError,
  },

  #[error("store error: {0}")]
  Store(#[source] StoreError),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
