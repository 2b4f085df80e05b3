//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use gems_core::points::Award;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The award was computed but not saved. The client gets it back so it
  /// can offer a retry instead of announcing the reward.
  #[error("award not saved: {message}")]
  AwardNotSaved { award: Box<Award>, message: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a backend error, surfacing any client-caused [`gems_core::Error`]
  /// found in its source chain.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(&e);
    while let Some(err) = cause {
      if let Some(gems_core::Error::EmailTaken(email)) = err.downcast_ref::<gems_core::Error>() {
        return ApiError::Conflict(format!("email already registered: {email}"));
      }
      cause = err.source();
    }
    ApiError::Store(Box::new(e))
  }
}

impl From<gems_core::Error> for ApiError {
  fn from(e: gems_core::Error) -> Self {
    use gems_core::Error as E;
    match e {
      E::UnrecognizedAction(name) => {
        tracing::error!(action = %name, "client sent an unrecognized action");
        ApiError::BadRequest(format!("unrecognized action: {name:?}"))
      }
      E::InvalidCoordinate { .. }
      | E::InvalidRadius(_)
      | E::InvalidRating(_)
      | E::UnknownBadge(_)
      | E::Validation(_) => ApiError::BadRequest(e.to_string()),
      E::UserNotFound(id) => ApiError::NotFound(format!("user {id} not found")),
      E::EmailTaken(email) => ApiError::Conflict(format!("email already registered: {email}")),
      E::PersistenceFailure { award, source } => ApiError::AwardNotSaved {
        award,
        message: source.to_string(),
      },
      E::Store(source) => ApiError::Store(source),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response(),
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Conflict(m) => (StatusCode::CONFLICT, Json(json!({ "error": m }))).into_response(),
      ApiError::AwardNotSaved { award, message } => {
        tracing::error!(user_id = %award.user.user_id, error = %message, "award not persisted");
        (
          StatusCode::SERVICE_UNAVAILABLE,
          Json(json!({ "error": format!("award not saved: {message}"), "award": award })),
        )
          .into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
      }
    }
  }
}
