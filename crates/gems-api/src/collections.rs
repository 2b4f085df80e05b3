//! Handlers for `/collections` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/collections` | Body: [`NewCollection`]; returns 201 |
//! | `GET`  | `/collections/public` | Public collections only |
//! | `GET`  | `/collections/:id` | 404 if not found |
//! | `POST` | `/collections/:id/locations/:location_id` | Appends unless present |
//! | `GET`  | `/users/:id/collections` | Every collection the user created |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use gems_core::{
  collection::{Collection, NewCollection},
  store::GemStore,
  validate,
};
use uuid::Uuid;

use crate::{error::ApiError, locations::require_location};

/// `POST /collections`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewCollection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = NewCollection {
    name: validate::sanitize_input(&body.name),
    description: validate::sanitize_input(&body.description),
    ..body
  };
  if input.name.is_empty() {
    return Err(ApiError::BadRequest("collection name must not be empty".into()));
  }

  let collection = store
    .create_collection(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(collection)))
}

/// `GET /collections/public`
pub async fn public<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Collection>>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let collections = store
    .public_collections()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(collections))
}

/// `GET /collections/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Collection>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let collection = store
    .get_collection(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("collection {id} not found")))?;
  Ok(Json(collection))
}

/// `POST /collections/:id/locations/:location_id`
pub async fn add_location<S>(
  State(store): State<Arc<S>>,
  Path((id, location_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Collection>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .get_collection(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("collection {id} not found")))?;
  require_location(&*store, location_id).await?;

  let collection = store
    .add_to_collection(id, location_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(collection))
}

/// `GET /users/:id/collections`
pub async fn for_user<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Collection>>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let collections = store
    .user_collections(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(collections))
}
