//! Handlers for `/locations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/locations` | Body: [`NewLocation`]; returns 201 |
//! | `GET`  | `/locations/:id` | 404 if not found |
//! | `GET`  | `/locations/search` | `?text`, `?tags=a,b`, `?limit`, `?offset` |
//! | `GET`  | `/locations/nearby` | `?latitude&longitude[&radius_km]`; not sorted by distance |
//! | `GET`  | `/locations/:id/reviews` | Newest first |
//! | `POST` | `/locations/:id/reviews` | Body: [`NewReview`]; returns 201 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use gems_core::{
  geo::{self, Coordinates, Nearby},
  location::{Location, NewLocation, NewReview, Review},
  store::{GemStore, LocationQuery},
  validate,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

const DEFAULT_RADIUS_KM: f64 = 10.0;

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /locations`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewLocation>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = NewLocation {
    name: validate::sanitize_input(&body.name),
    description: validate::sanitize_input(&body.description),
    address: validate::sanitize_input(&body.address),
    ..body
  };
  validate::location_name(&input.name)?;
  validate::location_description(&input.description)?;
  input.coordinates.validate()?;

  let location = store
    .create_location(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(location)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /locations/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Location>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Ok(Json(require_location(&*store, id).await?))
}

// ─── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub text:   Option<String>,
  /// Comma-separated tags; all must be present.
  pub tags:   Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /locations/search[?text=...][&tags=...][&limit=...][&offset=...]`
pub async fn search<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Location>>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = LocationQuery {
    text:   params.text,
    tags:   params
      .tags
      .map(|s| {
        s.split(',')
          .map(|t| t.trim().to_owned())
          .filter(|t| !t.is_empty())
          .collect()
      })
      .unwrap_or_default(),
    limit:  params.limit,
    offset: params.offset,
  };

  let locations = store
    .search_locations(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(locations))
}

// ─── Nearby ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
  pub latitude:  f64,
  pub longitude: f64,
  pub radius_km: Option<f64>,
}

/// `GET /locations/nearby?latitude=<lat>&longitude=<lon>[&radius_km=<km>]`
///
/// The store narrows candidates with a bounding box; the exact
/// great-circle test runs here.
pub async fn nearby<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<NearbyParams>,
) -> Result<Json<Vec<Nearby>>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let center = Coordinates::new(params.latitude, params.longitude)?;
  let radius_km = params.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
  let bbox = geo::bounding_box(center, radius_km)?;

  let candidates = store
    .locations_within_box(bbox)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(geo::nearby(center, radius_km, candidates)?))
}

// ─── Reviews ──────────────────────────────────────────────────────────────────

/// `GET /locations/:id/reviews`
pub async fn reviews<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_location(&*store, id).await?;
  let reviews = store
    .get_reviews(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(reviews))
}

/// `POST /locations/:id/reviews`
pub async fn add_review<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewReview>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = NewReview {
    comment: validate::sanitize_input(&body.comment),
    ..body
  };
  input.validate()?;
  require_location(&*store, id).await?;

  let review = store
    .add_review(id, input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(review)))
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

pub(crate) async fn require_location<S>(store: &S, id: Uuid) -> Result<Location, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .get_location(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("location {id} not found")))
}
