//! Handlers for the static badge catalog.

use axum::{Json, extract::Path};
use gems_core::badge::{Badge, BadgeId, all_badges};

use crate::error::ApiError;

/// `GET /badges`
pub async fn list() -> Json<Vec<Badge>> { Json(all_badges()) }

/// `GET /badges/:id`, e.g. `/badges/first-gem`
pub async fn get_one(Path(id): Path<String>) -> Result<Json<Badge>, ApiError> {
  let badge = BadgeId::from_name(&id).map_err(|_| ApiError::NotFound(format!("badge {id} not found")))?;
  Ok(Json(badge.badge()))
}
