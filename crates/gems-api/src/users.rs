//! Handlers for `/users` and `/leaderboard` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/users` | Body: [`NewUser`]; returns 201, or 409 if the email is taken |
//! | `GET`   | `/users/:id` | 404 if not found |
//! | `PATCH` | `/users/:id` | Body: [`ProfileBody`]; profile fields only |
//! | `POST`  | `/users/:id/awards` | Body: `{"action":"add_location"}` |
//! | `GET`   | `/users/:id/bookmarks` | Bookmarked locations |
//! | `POST`  | `/users/:id/bookmarks/:location_id` | Toggles; returns `{"bookmarked":bool}` |
//! | `GET`   | `/leaderboard` | Optional `?limit=` (default 10) |

use std::{collections::BTreeSet, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use gems_core::{
  award::PointsService,
  badge::BadgeId,
  location::Location,
  points::{ActionKind, Award, format_points},
  store::GemStore,
  user::{NewUser, User, UserUpdate},
  validate,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;

const DEFAULT_LEADERBOARD_SIZE: usize = 10;

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /users`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  validate::email(&body.email)?;
  let display_name = validate::sanitize_input(&body.display_name);
  validate::display_name(&display_name)?;

  let user = store
    .create_user(NewUser { display_name, ..body })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /users/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Ok(Json(require_user(&*store, id).await?))
}

// ─── Profile ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfileBody {
  pub display_name: Option<String>,
  pub photo_url:    Option<String>,
}

/// `PATCH /users/:id`
///
/// Points and badges are not writable here; they only change through
/// `/users/:id/awards`.
pub async fn update_profile<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ProfileBody>,
) -> Result<Json<User>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let display_name = body.display_name.map(|n| validate::sanitize_input(&n));
  if let Some(name) = &display_name {
    validate::display_name(name)?;
  }
  require_user(&*store, id).await?;

  let update = UserUpdate {
    display_name,
    photo_url: body.photo_url,
    ..UserUpdate::default()
  };
  let user = store
    .update_user(id, update)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(user))
}

// ─── Awards ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AwardBody {
  pub action: String,
}

#[derive(Debug, Serialize)]
pub struct AwardResponse {
  #[serde(flatten)]
  pub award:          Award,
  /// The new total, formatted for display (`"1.2K"`).
  pub points_display: String,
}

/// `POST /users/:id/awards`, body: `{"action":"write_review"}`
pub async fn award<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AwardBody>,
) -> Result<Json<AwardResponse>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let action = ActionKind::from_name(&body.action)?;
  let award = PointsService::new(store).award_points(id, action).await?;
  let points_display = format_points(award.user.points);
  Ok(Json(AwardResponse { award, points_display }))
}

// ─── Bookmarks ────────────────────────────────────────────────────────────────

/// `GET /users/:id/bookmarks`
pub async fn bookmarks<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Location>>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_user(&*store, id).await?;
  let locations = store
    .bookmarked_locations(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(locations))
}

/// `POST /users/:id/bookmarks/:location_id`
pub async fn toggle_bookmark<S>(
  State(store): State<Arc<S>>,
  Path((id, location_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let user = require_user(&*store, id).await?;
  // Removing a bookmark to a location that no longer exists is allowed.
  if !user.bookmarked_location_ids.contains(&location_id) {
    store
      .get_location(location_id)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
      .ok_or_else(|| ApiError::NotFound(format!("location {location_id} not found")))?;
  }

  let bookmarked = store
    .toggle_bookmark(id, location_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(json!({ "bookmarked": bookmarked })))
}

// ─── Leaderboard ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
  pub rank:           usize,
  pub user_id:        Uuid,
  pub display_name:   String,
  pub points:         u64,
  pub points_display: String,
  pub badges:         BTreeSet<BadgeId>,
}

/// `GET /leaderboard[?limit=<n>]`
pub async fn leaderboard<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<LeaderboardParams>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let users = store
    .top_users(params.limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let entries = users
    .into_iter()
    .enumerate()
    .map(|(i, u)| LeaderboardEntry {
      rank:           i + 1,
      user_id:        u.user_id,
      display_name:   u.display_name,
      points:         u.points,
      points_display: format_points(u.points),
      badges:         u.badges,
    })
    .collect();
  Ok(Json(entries))
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn require_user<S>(store: &S, id: Uuid) -> Result<User, ApiError>
where
  S: GemStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .get_user(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}
