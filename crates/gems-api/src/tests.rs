//! Router tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use gems_core::{
  collection::{Collection, NewCollection},
  geo::BoundingBox,
  location::{Location, NewLocation, NewReview, Review},
  store::{ActivityLedger, GemStore, LocationQuery},
  user::{NewUser, User, UserUpdate},
};
use gems_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn create_user(app: &Router, email: &str, name: &str) -> String {
  let (status, user) = call(
    app,
    "POST",
    "/users",
    Some(json!({ "email": email, "display_name": name })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{user}");
  user["user_id"].as_str().unwrap().to_owned()
}

async fn create_location(
  app: &Router,
  creator_id: &str,
  name: &str,
  latitude: f64,
  longitude: f64,
  tags: &[&str],
) -> String {
  let (status, location) = call(
    app,
    "POST",
    "/locations",
    Some(json!({
      "name": name,
      "description": format!("{name} is worth the detour"),
      "coordinates": { "latitude": latitude, "longitude": longitude },
      "tags": tags,
      "creator_id": creator_id,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{location}");
  location["location_id"].as_str().unwrap().to_owned()
}

// ── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_get_user() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;

  let (status, user) = call(&app, "GET", &format!("/users/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(user["display_name"], "Ada");
  assert_eq!(user["points"], 0);
  assert_eq!(user["badges"], json!([]));
}

#[tokio::test]
async fn create_user_rejects_bad_email() {
  let app = app().await;
  let (status, body) = call(
    &app,
    "POST",
    "/users",
    Some(json!({ "email": "not-an-email", "display_name": "Ada" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn duplicate_email_is_409() {
  let app = app().await;
  create_user(&app, "dup@example.com", "Ada").await;

  let (status, body) = call(
    &app,
    "POST",
    "/users",
    Some(json!({ "email": "dup@example.com", "display_name": "Ada Again" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  let message = body["error"].as_str().unwrap();
  assert!(message.contains("dup@example.com"), "{message}");
  assert!(!message.contains("UNIQUE"), "{message}");
}

#[tokio::test]
async fn unknown_user_is_404() {
  let app = app().await;
  let (status, _) = call(&app, "GET", &format!("/users/{}", uuid::Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_update_changes_name_only() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;

  let (status, user) = call(
    &app,
    "PATCH",
    &format!("/users/{id}"),
    Some(json!({ "display_name": "Ada L." })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(user["display_name"], "Ada L.");
  assert_eq!(user["points"], 0);

  let (status, _) = call(
    &app,
    "PATCH",
    &format!("/users/{id}"),
    Some(json!({ "display_name": "A" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Awards ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_gem_award_grants_points_and_badge() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;

  let (status, award) = call(
    &app,
    "POST",
    &format!("/users/{id}/awards"),
    Some(json!({ "action": "first_gem" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{award}");
  assert_eq!(award["points_awarded"], 20);
  assert_eq!(award["badges_awarded"], json!(["first-gem"]));
  assert_eq!(award["milestones"]["status"], "evaluated");
  assert_eq!(award["points_display"], "20");

  let (_, user) = call(&app, "GET", &format!("/users/{id}"), None).await;
  assert_eq!(user["points"], 20);
  assert_eq!(user["badges"], json!(["first-gem"]));
}

#[tokio::test]
async fn fifth_location_earns_explorer() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;
  for i in 0..5 {
    create_location(&app, &id, &format!("Gem number {i}"), 51.5, -0.12, &[]).await;
  }

  let (status, award) = call(
    &app,
    "POST",
    &format!("/users/{id}/awards"),
    Some(json!({ "action": "add_location" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{award}");
  assert_eq!(award["points_awarded"], 10);
  assert_eq!(award["badges_awarded"], json!(["explorer"]));
  assert_eq!(award["user"]["points"], 10);
}

#[tokio::test]
async fn unrecognized_action_is_400() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;

  let (status, body) = call(
    &app,
    "POST",
    &format!("/users/{id}/awards"),
    Some(json!({ "action": "share_location" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("share_location"));

  let (_, user) = call(&app, "GET", &format!("/users/{id}"), None).await;
  assert_eq!(user["points"], 0);
}

#[tokio::test]
async fn award_for_unknown_user_is_404() {
  let app = app().await;
  let (status, _) = call(
    &app,
    "POST",
    &format!("/users/{}/awards", uuid::Uuid::new_v4()),
    Some(json!({ "action": "write_review" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn leaderboard_ranks_by_points() {
  let app = app().await;
  let ada = create_user(&app, "ada@example.com", "Ada").await;
  let bob = create_user(&app, "bob@example.com", "Bob").await;

  call(&app, "POST", &format!("/users/{ada}/awards"), Some(json!({ "action": "upload_photo" }))).await;
  call(&app, "POST", &format!("/users/{bob}/awards"), Some(json!({ "action": "verified_location" }))).await;

  let (status, board) = call(&app, "GET", "/leaderboard?limit=5", None).await;
  assert_eq!(status, StatusCode::OK);
  let board = board.as_array().unwrap();
  assert_eq!(board.len(), 2);
  assert_eq!(board[0]["display_name"], "Bob");
  assert_eq!(board[0]["rank"], 1);
  assert_eq!(board[0]["points"], 15);
  assert_eq!(board[1]["display_name"], "Ada");
  assert_eq!(board[1]["points_display"], "3");
}

// ── Badges ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn badge_catalog() {
  let app = app().await;

  let (status, badges) = call(&app, "GET", "/badges", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(badges.as_array().unwrap().len(), 6);

  let (status, explorer) = call(&app, "GET", "/badges/explorer", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(explorer["id"], "explorer");

  let (status, _) = call(&app, "GET", "/badges/night-owl", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Locations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_location_strips_angle_brackets() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;

  let (status, location) = call(
    &app,
    "POST",
    "/locations",
    Some(json!({
      "name": "<b>Secret</b> Garden",
      "description": "A walled garden behind the library",
      "coordinates": { "latitude": 51.5, "longitude": -0.12 },
      "creator_id": id,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(location["name"], "bSecret/b Garden");
  assert_eq!(location["average_rating"], 0.0);
}

#[tokio::test]
async fn create_location_validates_input() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;

  let short_name = json!({
    "name": "Gm",
    "description": "A walled garden behind the library",
    "coordinates": { "latitude": 51.5, "longitude": -0.12 },
    "creator_id": id,
  });
  let (status, _) = call(&app, "POST", "/locations", Some(short_name)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let off_globe = json!({
    "name": "Nowhere",
    "description": "A walled garden behind the library",
    "coordinates": { "latitude": 91.0, "longitude": 0.0 },
    "creator_id": id,
  });
  let (status, _) = call(&app, "POST", "/locations", Some(off_globe)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn nearby_filters_by_radius() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;
  create_location(&app, &id, "Covent Garden", 51.5117, -0.1240, &[]).await;
  create_location(&app, &id, "Louvre Courtyard", 48.8606, 2.3376, &[]).await;

  let (status, hits) = call(
    &app,
    "GET",
    "/locations/nearby?latitude=51.5074&longitude=-0.1278&radius_km=10",
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let hits = hits.as_array().unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0]["location"]["name"], "Covent Garden");
  assert!(hits[0]["distance_km"].as_f64().unwrap() < 1.0);
  assert!(hits[0]["distance"].as_str().unwrap().ends_with('m'));
}

#[tokio::test]
async fn nearby_reaches_across_the_pole() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;
  create_location(&app, &id, "Far side of the pole", 89.5, 180.0, &[]).await;

  let (status, hits) = call(
    &app,
    "GET",
    "/locations/nearby?latitude=89&longitude=0&radius_km=200",
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let hits = hits.as_array().unwrap();
  assert_eq!(hits.len(), 1);
  assert!(hits[0]["distance_km"].as_f64().unwrap() < 200.0);
}

#[tokio::test]
async fn nearby_rejects_bad_center_and_radius() {
  let app = app().await;

  let (status, _) = call(&app, "GET", "/locations/nearby?latitude=95&longitude=0", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(
    &app,
    "GET",
    "/locations/nearby?latitude=0&longitude=0&radius_km=-1",
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_by_text_and_tag() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;
  create_location(&app, &id, "Hidden Cafe", 51.5, -0.12, &["coffee", "quiet"]).await;
  create_location(&app, &id, "Rooftop Bar", 51.5, -0.12, &["drinks"]).await;

  let (status, found) = call(&app, "GET", "/locations/search?text=cafe", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(found.as_array().unwrap().len(), 1);

  let (_, found) = call(&app, "GET", "/locations/search?tags=drinks", None).await;
  let found = found.as_array().unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0]["name"], "Rooftop Bar");

  let (_, found) = call(&app, "GET", "/locations/search?tags=coffee,drinks", None).await;
  assert!(found.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reviews_update_average_rating() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;
  let loc = create_location(&app, &id, "Hidden Cafe", 51.5, -0.12, &[]).await;

  for rating in [4, 2] {
    let (status, _) = call(
      &app,
      "POST",
      &format!("/locations/{loc}/reviews"),
      Some(json!({ "author_id": id, "rating": rating, "comment": "ok" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (_, location) = call(&app, "GET", &format!("/locations/{loc}"), None).await;
  assert_eq!(location["average_rating"], 3.0);

  let (_, reviews) = call(&app, "GET", &format!("/locations/{loc}/reviews"), None).await;
  assert_eq!(reviews.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn review_rating_out_of_range_is_400() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;
  let loc = create_location(&app, &id, "Hidden Cafe", 51.5, -0.12, &[]).await;

  let (status, _) = call(
    &app,
    "POST",
    &format!("/locations/{loc}/reviews"),
    Some(json!({ "author_id": id, "rating": 6 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn review_for_unknown_location_is_404() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;

  let (status, _) = call(
    &app,
    "POST",
    &format!("/locations/{}/reviews", uuid::Uuid::new_v4()),
    Some(json!({ "author_id": id, "rating": 5 })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Bookmarks ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn bookmark_toggles() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;
  let loc = create_location(&app, &id, "Hidden Cafe", 51.5, -0.12, &[]).await;
  let uri = format!("/users/{id}/bookmarks/{loc}");

  let (status, body) = call(&app, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["bookmarked"], true);

  let (_, saved) = call(&app, "GET", &format!("/users/{id}/bookmarks"), None).await;
  assert_eq!(saved.as_array().unwrap().len(), 1);

  let (_, body) = call(&app, "POST", &uri, None).await;
  assert_eq!(body["bookmarked"], false);
}

#[tokio::test]
async fn bookmark_unknown_location_is_404() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;

  let (status, _) = call(
    &app,
    "POST",
    &format!("/users/{id}/bookmarks/{}", uuid::Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Collections ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn collection_membership_is_deduplicated() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;
  let loc = create_location(&app, &id, "Hidden Cafe", 51.5, -0.12, &[]).await;

  let (status, collection) = call(
    &app,
    "POST",
    "/collections",
    Some(json!({ "name": "Rainy days", "creator_id": id, "is_public": true })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let cid = collection["collection_id"].as_str().unwrap().to_owned();

  let uri = format!("/collections/{cid}/locations/{loc}");
  call(&app, "POST", &uri, None).await;
  let (status, collection) = call(&app, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(collection["location_ids"], json!([loc]));

  let (_, mine) = call(&app, "GET", &format!("/users/{id}/collections"), None).await;
  assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn public_collections_exclude_private() {
  let app = app().await;
  let id = create_user(&app, "ada@example.com", "Ada").await;

  call(&app, "POST", "/collections", Some(json!({ "name": "Shared", "creator_id": id, "is_public": true }))).await;
  call(&app, "POST", "/collections", Some(json!({ "name": "Mine", "creator_id": id }))).await;

  let (status, public) = call(&app, "GET", "/collections/public", None).await;
  assert_eq!(status, StatusCode::OK);
  let public = public.as_array().unwrap();
  assert_eq!(public.len(), 1);
  assert_eq!(public[0]["name"], "Shared");

  let (status, _) = call(&app, "POST", "/collections", Some(json!({ "name": "  ", "creator_id": id }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Unsaved awards ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum FlakyError {
  #[error(transparent)]
  Sqlite(#[from] gems_store_sqlite::Error),
  #[error("write rejected")]
  WriteRejected,
}

/// Delegates to SQLite but rejects every `update_user`.
#[derive(Clone)]
struct ReadOnlyUsers {
  inner: SqliteStore,
}

impl ActivityLedger for ReadOnlyUsers {
  type Error = FlakyError;

  async fn get_user(&self, id: Uuid) -> Result<Option<User>, FlakyError> {
    Ok(self.inner.get_user(id).await?)
  }

  async fn update_user(&self, _id: Uuid, _update: UserUpdate) -> Result<User, FlakyError> {
    Err(FlakyError::WriteRejected)
  }

  async fn count_locations_by_creator(&self, id: Uuid) -> Result<u64, FlakyError> {
    Ok(self.inner.count_locations_by_creator(id).await?)
  }

  async fn count_reviews_by_author(&self, id: Uuid) -> Result<u64, FlakyError> {
    Ok(self.inner.count_reviews_by_author(id).await?)
  }

  async fn count_photos_by_creator(&self, id: Uuid) -> Result<u64, FlakyError> {
    Ok(self.inner.count_photos_by_creator(id).await?)
  }
}

impl GemStore for ReadOnlyUsers {
  async fn create_user(&self, input: NewUser) -> Result<User, FlakyError> {
    Ok(self.inner.create_user(input).await?)
  }

  async fn top_users(&self, limit: usize) -> Result<Vec<User>, FlakyError> {
    Ok(self.inner.top_users(limit).await?)
  }

  async fn toggle_bookmark(&self, user_id: Uuid, location_id: Uuid) -> Result<bool, FlakyError> {
    Ok(self.inner.toggle_bookmark(user_id, location_id).await?)
  }

  async fn bookmarked_locations(&self, user_id: Uuid) -> Result<Vec<Location>, FlakyError> {
    Ok(self.inner.bookmarked_locations(user_id).await?)
  }

  async fn create_location(&self, input: NewLocation) -> Result<Location, FlakyError> {
    Ok(self.inner.create_location(input).await?)
  }

  async fn get_location(&self, id: Uuid) -> Result<Option<Location>, FlakyError> {
    Ok(self.inner.get_location(id).await?)
  }

  async fn search_locations(&self, query: &LocationQuery) -> Result<Vec<Location>, FlakyError> {
    Ok(self.inner.search_locations(query).await?)
  }

  async fn locations_by_creator(&self, creator_id: Uuid) -> Result<Vec<Location>, FlakyError> {
    Ok(self.inner.locations_by_creator(creator_id).await?)
  }

  async fn locations_within_box(&self, bbox: BoundingBox) -> Result<Vec<Location>, FlakyError> {
    Ok(self.inner.locations_within_box(bbox).await?)
  }

  async fn add_review(&self, location_id: Uuid, input: NewReview) -> Result<Review, FlakyError> {
    Ok(self.inner.add_review(location_id, input).await?)
  }

  async fn get_reviews(&self, location_id: Uuid) -> Result<Vec<Review>, FlakyError> {
    Ok(self.inner.get_reviews(location_id).await?)
  }

  async fn create_collection(&self, input: NewCollection) -> Result<Collection, FlakyError> {
    Ok(self.inner.create_collection(input).await?)
  }

  async fn get_collection(&self, id: Uuid) -> Result<Option<Collection>, FlakyError> {
    Ok(self.inner.get_collection(id).await?)
  }

  async fn user_collections(&self, creator_id: Uuid) -> Result<Vec<Collection>, FlakyError> {
    Ok(self.inner.user_collections(creator_id).await?)
  }

  async fn public_collections(&self) -> Result<Vec<Collection>, FlakyError> {
    Ok(self.inner.public_collections().await?)
  }

  async fn add_to_collection(
    &self,
    collection_id: Uuid,
    location_id: Uuid,
  ) -> Result<Collection, FlakyError> {
    Ok(self.inner.add_to_collection(collection_id, location_id).await?)
  }
}

#[tokio::test]
async fn unsaved_award_is_503_with_the_award() {
  let inner = SqliteStore::open_in_memory().await.unwrap();
  let app = api_router(Arc::new(ReadOnlyUsers { inner }));
  let id = create_user(&app, "ada@example.com", "Ada").await;

  let (status, body) = call(
    &app,
    "POST",
    &format!("/users/{id}/awards"),
    Some(json!({ "action": "first_gem" })),
  )
  .await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{body}");
  assert!(body["error"].as_str().unwrap().contains("write rejected"));
  assert_eq!(body["award"]["points_awarded"], 20);
  assert_eq!(body["award"]["user"]["points"], 20);
  assert_eq!(body["award"]["badges_awarded"], json!(["first-gem"]));

  let (_, user) = call(&app, "GET", &format!("/users/{id}"), None).await;
  assert_eq!(user["points"], 0);
  assert_eq!(user["badges"], json!([]));
}
