//! The persistence traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g. `gems-store-sqlite`).
//! Higher layers (`gems-api`, the award service) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  collection::{Collection, NewCollection},
  geo::BoundingBox,
  location::{Location, NewLocation, NewReview, Review},
  points::ActivityCounts,
  user::{NewUser, User, UserUpdate},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`GemStore::search_locations`].
#[derive(Debug, Clone, Default)]
pub struct LocationQuery {
  /// Case-insensitive match against name, description, and tags.
  pub text:   Option<String>,
  /// All returned locations must carry every one of these tags.
  pub tags:   Vec<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// What the points engine needs from a backend: the user record and the
/// aggregate counts behind milestone badges.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ActivityLedger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Write the set fields of `update` and return the stored user.
  /// Returns an error if the user does not exist.
  fn update_user(
    &self,
    id: Uuid,
    update: UserUpdate,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn count_locations_by_creator(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn count_reviews_by_author(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Total image URLs across the locations `id` created.
  fn count_photos_by_creator(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Gather all milestone counts; fails if any single count fails.
  fn activity_counts(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<ActivityCounts, Self::Error>> + Send + '_ {
    async move {
      Ok(ActivityCounts {
        locations_added: self.count_locations_by_creator(id).await?,
        reviews_written: self.count_reviews_by_author(id).await?,
        photos_uploaded: self.count_photos_by_creator(id).await?,
      })
    }
  }
}

/// A full Local Gems backend.
pub trait GemStore: ActivityLedger {
  // ── Users ─────────────────────────────────────────────────────────────

  /// Fails with an error whose source chain holds
  /// [`crate::Error::EmailTaken`] if the email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Users ordered by points, highest first.
  fn top_users(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Flip the bookmark for `location_id`. Returns `true` if it is now
  /// bookmarked.
  fn toggle_bookmark(
    &self,
    user_id: Uuid,
    location_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn bookmarked_locations(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Location>, Self::Error>> + Send + '_;

  // ── Locations ─────────────────────────────────────────────────────────

  /// Persist a new location. Coordinates are validated before writing.
  fn create_location(
    &self,
    input: NewLocation,
  ) -> impl Future<Output = Result<Location, Self::Error>> + Send + '_;

  fn get_location(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Location>, Self::Error>> + Send + '_;

  fn search_locations<'a>(
    &'a self,
    query: &'a LocationQuery,
  ) -> impl Future<Output = Result<Vec<Location>, Self::Error>> + Send + 'a;

  fn locations_by_creator(
    &self,
    creator_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Location>, Self::Error>> + Send + '_;

  /// Candidate locations inside `bbox`. Callers still apply the exact
  /// radius test; see [`crate::geo::nearby`].
  fn locations_within_box(
    &self,
    bbox: BoundingBox,
  ) -> impl Future<Output = Result<Vec<Location>, Self::Error>> + Send + '_;

  // ── Reviews ───────────────────────────────────────────────────────────

  /// Record a review and recompute the location's average rating.
  fn add_review(
    &self,
    location_id: Uuid,
    input: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  /// Reviews for a location, newest first.
  fn get_reviews(
    &self,
    location_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + '_;

  // ── Collections ───────────────────────────────────────────────────────

  fn create_collection(
    &self,
    input: NewCollection,
  ) -> impl Future<Output = Result<Collection, Self::Error>> + Send + '_;

  fn get_collection(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Collection>, Self::Error>> + Send + '_;

  fn user_collections(
    &self,
    creator_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Collection>, Self::Error>> + Send + '_;

  fn public_collections(
    &self,
  ) -> impl Future<Output = Result<Vec<Collection>, Self::Error>> + Send + '_;

  /// Append `location_id` unless it is already present.
  fn add_to_collection(
    &self,
    collection_id: Uuid,
    location_id: Uuid,
  ) -> impl Future<Output = Result<Collection, Self::Error>> + Send + '_;
}
