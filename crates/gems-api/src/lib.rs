//! JSON REST API for Local Gems.
//!
//! Exposes an axum [`Router`] backed by any [`gems_core::store::GemStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gems_api::api_router(store.clone()))
//! ```

pub mod badges;
pub mod collections;
pub mod error;
pub mod locations;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use gems_core::store::GemStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: GemStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Users
    .route("/users", post(users::create::<S>))
    .route("/users/{id}", get(users::get_one::<S>).patch(users::update_profile::<S>))
    .route("/users/{id}/awards", post(users::award::<S>))
    .route("/users/{id}/bookmarks", get(users::bookmarks::<S>))
    .route("/users/{id}/bookmarks/{location_id}", post(users::toggle_bookmark::<S>))
    .route("/users/{id}/collections", get(collections::for_user::<S>))
    .route("/leaderboard", get(users::leaderboard::<S>))
    // Badges
    .route("/badges", get(badges::list))
    .route("/badges/{id}", get(badges::get_one))
    // Locations
    .route("/locations", post(locations::create::<S>))
    .route("/locations/search", get(locations::search::<S>))
    .route("/locations/nearby", get(locations::nearby::<S>))
    .route("/locations/{id}", get(locations::get_one::<S>))
    .route(
      "/locations/{id}/reviews",
      get(locations::reviews::<S>).post(locations::add_review::<S>),
    )
    // Collections
    .route("/collections", post(collections::create::<S>))
    .route("/collections/public", get(collections::public::<S>))
    .route("/collections/{id}", get(collections::get_one::<S>))
    .route("/collections/{id}/locations/{location_id}", post(collections::add_location::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
