//! User-curated groupings of locations.
//!
//! A collection only references locations by id; it is not tied to their
//! lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
  pub collection_id: Uuid,
  pub name:          String,
  pub description:   String,
  pub creator_id:    Uuid,
  /// Insertion-ordered, without duplicates.
  pub location_ids:  Vec<Uuid>,
  pub is_public:     bool,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::GemStore::create_collection`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCollection {
  pub name:         String,
  #[serde(default)]
  pub description:  String,
  pub creator_id:   Uuid,
  #[serde(default)]
  pub location_ids: Vec<Uuid>,
  #[serde(default)]
  pub is_public:    bool,
}
