//! User profiles with their bookmarks and rewards.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::badge::BadgeId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id:                 Uuid,
  pub email:                   String,
  pub display_name:            String,
  pub photo_url:               Option<String>,
  pub bookmarked_location_ids: BTreeSet<Uuid>,
  /// Only ever grows; see [`crate::points::apply_action`].
  pub points:                  u64,
  pub badges:                  BTreeSet<BadgeId>,
  pub created_at:              DateTime<Utc>,
}

/// Input to [`crate::store::GemStore::create_user`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
  pub email:        String,
  pub display_name: String,
  pub photo_url:    Option<String>,
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
  pub display_name: Option<String>,
  pub photo_url:    Option<String>,
  pub points:       Option<u64>,
  pub badges:       Option<BTreeSet<BadgeId>>,
}

impl UserUpdate {
  /// Apply the set fields to `user`.
  pub fn apply_to(self, user: &mut User) {
    if let Some(name) = self.display_name {
      user.display_name = name;
    }
    if let Some(url) = self.photo_url {
      user.photo_url = Some(url);
    }
    if let Some(points) = self.points {
      user.points = points;
    }
    if let Some(badges) = self.badges {
      user.badges = badges;
    }
  }
}
